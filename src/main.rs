mod cli;

use clap::{Parser, error::ErrorKind};
use cli::Cli;
use pem_jwks::Converter;
use std::io::Write;
use std::process::ExitCode;

/// Per-file diagnostics go to stderr as bare lines, `RUST_LOG` overrides the
/// `info` default. Fatal errors bypass the logger so they cannot be silenced.
fn log_init() {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()));
    builder.init();
}

fn main() -> ExitCode {
    log_init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) =>
        {
            err.exit()
        }
        Err(err) => {
            err.print().ok();
            return ExitCode::FAILURE;
        }
    };

    let converter = Converter::new(cli.options());

    if let Err(err) = converter.ensure_exist(&cli.files) {
        eprintln!("Error: {err}");
        return ExitCode::FAILURE;
    }

    let jwks = converter.convert_all(&cli.files);

    let json = if cli.compact {
        serde_json::to_string(&jwks)
    } else {
        serde_json::to_string_pretty(&jwks)
    };

    let json = match json {
        Ok(json) => json,
        Err(err) => {
            eprintln!("Unable to serialize the JWK Set: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = writeln!(std::io::stdout().lock(), "{json}") {
        eprintln!("Unable to write the JWK Set: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
