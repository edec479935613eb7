//! Murmur server binary
//!
//! `murmur-server --config <file>` serves with a TOML configuration.
//! `murmur-server --dev` serves a throwaway in-memory database signed with a
//! built-in secret; it is never chosen implicitly.

use murmur_server::{config::ServerConfig, init_tracing, start_server, ServerError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;

const USAGE: &str = "\
Murmur Server - social graph HTTP API

USAGE:
    murmur-server --config <file>
    murmur-server --dev

OPTIONS:
    --config <file>    Load configuration from a TOML file
    --dev              In-memory database and a built-in JWT secret (local use only)
    --help             Print this help message

See crates/murmur-server/config/server.toml for every configuration key.";

/// What the command line asked for
#[derive(Debug, PartialEq, Eq)]
enum Launch {
    Config(PathBuf),
    Dev,
    Help,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Launch, String> {
    let mut args = args.into_iter();
    let launch = match args.next().as_deref() {
        Some("--config") => match args.next() {
            Some(path) => Launch::Config(PathBuf::from(path)),
            None => return Err("--config needs a file path".to_string()),
        },
        Some("--dev") => Launch::Dev,
        Some("--help" | "-h") => Launch::Help,
        Some(other) => return Err(format!("unexpected argument '{}'", other)),
        None => return Err("no configuration given".to_string()),
    };

    match args.next() {
        Some(extra) => Err(format!("unexpected argument '{}'", extra)),
        None => Ok(launch),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match parse_args(std::env::args().skip(1)) {
        Ok(Launch::Help) => {
            println!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        Ok(Launch::Config(path)) => ServerConfig::from_file(&path).map_err(ServerError::from),
        Ok(Launch::Dev) => {
            let config = ServerConfig::default_test_config();
            init_tracing(&config.log_filter);
            warn!("--dev: in-memory database, built-in JWT secret; data is lost on exit");
            Ok(config)
        }
        Err(problem) => {
            eprintln!("Error: {}\n\n{}", problem, USAGE);
            return ExitCode::from(2);
        }
    };

    match config {
        Ok(config) => match start_server(config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Launch, String> {
        parse_args(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn test_config_path() {
        assert_eq!(
            parse(&["--config", "server.toml"]),
            Ok(Launch::Config(PathBuf::from("server.toml")))
        );
    }

    #[test]
    fn test_no_arguments_is_refused() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn test_dev_must_be_asked_for() {
        assert_eq!(parse(&["--dev"]), Ok(Launch::Dev));
        assert_eq!(parse(&["--help"]), Ok(Launch::Help));
    }

    #[test]
    fn test_bad_arguments() {
        assert!(parse(&["--config"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
        assert!(parse(&["--dev", "--config", "server.toml"]).is_err());
    }
}
