use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Tally calculator assistant backend
#[derive(Debug, Parser)]
#[command(name = "tally", about = "Chat and image-solving backend for the Tally calculator")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tally.toml", env = "TALLY_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "TALLY_LISTEN")]
    pub listen: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_local_config() {
        temp_env::with_vars_unset(["TALLY_CONFIG", "TALLY_LISTEN"], || {
            let args = Args::try_parse_from(["tally"]).unwrap();
            assert_eq!(args.config, PathBuf::from("tally.toml"));
            assert!(args.listen.is_none());
        });
    }

    #[test]
    fn listen_override() {
        temp_env::with_vars_unset(["TALLY_CONFIG", "TALLY_LISTEN"], || {
            let args = Args::try_parse_from(["tally", "-c", "prod.toml", "--listen", "127.0.0.1:8080"]).unwrap();
            assert_eq!(args.config, PathBuf::from("prod.toml"));
            assert_eq!(args.listen, Some(SocketAddr::from(([127, 0, 0, 1], 8080))));
        });
    }

    #[test]
    fn rejects_bad_listen_address() {
        temp_env::with_vars_unset(["TALLY_CONFIG", "TALLY_LISTEN"], || {
            assert!(Args::try_parse_from(["tally", "--listen", "localhost"]).is_err());
        });
    }
}
