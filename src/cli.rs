//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// OAuth2 mutual TLS client authentication (RFC 8705 `tls_client_auth`)
#[derive(Parser, Debug)]
#[command(name = "mtls-client-auth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "MTLS_CLIENT_AUTH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "MTLS_CLIENT_AUTH_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "MTLS_CLIENT_AUTH_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the `x5t` and `x5t#S256` thumbprints of a PEM certificate
    Thumbprint {
        /// Path to PEM certificate
        #[arg(required = true)]
        cert: PathBuf,
    },

    /// Authenticate a client with a certificate against the configured registry
    Verify {
        /// OAuth client identifier
        #[arg(long)]
        client_id: String,

        /// Path to the PEM certificate the client would present
        #[arg(long)]
        cert: PathBuf,
    },

    /// List the token endpoint authentication methods this deployment supports
    Methods,

    /// Print the effective configuration (file + environment) as YAML
    Config,
}
