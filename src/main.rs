//! mtls-client-auth - operator tooling for OAuth2 mutual TLS client authentication

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use axum::http::Request;
use clap::Parser;
use tracing::{error, info};

use mtls_client_auth::{
    cli::{Cli, Command},
    config::Config,
    context::{BodyParameters, CLIENT_ID_PARAM, ClientAuthnContext},
    dispatch::{AuthenticatorRegistry, register_mutual_tls},
    mtls::{Certificate, PeerCertificate, Thumbprints},
    registry::InMemoryClientRegistry,
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let result = match &cli.command {
        Command::Thumbprint { cert } => run_thumbprint(cert),
        Command::Verify { client_id, cert } => {
            run_verify(cli.config.as_deref(), client_id, cert).await
        }
        Command::Methods => run_methods(cli.config.as_deref()),
        Command::Config => run_show_config(cli.config.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_thumbprint(cert: &Path) -> anyhow::Result<ExitCode> {
    let certificate = Certificate::from_pem_file(cert)
        .with_context(|| format!("reading {}", cert.display()))?;
    let thumbprints = Thumbprints::of(&certificate);

    println!("subject:  {}", certificate.subject_dn());
    println!("x5t:      {}", thumbprints.x5t());
    println!("x5t#S256: {}", thumbprints.x5t_s256());
    Ok(ExitCode::SUCCESS)
}

fn build_authenticators(config: &Config) -> anyhow::Result<AuthenticatorRegistry> {
    let clients = InMemoryClientRegistry::from_config(config).context("loading clients")?;
    let mut registry = AuthenticatorRegistry::new();
    register_mutual_tls(&mut registry, config, Arc::new(clients))
        .context("registering mutual TLS authenticator")?;
    Ok(registry)
}

async fn run_verify(
    config_path: Option<&Path>,
    client_id: &str,
    cert: &Path,
) -> anyhow::Result<ExitCode> {
    let config = Config::load(config_path).context("loading configuration")?;
    let authenticators = build_authenticators(&config)?;
    let certificate = Certificate::from_pem_file(cert)
        .with_context(|| format!("reading {}", cert.display()))?;

    let mut request = Request::builder().body(())?;
    request
        .extensions_mut()
        .insert(PeerCertificate(certificate));
    let body: BodyParameters = [(CLIENT_ID_PARAM, client_id)].into_iter().collect();
    let mut context = ClientAuthnContext::new();

    match authenticators.authenticate(&request, &body, &mut context).await {
        Ok(id) => {
            info!(client_id = %id, "Client authenticated");
            println!("authenticated: {id}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!(
                "rejected: {} ({})",
                e.error,
                context.failure_reason.as_deref().unwrap_or("no reason recorded")
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_methods(config_path: Option<&Path>) -> anyhow::Result<ExitCode> {
    let config = Config::load(config_path).context("loading configuration")?;
    let authenticators = build_authenticators(&config)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "token_endpoint_auth_methods_supported":
                authenticators.token_endpoint_auth_methods_supported(),
        }))?
    );
    Ok(ExitCode::SUCCESS)
}

fn run_show_config(config_path: Option<&Path>) -> anyhow::Result<ExitCode> {
    let config = Config::load(config_path).context("loading configuration")?;
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(ExitCode::SUCCESS)
}
