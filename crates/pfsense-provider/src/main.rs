use anyhow::Context;
use clap::{Parser, Subcommand};
use pfsense_provider::config::{ProcessEnvironment, ProviderModel};
use pfsense_provider::provider::type_name;
use pfsense_provider::{ConfigValue, Diagnostics, PfSenseProvider};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "terraform-provider-pfsense-v2")]
#[command(about = "Read pfSense configuration over the REST API v2", version)]
struct Cli {
    /// Appliance URL, falls back to PFSENSEV2_URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    insecure: bool,

    /// Basic auth user name, falls back to PFSENSEV2_API_USERNAME
    #[arg(long, global = true)]
    username: Option<String>,

    /// Basic auth password, falls back to PFSENSEV2_API_PASSWORD
    #[arg(long, global = true)]
    password: Option<String>,

    /// API key, falls back to PFSENSEV2_API_TOKEN
    #[arg(long, global = true)]
    api_token: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print provider, data source, resource and function schemas
    Schema,
    /// Read the configs data source and print its state
    Read,
}

impl Cli {
    fn provider_model(&self) -> ProviderModel {
        ProviderModel {
            url: self.url.clone().into(),
            insecure: if self.insecure {
                ConfigValue::Known(true)
            } else {
                ConfigValue::Null
            },
            username: self.username.clone().into(),
            password: self.password.clone().into(),
            api_token: self.api_token.clone().into(),
        }
    }
}

fn report(diags: &Diagnostics) {
    for diag in diags {
        eprintln!("{diag}\n");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Schema => {
            let schemas = serde_json::to_string_pretty(&PfSenseProvider::schemas())
                .context("failed to serialize schemas")?;
            println!("{schemas}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Read => {
            let mut provider = PfSenseProvider::new(env!("CARGO_PKG_VERSION"));
            let mut diags = Diagnostics::new();

            provider.configure(&cli.provider_model(), &ProcessEnvironment, &mut diags);
            if diags.has_error() {
                report(&diags);
                return Ok(ExitCode::FAILURE);
            }

            let state = match provider.data_source(&type_name("configs"), &mut diags) {
                Some(data_source) => data_source.read(&serde_json::json!({}), &mut diags).await,
                None => None,
            };
            report(&diags);

            match state {
                Some(state) if !diags.has_error() => {
                    let state = serde_json::to_string_pretty(&state)
                        .context("failed to serialize state")?;
                    println!("{state}");
                    Ok(ExitCode::SUCCESS)
                }
                _ => Ok(ExitCode::FAILURE),
            }
        }
    }
}
