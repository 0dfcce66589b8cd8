use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use caddy_admin::config::{load_config, validation::validate_config, ConfigError, TunnelConfig};
use caddy_admin::observability::init_logging;
use caddy_admin::reconcile::{load_batch, AddMode};
use caddy_admin::routing::WildcardSpec;
use caddy_admin::{AdminClient, Bootstrapper, CaddyError, CaddyResult, ClientConfig, Reconciler};

#[derive(Parser)]
#[command(name = "caddy-admin")]
#[command(about = "Manage a Caddy server through its admin API", long_about = None)]
struct Cli {
    /// Admin API base URL
    #[arg(short, long, env = "CADDY_ADMIN_URL")]
    url: Option<String>,

    /// HTTP server whose routes are managed
    #[arg(short, long)]
    server: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reach the admin API through an SSH tunnel to this destination
    #[arg(long)]
    ssh: Option<String>,

    /// Log level when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the HTTP app, server and TLS policy if missing
    Setup {
        /// Cloudflare API token for ACME DNS challenges
        #[arg(long, env = "CLOUDFLARE_API_TOKEN", default_value = "", hide_env_values = true)]
        cf_token: String,
        /// Use Caddy's internal CA instead of ACME
        #[arg(long)]
        local: bool,
        /// Set the local CA's install_trust flag
        #[arg(long)]
        install_trust: Option<bool>,
    },
    /// Proxy a host to an upstream address
    AddProxy {
        from: String,
        to: String,
        /// Replace an existing route with the same ID
        #[arg(long)]
        replace: bool,
    },
    /// Delete a route by ID
    DelProxy { id: String },
    /// Add the catch-all route for *.domain
    AddWildcard { domain: String },
    /// Proxy subdomain.domain to local ports
    AddSubProxy {
        domain: String,
        subdomain: String,
        #[arg(long, value_delimiter = ',', required = true)]
        ports: Vec<u16>,
        /// Upstream host
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        replace: bool,
    },
    /// Show what is configured
    Status,
    /// Print the managed server's routes
    Routes,
    /// Print the config value at a path
    Get { path: String },
    /// Apply a TOML batch file of route operations
    Apply { file: PathBuf },
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = Cli::command().get_matches();
    let mut cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };
    drop_ambient_token(&mut cli.command, &matches);

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.logging, cli.log_level.as_deref());

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// `CLOUDFLARE_API_TOKEN` in the environment must not break `setup --local`;
/// only a token given with `--cf-token` conflicts with it.
fn drop_ambient_token(command: &mut Commands, matches: &ArgMatches) {
    let from_flag = matches
        .subcommand_matches("setup")
        .and_then(|m| m.value_source("cf_token"))
        == Some(ValueSource::CommandLine);
    if let Commands::Setup { cf_token, local: true, .. } = command {
        if !from_flag {
            cf_token.clear();
        }
    }
}

/// Config file first, then flags and environment on top.
fn resolve_config(cli: &Cli) -> CaddyResult<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };

    if let Some(url) = &cli.url {
        config.admin.url = url.clone();
    }
    if let Some(server) = &cli.server {
        config.admin.server_name = server.clone();
    }
    if let Some(destination) = &cli.ssh {
        let tunnel = config.tunnel.get_or_insert_with(TunnelConfig::default);
        tunnel.destination = destination.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

async fn run(command: Commands, config: &ClientConfig) -> CaddyResult<()> {
    let client = AdminClient::connect(config).await?;
    let reconciler = Reconciler::new(client.clone());

    match command {
        Commands::Setup {
            cf_token,
            local,
            install_trust,
        } => {
            let report = Bootstrapper::new(client)
                .setup_caddy(&cf_token, &config.admin.server_name, local, install_trust)
                .await?;
            print_json(&report)?;
        }
        Commands::AddProxy { from, to, replace } => {
            let mode = AddMode {
                replace,
                position: None,
            };
            reconciler.add_reverse_proxy_with(&from, &to, mode).await?;
            println!("Added route {}", from.trim());
        }
        Commands::DelProxy { id } => {
            if reconciler.delete_route(&id).await? {
                println!("Deleted route {}", id);
            } else {
                println!("No route {}", id);
            }
        }
        Commands::AddWildcard { domain } => {
            reconciler.add_wildcard_route(&domain).await?;
            println!("Added route {}", caddy_admin::routing::wildcard_id(&domain));
        }
        Commands::AddSubProxy {
            domain,
            subdomain,
            ports,
            host,
            replace,
        } => {
            let spec = WildcardSpec::new(&domain, &subdomain, &ports, host.as_deref())?;
            let mode = AddMode {
                replace,
                position: None,
            };
            reconciler.add_sub_proxy_with(&spec, mode).await?;
            println!("Added route {}", spec.fqdn());
        }
        Commands::Status => {
            let status = Bootstrapper::new(client).status().await?;
            print_json(&status)?;
        }
        Commands::Routes => {
            let routes = reconciler.fetch_routes().await?;
            print_json(&routes.into_value())?;
        }
        Commands::Get { path } => {
            let value = client.get_config(path.as_str()).await?;
            print_json(&value)?;
        }
        Commands::Apply { file } => {
            let ops = load_batch(&file)?;
            let report = reconciler.apply_batch(ops).await;
            for op in &report.applied {
                println!("applied  {}", op);
            }
            if let Some((op, e)) = &report.failed {
                println!("failed   {}: {}", op, e);
            }
            for op in &report.skipped {
                println!("skipped  {}", op);
            }
            report.into_result()?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> CaddyResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CaddyError::Schema(e.to_string()))?;
    println!("{}", text);
    Ok(())
}
