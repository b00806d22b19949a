use std::{collections::HashSet, path::PathBuf, sync::Arc};

use {
    anyhow::{Context as _, bail},
    clap::{Parser, Subcommand},
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    steward_config::{Severity, StewardConfig, validate_config, validate_file},
    steward_core::{Dispatcher, GlobalAllowlist, ServerRegistry},
    steward_panel::CraftyClient,
};

#[derive(Parser)]
#[command(
    name = "steward",
    about = "Steward — start, stop and watch game servers from Discord"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to steward.{toml,yaml,json}. Defaults to the standard locations.
    #[arg(long, global = true, env = "STEWARD_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (default when no subcommand is provided).
    Run,
    /// Validate the configuration and exit.
    Check,
    /// Validate the configuration and probe control panel connectivity.
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli);

    match &cli.command {
        None | Some(Commands::Run) => run(&cli).await,
        Some(Commands::Check) => check(&cli),
        Some(Commands::Doctor) => doctor(&cli).await,
    }
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Load the config and run the fail-fast gate: errors refuse startup,
/// warnings are logged and tolerated.
fn load_validated(cli: &Cli) -> anyhow::Result<StewardConfig> {
    let path = steward_config::resolve_config_path(cli.config.as_deref())?;
    info!(path = %path.display(), "loading config");
    let config = steward_config::load_config(&path)?;

    let diagnostics = validate_config(&config);
    let mut errors = 0;
    for d in &diagnostics {
        match d.severity {
            Severity::Error => {
                errors += 1;
                error!(path = %d.path, "{}", d.message);
            },
            Severity::Warning => warn!(path = %d.path, "{}", d.message),
            Severity::Info => info!(path = %d.path, "{}", d.message),
        }
    }
    if errors > 0 {
        bail!("configuration has {errors} error(s), refusing to start");
    }
    Ok(config)
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_validated(cli)?;

    let policy = GlobalAllowlist::new(
        config.access.allowed_user_ids.iter().copied(),
        config.access.allowed_role_names.iter().cloned(),
    );
    let registry = Arc::new(ServerRegistry::from_entries(config.servers.clone())?);
    let panel = Arc::new(CraftyClient::new(&config.panel)?);
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(policy),
        Arc::clone(&registry),
        panel.clone(),
    ));

    // A failed first login is not fatal; the panel may come up later and
    // the client re-authenticates on demand.
    if let Err(e) = panel.login().await {
        warn!(error = %e, "control panel not reachable yet");
    }

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received ctrl-c, shutting down");
            ctrl_c_cancel.cancel();
        }
    });

    info!(servers = registry.len(), "starting steward");
    steward_discord::run(&config, dispatcher, registry, panel, cancel).await?;
    Ok(())
}

fn check(cli: &Cli) -> anyhow::Result<()> {
    let path = steward_config::resolve_config_path(cli.config.as_deref())?;
    let result = validate_file(&path);

    if result.diagnostics.is_empty() {
        println!("{}: OK", path.display());
        return Ok(());
    }
    for d in &result.diagnostics {
        if d.path.is_empty() {
            println!("{}: {}", d.severity, d.message);
        } else {
            println!("{}: {}: {}", d.severity, d.path, d.message);
        }
    }
    if result.has_errors() {
        bail!("{} error(s) found", result.count(Severity::Error));
    }
    Ok(())
}

async fn doctor(cli: &Cli) -> anyhow::Result<()> {
    let config = load_validated(cli)?;

    let panel = CraftyClient::new(&config.panel)?;
    panel
        .login()
        .await
        .context("control panel login failed")?;
    let servers = panel
        .list_servers()
        .await
        .context("listing panel servers failed")?;
    println!(
        "control panel reachable, {} server(s) visible",
        servers.len()
    );

    let known: HashSet<&str> = servers.iter().map(|s| s.server_id.as_str()).collect();
    for (name, id) in &config.servers {
        if known.contains(id.as_str()) {
            println!("  ✔ {name} → {id}");
        } else {
            println!("  ✘ {name} → {id} (not visible on the panel)");
        }
    }
    Ok(())
}
