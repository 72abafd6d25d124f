//! # Campana — lead-time class reminders for WhatsApp groups
//!
//! Once per minute, checks which sessions in schedule.json start exactly
//! `lead_minutes` from now and pushes a reminder to every configured group,
//! exactly once per session (sent_log.json keeps the dedup state).
//!
//! Usage:
//!   campana                       # Start the reminder loop
//!   campana targets               # List chats visible to the account
//!   campana send-test             # Send a test message to the recipients
//!   campana validate              # Check config + schedule, then exit

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use campana_channels::WhatsAppGateway;
use campana_core::CampanaConfig;
use campana_core::traits::Notifier;
use campana_scheduler::{Clock, ReminderEngine, engine};

#[derive(Parser)]
#[command(
    name = "campana",
    version,
    about = "🔔 Campana — lead-time class reminders for WhatsApp groups"
)]
struct Cli {
    /// Path to config.toml (default: ~/.campana/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the reminder loop (default)
    Run,
    /// List every chat visible to the linked account, with ids
    Targets,
    /// Send a test message
    SendTest {
        /// Target chat id(s); defaults to the configured recipients
        #[arg(long)]
        target: Vec<String>,
        /// Message text; defaults to a timestamped test notice
        #[arg(long)]
        message: Option<String>,
    },
    /// Check config, schedule, and sent log without sending anything
    Validate,
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

fn load_config(cli: &Cli) -> anyhow::Result<CampanaConfig> {
    match &cli.config {
        Some(path) => {
            let path = expand_path(path);
            CampanaConfig::load_from(Path::new(&path))
                .with_context(|| format!("loading config from {path}"))
        }
        None => CampanaConfig::load().context("loading config"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "campana=debug,campana_core=debug,campana_channels=debug,campana_scheduler=debug"
    } else {
        "campana=info,campana_core=info,campana_channels=info,campana_scheduler=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Targets => targets(config).await,
        Command::SendTest { target, message } => send_test(config, target, message).await,
        Command::Validate => validate(config),
    }
}

async fn run(config: CampanaConfig) -> anyhow::Result<()> {
    // ConfigError is the only fatal class; everything later is contained.
    config.validate().context("invalid configuration")?;

    let engine = ReminderEngine::from_config(&config)?;
    let recipients = config.recipients();

    tracing::info!("🔔 Campana v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "🕒 TZ={} | lead={} min | schedule={}",
        config.timezone,
        config.lead_minutes,
        config.schedule_path().display()
    );
    tracing::info!("👥 Recipients configured: {}", recipients.len());

    let mut gateway = WhatsAppGateway::new(config.channel.whatsapp.clone());
    match gateway.connect().await {
        Ok(()) => {
            // One-time sanity pass: show the name behind each configured id.
            for gid in &recipients {
                match gateway.resolve_target(gid).await {
                    Ok(info) => tracing::info!("📌 OK target: \"{}\" ({gid})", info.name),
                    Err(e) => tracing::warn!(
                        "⚠️ Could not validate {gid}: {e} — check that group ids end in @g.us"
                    ),
                }
            }
        }
        Err(e) => {
            tracing::warn!("⚠️ Transport not ready: {e}");
            tracing::warn!("   Ticking continues; sends fail until the gateway session is up.");
        }
    }

    engine::run(&engine, &mut gateway).await;
    Ok(())
}

async fn targets(config: CampanaConfig) -> anyhow::Result<()> {
    let mut gateway = WhatsAppGateway::new(config.channel.whatsapp.clone());
    gateway
        .connect()
        .await
        .context("gateway session must be ready to list chats")?;

    let mut targets = gateway.list_targets().await?;
    targets.sort_by(|a, b| b.is_group.cmp(&a.is_group).then(a.name.cmp(&b.name)));

    println!("Chats visible to the linked account ({}):\n", targets.len());
    for t in &targets {
        let marker = if t.is_group { "👥" } else { "👤" };
        println!("  {marker} {}  —  {}", t.name, t.id);
    }
    println!("\nGroup ids (ending in @g.us) go into `recipients` in config.toml.");
    Ok(())
}

async fn send_test(
    config: CampanaConfig,
    targets: Vec<String>,
    message: Option<String>,
) -> anyhow::Result<()> {
    let targets = if targets.is_empty() {
        config.recipients()
    } else {
        targets
    };
    if targets.is_empty() {
        bail!("No targets: pass --target or configure recipients in config.toml");
    }

    let clock = Clock::new(config.tz().context("invalid timezone")?);
    let text = message.unwrap_or_else(|| {
        format!(
            "✅ Prueba del bot ({})\nSi lees esto, el envío a múltiples grupos funciona.",
            clock.now_civil().stamp()
        )
    });

    let mut gateway = WhatsAppGateway::new(config.channel.whatsapp.clone());
    gateway.connect().await.context("gateway not ready")?;

    let mut sent = 0;
    for (i, id) in targets.iter().enumerate() {
        match gateway.resolve_target(id).await {
            Ok(info) => println!("📌 Sending to: \"{}\" ({id})", info.name),
            Err(e) => println!("⚠️ Could not resolve {id}: {e}"),
        }
        match gateway.send_message(id, &text).await {
            Ok(()) => {
                sent += 1;
                println!("✅ Sent OK to {id}");
            }
            Err(e) => println!("❌ Send to {id} failed: {e}"),
        }
        if i + 1 < targets.len() {
            tokio::time::sleep(std::time::Duration::from_millis(config.send_delay_ms)).await;
        }
    }

    println!("\nDone: {sent}/{} delivered.", targets.len());
    Ok(())
}

/// Hard-stop counterpart of the engine's soft-skip policy: any problem here
/// is a nonzero exit.
fn validate(config: CampanaConfig) -> anyhow::Result<()> {
    config.validate().context("config")?;
    let tz = config.tz().context("timezone")?;
    println!("✅ Config: TZ={tz} lead={} min", config.lead_minutes);

    let recipients = config.recipients();
    if recipients.is_empty() {
        println!("⚠️ No recipients configured — reminders would go nowhere");
    } else {
        println!("✅ Recipients: {}", recipients.len());
        for r in &recipients {
            println!("   • {r}");
        }
    }

    let catalog = campana_scheduler::EventCatalog::new(config.schedule_path());
    let events = catalog
        .load()
        .with_context(|| format!("schedule at {}", config.schedule_path().display()))?;
    println!("✅ Schedule: {} session(s)", events.len());
    for e in &events {
        println!(
            "   • {} {}  {} — {}",
            e.date,
            e.start.format("%H:%M"),
            e.subject,
            e.teacher
        );
    }

    let ledger = campana_scheduler::Ledger::open(config.ledger_path());
    println!(
        "✅ Sent log: {} record(s) at {}",
        ledger.len(),
        config.ledger_path().display()
    );

    println!("\nEverything checks out.");
    Ok(())
}
