use clap::Parser;
use reelsmith::sandbox::sandbox_collaborators;
use reelsmith::{Cli, Commands, DailyLoop, DeliveryScheduler, DuplicateGuard, PackStore, Settings};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { verbose: true, .. } => "debug",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Run { once, .. } => run_loop(once).await?,
        Commands::Status => show_status()?,
        Commands::Plan => show_plan()?,
        Commands::Prune => prune_packs()?,
    }

    Ok(())
}

/// Run the daily loop until Ctrl-C, or a single cycle with `--once`.
async fn run_loop(once: bool) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Arc::new(Settings::load()?);
    let collaborators = Arc::new(sandbox_collaborators());
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let mut daily = DailyLoop::new(settings, collaborators, shutdown_rx)?;
    if once {
        let report = daily.cycle().await?;
        println!(
            "cycle complete: {} dispatched, {} uploaded, {} failed, {} abandoned",
            report.dispatched, report.uploaded, report.failed, report.abandoned
        );
        return Ok(());
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });
    daily.run().await?;
    Ok(())
}

/// Print each retained pack and its units.
fn show_status() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    let store = PackStore::new(&settings.state_dir)?;
    let guard = DuplicateGuard::load(&settings.state_dir)?;

    println!("seen source ids: {}", guard.len());
    for key in store.list_keys()? {
        let Some(pack) = store.load(&key)? else {
            continue;
        };
        println!(
            "pack {} ({} units, {} attempts, {} failures)",
            key,
            pack.units.len(),
            pack.generation_count,
            pack.generation_failures
        );
        for unit in &pack.units {
            let remote = unit
                .upload
                .as_ref()
                .map(|u| format!(" -> {}", u.remote_id))
                .unwrap_or_default();
            println!("  {} {} {}{}", unit.id, unit.source_item_id, unit.status, remote);
        }
    }
    Ok(())
}

/// Print the upload timetable for every retained pack.
fn show_plan() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Arc::new(Settings::load()?);
    let store = PackStore::new(&settings.state_dir)?;
    let scheduler = DeliveryScheduler::new(settings, Arc::new(sandbox_collaborators()));

    for key in store.list_keys()? {
        let Some(pack) = store.load(&key)? else {
            continue;
        };
        println!("pack {}", key);
        for slot in scheduler.slots_for(&pack) {
            println!(
                "  {} at {} (attempts {})",
                slot.content_unit_id,
                slot.target_time.format("%Y-%m-%d %H:%M:%S UTC"),
                slot.attempt_count
            );
        }
    }
    Ok(())
}

/// Delete packs past the retention window.
fn prune_packs() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    let store = PackStore::new(&settings.state_dir)?;
    let deleted = store.enforce_retention(
        settings.delivery.max_packs,
        settings.delivery.horizon_hours,
        &std::collections::HashSet::new(),
    )?;
    if deleted.is_empty() {
        println!("nothing to prune");
    } else {
        for key in deleted {
            println!("deleted pack {}", key);
        }
    }
    Ok(())
}
