//! `bbalert` - CLI for bloodbank
//!
//! This binary analyzes the donor store, selects alerts, manages donors and
//! stored alerts, and runs the periodic alert worker.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use chrono::{Local, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use bloodbank::analysis::InventoryAnalysis;
use bloodbank::cli::{
    AlertCommand, AlertsCommand, AnalyzeCommand, Cli, Command, ConfigCommand, DonorsCommand,
    WorkerCommand,
};
use bloodbank::notify::{DeliveryFilter, LogSink, MemorySink, MultiSink};
use bloodbank::sample::sample_donors;
use bloodbank::selector::AlertSelector;
use bloodbank::worker::{CycleOutcome, StaticSource, Worker};
use bloodbank::{init_logging, Alert, Config, DonorRecord, InventoryAnalyzer, Storage};

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() -> CliResult {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Analyze(cmd) => handle_analyze(&config, &cmd),
        Command::Alert(cmd) => handle_alert(&config, &cmd),
        Command::Donors(cmd) => handle_donors(&config, cmd),
        Command::Alerts(cmd) => handle_alerts(&config, cmd),
        Command::Worker(cmd) => handle_worker(&config, &cmd),
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_storage(config: &Config) -> Result<Storage, bloodbank::Error> {
    Storage::open(config.database_path())
}

fn rng_from(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

fn handle_analyze(config: &Config, cmd: &AnalyzeCommand) -> CliResult {
    let storage = open_storage(config)?;
    let donors = storage.all_donors()?;
    let analyzer = InventoryAnalyzer::new();
    let analysis = match cmd.factor {
        Some(factor) => analyzer.analyze_with_factor(&donors, factor),
        None => analyzer.analyze(&donors, &Local::now()),
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_analysis(&analysis);
    }
    Ok(())
}

fn print_analysis(analysis: &InventoryAnalysis) {
    println!("Inventory Analysis");
    println!("==================");
    println!("Donors:          {}", analysis.total_donors);
    if analysis.unrecognized_donors > 0 {
        println!("Unrecognized:    {}", analysis.unrecognized_donors);
    }
    println!("Seasonal factor: {:.2}", analysis.seasonal_factor);
    println!();

    if !analysis.predictions.is_empty() {
        println!(
            "{:<5} {:>6} {:>9} {:>9} {:>9}  Priority",
            "Group", "Count", "Current", "Expected", "Shortage"
        );
        for p in analysis.predictions.values() {
            println!(
                "{:<5} {:>6} {:>8.1}% {:>8.1}% {:>9.1}  {}",
                p.blood_group.as_str(),
                p.current_count,
                p.current_percent,
                p.expected_percent,
                p.shortage,
                p.priority
            );
        }
        println!();
    }

    if analysis.critical_shortages.is_empty() {
        println!("Critical shortages: none");
    } else {
        println!(
            "Critical shortages: {}",
            bloodbank::blood_group::join_groups(&analysis.critical_shortages)
        );
    }

    if !analysis.recommended_actions.is_empty() {
        println!();
        println!("Recommended actions:");
        for action in &analysis.recommended_actions {
            println!("  - {action}");
        }
    }
}

fn print_alert(alert: &Alert) {
    let id = alert.id.map_or_else(|| "-".to_string(), |id| id.to_string());
    let mut flags = Vec::new();
    if !alert.read {
        flags.push("unread");
    }
    if !alert.active {
        flags.push("dismissed");
    }
    if alert.is_expired_at(Utc::now()) {
        flags.push("expired");
    }

    println!(
        "[{id}] {} | {} | {} | {}",
        alert.priority,
        alert.alert_type.display_name(),
        alert.scope,
        alert.title
    );
    println!("    {}", alert.message);
    if let Some(location) = &alert.location {
        println!("    Location: {location}");
    }
    if let Some(contact) = &alert.contact {
        println!("    Contact:  {contact}");
    }
    if let Some(units) = alert.required_units {
        println!("    Units:    {units}");
    }
    if let Some(expires_at) = alert.expires_at {
        println!(
            "    Expires:  {}",
            expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
    }
    if !flags.is_empty() {
        println!("    ({})", flags.join(", "));
    }
}

fn handle_alert(config: &Config, cmd: &AlertCommand) -> CliResult {
    let storage = open_storage(config)?;
    let donors = storage.all_donors()?;

    let mut worker = Worker::new(
        StaticSource::new(donors),
        MemorySink::new(),
        AlertSelector::new(config.selector.clone()),
        DeliveryFilter::permissive(),
    );
    if let Some(seed) = cmd.seed {
        worker = worker.with_seed(seed);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let outcome = runtime.block_on(worker.run_cycle(&Local::now()))?;

    let Some(alert) = outcome.alert() else {
        if cmd.json {
            println!("null");
        } else {
            println!("No alert selected.");
        }
        return Ok(());
    };

    let mut alert = alert.clone();
    if cmd.store {
        match storage.insert_alert(&alert, Utc::now())? {
            Some(id) => alert.id = Some(id),
            None => info!("An identical alert is already active; not stored"),
        }
    }

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&alert)?);
    } else {
        print_alert(&alert);
    }
    Ok(())
}

fn handle_donors(config: &Config, cmd: DonorsCommand) -> CliResult {
    let storage = open_storage(config)?;

    match cmd {
        DonorsCommand::List { group, limit, json } => {
            let donors = storage.list_donors(group, limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&donors)?);
            } else if donors.is_empty() {
                println!("No donors registered.");
            } else {
                for donor in &donors {
                    println!(
                        "{:>5}  {:<4} {:<24} {:<16} {:<15} {}",
                        donor.id.unwrap_or_default(),
                        donor.blood_group,
                        donor.name,
                        donor.phone,
                        donor.city,
                        if donor.available { "available" } else { "unavailable" }
                    );
                }
            }
        }
        DonorsCommand::Add {
            name,
            group,
            phone,
            city,
            unavailable,
        } => {
            let mut donor = DonorRecord::new(name, group.as_str(), phone, city);
            donor.available = !unavailable;
            let id = storage.add_donor(&donor)?;
            println!("Added donor {id} ({group}).");
        }
        DonorsCommand::Seed { count, seed } => {
            let donors = sample_donors(count, Utc::now(), &mut rng_from(seed));
            let added = storage.add_donors(&donors)?;
            println!("Added {added} sample donors.");
        }
        DonorsCommand::Remove { id } => {
            storage.delete_donor(id)?;
            println!("Removed donor {id}.");
        }
        DonorsCommand::Clear { yes } => {
            if yes {
                let removed = storage.clear_donors()?;
                println!("Removed {removed} donors.");
            } else {
                println!("This will remove every registered donor.");
                println!("Use --yes to confirm.");
            }
        }
    }
    Ok(())
}

fn handle_alerts(config: &Config, cmd: AlertsCommand) -> CliResult {
    let storage = open_storage(config)?;
    let now = Utc::now();

    match cmd {
        AlertsCommand::List { all, limit, json } => {
            let alerts: Vec<Alert> = if all {
                storage.recent_alerts(limit)?
            } else {
                storage.active_alerts(now)?.into_iter().take(limit).collect()
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&alerts)?);
            } else if alerts.is_empty() {
                println!("No alerts.");
            } else {
                for alert in &alerts {
                    print_alert(alert);
                }
            }
        }
        AlertsCommand::Read { id } => {
            storage.mark_alert_read(id)?;
            println!("Marked alert {id} as read.");
        }
        AlertsCommand::Dismiss { id } => {
            storage.mark_alert_inactive(id)?;
            println!("Dismissed alert {id}.");
        }
        AlertsCommand::Cleanup => {
            let (expired, pruned) = run_maintenance(&storage, config)?;
            println!("Deleted {expired} expired and {pruned} old alerts.");
        }
        AlertsCommand::Unread => {
            println!("{}", storage.unread_count(now)?);
        }
    }
    Ok(())
}

fn run_maintenance(storage: &Storage, config: &Config) -> Result<(usize, usize), bloodbank::Error> {
    let expired = storage.cleanup_expired_alerts(Utc::now())?;
    let pruned = match config.max_alerts() {
        Some(keep) => storage.prune_alerts_keep_recent(keep)?,
        None => 0,
    };
    Ok((expired, pruned))
}

fn handle_worker(config: &Config, cmd: &WorkerCommand) -> CliResult {
    let source = open_storage(config)?;
    run_maintenance(&source, config)?;

    let mut sink = MultiSink::new().with(LogSink);
    if config.worker.store_alerts {
        sink = sink.with(open_storage(config)?);
    }

    let interval = cmd.interval.map_or_else(
        || config.worker_interval(),
        |minutes| std::time::Duration::from_secs(minutes.max(1) * 60),
    );
    let mut worker = Worker::new(
        source,
        sink,
        AlertSelector::new(config.selector.clone()),
        DeliveryFilter::new(config.preferences.clone()),
    )
    .with_interval(interval);
    if let Some(seed) = cmd.seed {
        worker = worker.with_seed(seed);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        if cmd.once {
            match worker.run_once().await {
                Some(CycleOutcome::Delivered { alert, channel }) => {
                    println!("Delivered on {channel}:");
                    print_alert(&alert);
                }
                Some(CycleOutcome::Suppressed { alert, reason }) => {
                    println!("Suppressed ({reason}): {}", alert.title);
                }
                Some(CycleOutcome::NoAlert) => println!("No alert selected."),
                None => println!("Cycle failed; see log."),
            }
            return;
        }

        let handle = worker.handle();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown requested"),
                Err(e) => warn!(error = %e, "Failed to listen for ctrl-c"),
            }
            handle.stop();
        });

        let stats = worker.run().await;
        println!(
            "Ran {} cycles: {} delivered, {} suppressed, {} failed.",
            stats.cycles, stats.delivered, stats.suppressed, stats.failures
        );
    });
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> CliResult {
    let storage = open_storage(config)?;
    let stats = storage.stats(Utc::now())?;

    if json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("bbalert status");
        println!("--------------");
        println!("Database:         {}", config.database_path().display());
        println!("Donors:           {}", stats.total_donors);
        println!("  available:      {}", stats.available_donors);
        println!("Alerts:           {}", stats.total_alerts);
        println!("  active:         {}", stats.active_alerts);
        println!("  unread:         {}", stats.unread_alerts);
        println!("Database size:    {} bytes", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                let prefs = &config.preferences;
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Max alerts:         {}", config.storage.max_alerts);
                println!();
                println!("[Selector]");
                println!("  Weekend boost:      {:?}", config.selector.weekend_boost);
                println!(
                    "  Positive feedback:  {}",
                    config.selector.positive_feedback_probability
                );
                println!();
                println!("[Worker]");
                println!("  Interval (minutes): {}", config.worker.interval_minutes);
                println!("  Store alerts:       {}", config.worker.store_alerts);
                println!();
                println!("[Preferences]");
                println!("  Shortage alerts:    {}", prefs.blood_shortage_alerts);
                println!("  Reminders:          {}", prefs.donation_reminders);
                println!("  Emergency alerts:   {}", prefs.emergency_alerts);
                println!("  Nearby donations:   {}", prefs.nearby_donations);
                println!("  Health tips:        {}", prefs.health_tips);
                println!(
                    "  Blood groups:       {}",
                    bloodbank::blood_group::join_groups(&prefs.preferred_blood_groups)
                );
                if prefs.quiet_hours_enabled {
                    println!(
                        "  Quiet hours:        {:02}:00-{:02}:00",
                        prefs.quiet_hours_start, prefs.quiet_hours_end
                    );
                } else {
                    println!("  Quiet hours:        off");
                }
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
