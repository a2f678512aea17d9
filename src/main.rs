use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use rivalwatch::alert::{AlertFilter, AlertRepository, AlertStatus, RiskLevel};
use rivalwatch::competitor::{CompetitorRepository, MonitoredUrlRepository, NewCompetitor};
use rivalwatch::config::{SchedulerConfig, WebConfig};
use rivalwatch::datetime::MAX_WINDOW_DAYS;
use rivalwatch::report::alert_report;
use rivalwatch::{
    logging, run_cycle, run_digest, start_scheduler, Config, CycleOptions, Database, Result,
    RivalError, Services, WebServer,
};

/// Competitive intelligence monitor.
#[derive(Parser, Debug)]
#[command(name = "rivalwatch", version, about)]
struct Cli {
    /// Configuration file.
    #[arg(long, short = 'c', global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve {
        /// Do not start the background scheduler.
        #[arg(long)]
        no_scheduler: bool,
    },
    /// Check monitored pages once.
    Monitor {
        /// Check every active page, not only those that are due.
        #[arg(long)]
        force: bool,
    },
    /// Collect news once.
    Collect {
        /// How many days back to search.
        #[arg(long, default_value_t = 3)]
        days: i64,
        /// Limit collection to one competitor.
        #[arg(long)]
        competitor: Option<i64>,
    },
    /// Analyze pending page changes and news into alerts.
    Analyze,
    /// Send pending alert notifications.
    Alert {
        /// Minimum risk level to send (defaults to the configured level).
        #[arg(long)]
        min_risk: Option<RiskLevel>,
    },
    /// Generate insights for alerts and news that have none.
    Insights {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Run the full pipeline once: pages, news, analysis, notifications.
    Run,
    /// Manage competitors.
    Competitors {
        #[command(subcommand)]
        action: CompetitorAction,
    },
    /// List or triage alerts.
    Alerts {
        #[command(subcommand)]
        action: AlertAction,
    },
    /// Print an alert report for the last few days.
    Report {
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
    /// Post the daily digest of the last 24 hours now.
    Digest,
}

#[derive(Subcommand, Debug)]
enum CompetitorAction {
    /// List every competitor with URL and new alert counts.
    List,
    /// Add a competitor.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Stop monitoring a competitor.
    Remove {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum AlertAction {
    /// List recent alerts.
    List {
        #[arg(long)]
        status: Option<AlertStatus>,
        #[arg(long)]
        risk: Option<RiskLevel>,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Acknowledge a new alert.
    Acknowledge {
        #[arg(long)]
        id: i64,
    },
    /// Resolve an alert.
    Resolve {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        notes: Option<String>,
    },
}

fn risk_marker(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Critical => "🚨",
        RiskLevel::High => "🔴",
        RiskLevel::Medium => "🟡",
        RiskLevel::Low => "🟢",
        RiskLevel::Info => "ℹ️",
    }
}

async fn competitors_command(services: &Services, action: CompetitorAction) -> Result<()> {
    let repo = CompetitorRepository::new(services.db.pool());
    match action {
        CompetitorAction::List => {
            let competitors = repo.list_with_counts(true).await?;
            println!("{} competitor(s)", competitors.len());
            for summary in &competitors {
                let competitor = &summary.competitor;
                let status = if competitor.is_active { "active" } else { "inactive" };
                println!("[{}] {} ({status})", competitor.id, competitor.name);
                println!(
                    "    Website: {}",
                    competitor.website.as_deref().unwrap_or("N/A")
                );
                println!(
                    "    URLs: {} | New alerts: {}",
                    summary.url_count, summary.alert_count
                );
            }
        }
        CompetitorAction::Add {
            name,
            website,
            description,
        } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(RivalError::Validation("competitor name is empty".into()));
            }
            if repo.get_by_name(name).await?.is_some() {
                return Err(RivalError::Validation(format!("competitor {name} already exists")));
            }
            let mut new = NewCompetitor::new(name);
            new.website = website;
            new.description = description;
            let competitor = repo.create(&new).await?;
            println!("Added competitor: {} (ID: {})", competitor.name, competitor.id);
        }
        CompetitorAction::Remove { id } => {
            let competitor = repo
                .get_by_id(id)
                .await?
                .ok_or_else(|| RivalError::NotFound(format!("Competitor {id}")))?;
            repo.deactivate(id).await?;
            println!("Deactivated competitor: {}", competitor.name);
        }
    }
    Ok(())
}

async fn alerts_command(services: &Services, action: AlertAction) -> Result<()> {
    let repo = AlertRepository::new(services.db.pool());
    match action {
        AlertAction::List {
            status,
            risk,
            limit,
        } => {
            let filter = AlertFilter {
                status,
                risk_levels: risk.into_iter().collect(),
                ..Default::default()
            };
            let alerts = repo.list(&filter, 0, limit.clamp(1, 500)).await?;
            println!("Found {} alert(s)", alerts.len());
            for alert in &alerts {
                let title: String = alert.title.chars().take(50).collect();
                println!("{} [{}] {}", risk_marker(alert.risk_level), alert.id, title);
                println!(
                    "   Competitor: {}",
                    alert.competitor_name.as_deref().unwrap_or("Unknown")
                );
                println!(
                    "   Status: {} | Risk: {} ({}/100)",
                    alert.status,
                    alert.risk_level,
                    alert.risk_score.unwrap_or_default()
                );
                println!("   Detected: {}", alert.detected_at.format("%Y-%m-%d %H:%M"));
            }
        }
        AlertAction::Acknowledge { id } => {
            let alert = repo
                .get_by_id(id)
                .await?
                .ok_or_else(|| RivalError::NotFound(format!("Alert {id}")))?;
            if repo.acknowledge(id).await? {
                println!("Alert {id} acknowledged.");
            } else {
                println!("Alert {id} is {}, left unchanged.", alert.status);
            }
        }
        AlertAction::Resolve { id, notes } => {
            repo.get_by_id(id)
                .await?
                .ok_or_else(|| RivalError::NotFound(format!("Alert {id}")))?;
            repo.resolve(id, notes.as_deref().unwrap_or_default()).await?;
            println!("Alert {id} resolved.");
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> Config {
    match Config::load_with_env(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", path.display());
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    }
}

async fn open_services(config: Config) -> Result<Arc<Services>> {
    config.validate()?;
    let db = Arc::new(Database::open(&config.database.path).await?);
    Ok(Arc::new(Services::new(db, config)?))
}

async fn serve(
    services: Arc<Services>,
    web_config: &WebConfig,
    scheduler_config: &SchedulerConfig,
    no_scheduler: bool,
) -> Result<()> {
    if scheduler_config.enabled && !no_scheduler {
        start_scheduler(services.clone(), scheduler_config);
    } else {
        info!("Background scheduler disabled");
    }

    WebServer::new(web_config, services)?
        .run()
        .await
        .map_err(RivalError::Io)
}

async fn run_command(command: Command, config: Config) -> Result<()> {
    let web_config = config.web.clone();
    let scheduler_config = config.scheduler.clone();
    let services = open_services(config).await?;

    match command {
        Command::Serve { no_scheduler } => {
            serve(services, &web_config, &scheduler_config, no_scheduler).await?;
        }
        Command::Monitor { force } => {
            let changed = services.monitor.check_all(force).await?;
            println!("{} page(s) changed", changed.len());
            let urls = MonitoredUrlRepository::new(services.db.pool());
            for snapshot in &changed {
                let url = urls
                    .get_by_id(snapshot.monitored_url_id)
                    .await?
                    .map(|u| u.url)
                    .unwrap_or_default();
                println!(
                    "  {}: {}",
                    url,
                    snapshot.diff_summary.as_deref().unwrap_or_default()
                );
            }
        }
        Command::Collect { days, competitor } => {
            let reports = match competitor {
                Some(id) => {
                    let competitor = CompetitorRepository::new(services.db.pool())
                        .get_by_id(id)
                        .await?
                        .ok_or_else(|| RivalError::NotFound(format!("Competitor {id}")))?;
                    vec![services.collector.collect_competitor(&competitor, days).await?]
                }
                None => services.collector.collect_all(days).await?,
            };
            for report in &reports {
                println!(
                    "{}: {} new, {} duplicates, {} filtered",
                    report.competitor_name,
                    report.new_items.len(),
                    report.duplicates_skipped,
                    report.filtered
                );
            }
        }
        Command::Analyze => {
            let report = services.analyzer.process_pending().await?;
            println!(
                "Processed {} page change(s) and {} news item(s), created {} alert(s)",
                report.page_changes_processed, report.news_processed, report.alerts_created
            );
        }
        Command::Alert { min_risk } => {
            let notifier = &services.notifier;
            if !notifier.is_configured() {
                warn!("No notification channel configured");
                return Ok(());
            }
            let min_risk = min_risk.unwrap_or_else(|| notifier.configured_min_risk());
            let report = notifier.send_pending(min_risk).await?;
            println!(
                "Sent {} of {} pending alert(s), {} failed",
                report.sent, report.total_pending, report.failed
            );
        }
        Command::Insights { limit } => {
            let insights = services.insights.generate_batch(limit.max(1)).await?;
            println!("Generated {} insight(s)", insights.len());
            for insight in &insights {
                println!("  {}", insight.title);
            }
        }
        Command::Run => {
            let options = CycleOptions {
                news_days_back: services.config.scheduler.news_days_back,
                ..Default::default()
            };
            let report = run_cycle(&services, options).await;
            println!(
                "{} page change(s), {} news item(s), {} alert(s) created",
                report.changes_detected, report.news_collected, report.analysis.alerts_created
            );
            if let Some(notifications) = &report.notifications {
                println!("{} notification(s) sent", notifications.sent);
            }
            for e in &report.errors {
                println!("  failed: {e}");
            }
        }
        Command::Competitors { action } => competitors_command(&services, action).await?,
        Command::Alerts { action } => alerts_command(&services, action).await?,
        Command::Report { days } => {
            if !(1..=MAX_WINDOW_DAYS).contains(&days) {
                return Err(RivalError::Validation(format!(
                    "days must be between 1 and {MAX_WINDOW_DAYS}"
                )));
            }
            let report = alert_report(services.db.pool(), days).await?;
            print!("{}", report.render());
        }
        Command::Digest => {
            let digest = run_digest(&services).await?;
            let sent = digest.deliveries.iter().filter(|d| d.success).count();
            println!(
                "{} alert(s) in the last 24 hours, digest sent to {} channel(s)",
                digest.alerts, sent
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = load_config(&cli.config);
    let command = cli.command.unwrap_or(Command::Serve {
        no_scheduler: false,
    });

    if matches!(command, Command::Serve { .. }) {
        if let Err(e) = logging::init(&config.logging) {
            eprintln!("Failed to initialize logging: {e}");
            // Fall back to console-only logging
            logging::init_console_only(&config.logging.level);
        }
        info!("rivalwatch {}", env!("CARGO_PKG_VERSION"));
    } else {
        logging::init_console_only(&config.logging.level);
    }

    let result = run_command(command, config).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
