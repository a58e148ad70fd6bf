use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use screening_aggregator::{
    AggregatorConfig, EntityType, ListEntry, ListSource, RiskLevel, SanctionsAggregator,
    ScreeningContext, ScreeningSource, SourceKind,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Screen parties against the consolidated sanctions lists
#[derive(Parser, Debug)]
#[command(name = "screen", version, about)]
struct Args {
    /// Names to screen
    #[arg(required_unless_present = "health")]
    names: Vec<String>,

    /// Country hint (ISO 3166 alpha-2)
    #[arg(short, long, default_value = "")]
    country: String,

    /// TOML configuration file; environment overrides are used otherwise
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overall deadline for each screening (milliseconds)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Only run source health checks
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("screening_aggregator=info,screen=info"));
    if args.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = match &args.config {
        Some(path) => AggregatorConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AggregatorConfig::from_env()
            .context("Failed to load configuration from environment")?,
    };

    let sources = build_sources(&config)?;
    let aggregator =
        SanctionsAggregator::new(config, sources).context("Failed to build aggregator")?;

    let shutdown = CancellationToken::new();
    let mut ctx = ScreeningContext::with_token(shutdown.clone());
    if let Some(timeout_ms) = args.timeout_ms {
        ctx = ctx.with_timeout(Duration::from_millis(timeout_ms));
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling screenings");
            shutdown.cancel();
        }
    });

    if args.health {
        aggregator.is_healthy(&ctx).await.context("Health check failed")?;
        info!("All enabled sources healthy");
        return Ok(());
    }

    let results = aggregator
        .screen_batch(args.names.as_slice(), &args.country, &ctx)
        .await;
    for result in &results {
        let factors = aggregator.export_risk_factors(result);
        let report = serde_json::json!({
            "result": result,
            "risk_factors": factors,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    info!("Screened {}/{} name(s)", results.len(), args.names.len());
    if results.len() < args.names.len() {
        anyhow::bail!("{} screening(s) failed", args.names.len() - results.len());
    }

    Ok(())
}

fn build_sources(config: &AggregatorConfig) -> Result<Vec<Arc<dyn ScreeningSource>>> {
    let similarity = config.similarity.build();
    let mut sources: Vec<Arc<dyn ScreeningSource>> = Vec::new();

    for kind in config.sources.enabled() {
        let source = ListSource::new(kind, Arc::clone(&similarity), config.fuzzy_match_threshold);
        match config.lists.path_for(kind) {
            Some(path) => {
                source.load_csv_path(path).with_context(|| {
                    format!("Failed to load {} list from {}", kind, path.display())
                })?;
            }
            None => {
                source.load(sample_entries(kind));
            }
        }
        sources.push(Arc::new(source));
    }

    Ok(sources)
}

/// Built-in demo listings, used when no list file is configured
fn sample_entries(kind: SourceKind) -> Vec<ListEntry> {
    // (id, name, aliases, country, program, level, days since amendment)
    let listings: &[(&str, &str, &[&str], &str, &str, RiskLevel, i64)] = match kind {
        SourceKind::Ofac => &[
            (
                "10001",
                "Bank Melli Iran",
                &["Melli Bank", "BMI"],
                "IR",
                "IRAN",
                RiskLevel::Critical,
                3,
            ),
            (
                "10002",
                "Banco Bandes",
                &["Banco de Desarrollo Economico y Social de Venezuela"],
                "VE",
                "VENEZUELA-EO13850",
                RiskLevel::High,
                3,
            ),
            (
                "10003",
                "Commercial Bank of Syria",
                &["CBS"],
                "SY",
                "SYRIA",
                RiskLevel::Critical,
                3,
            ),
            (
                "10004",
                "Korea Kwangson Banking Corp",
                &["KKBC"],
                "KP",
                "DPRK",
                RiskLevel::Critical,
                3,
            ),
        ],
        SourceKind::Eu => &[
            ("EU.17.42", "VTB Bank", &["Vneshtorgbank"], "RU", "RUSSIA", RiskLevel::High, 12),
            ("EU.17.43", "Commercial Bank of Syria", &[], "SY", "SYRIA", RiskLevel::High, 12),
        ],
        SourceKind::Un => &[(
            "KPe.048",
            "Korea Kwangson Banking Corporation",
            &["KKBC"],
            "KP",
            "DPRK",
            RiskLevel::Critical,
            40,
        )],
        SourceKind::UkHmt => &[
            ("RUS0147", "VTB Bank PJSC", &["VTB"], "RU", "RUSSIA", RiskLevel::High, 5),
            ("IRN0012", "Bank Melli Iran", &[], "IR", "IRAN", RiskLevel::Critical, 5),
        ],
    };

    listings
        .iter()
        .map(|&(id, name, aliases, country, program, level, age_days)| ListEntry {
            id: format!("{}-{}", kind.label(), id),
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            entity_type: EntityType::Entity,
            country: country.to_string(),
            nationality: None,
            date_of_birth: None,
            place_of_birth: None,
            passport_number: None,
            national_id: None,
            address: None,
            title: None,
            remarks: None,
            program: program.to_string(),
            risk_level: level,
            updated_at: Utc::now() - ChronoDuration::days(age_days),
        })
        .collect()
}
