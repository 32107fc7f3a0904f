use clap::Parser;
use dining_nutrition::config::Command;
use dining_nutrition::utils::error::ErrorSeverity;
use dining_nutrition::utils::{logger, validation::Validate};
use dining_nutrition::{
    CliConfig, Exporter, LocalStorage, NoDataReason, NutritionConfig, NutritionError,
    NutritionService, VenueOutcome,
};
use std::time::Duration;

fn load_config(path: Option<&str>) -> dining_nutrition::Result<NutritionConfig> {
    let config = match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            NutritionConfig::from_file(path)?
        }
        None => NutritionConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

async fn run(cli: CliConfig) -> dining_nutrition::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let service = NutritionService::from_config(&config)?;

    match cli.command {
        Command::Locations => {
            for venue in service.all_locations() {
                println!(
                    "{:<24} {:<28} {}",
                    venue.key,
                    venue.display_name,
                    if venue.is_open { "open" } else { "closed" }
                );
            }
        }
        Command::Scrape { venue, expected } => {
            let report = service.by_location_expecting(&venue, &expected).await?;
            if report.has_estimates() {
                tracing::warn!("{}: values are estimates, not menu data", report.venue);
            }
            println!("{}", serde_json::to_string_pretty(&report)?);

            if let Some(NoDataReason::UpstreamUnavailable(detail)) = &report.no_data {
                if report.records.is_empty() {
                    return Err(NutritionError::UpstreamUnavailable {
                        venue: report.venue.clone(),
                        detail: detail.clone(),
                    });
                }
            }
        }
        Command::Search { query, venue } => {
            let report = service.search(&query, venue.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::ScrapeAll {
            deadline_secs,
            output,
            format,
        } => {
            let deadline =
                deadline_secs.map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs));
            let batch = service.scrape_all(deadline).await;

            for (venue, outcome) in &batch.venues {
                match outcome {
                    VenueOutcome::Failed { error, attempts } => {
                        tracing::warn!("{}: failed after {} attempts: {}", venue, attempts, error)
                    }
                    other => tracing::info!(
                        "{}: {} ({} records)",
                        venue,
                        other.status_label(),
                        other.records().len()
                    ),
                }
            }

            let exporter = Exporter::new(LocalStorage::new(output.clone()));
            let path = exporter.write_batch(&batch, format).await?;
            println!("Output saved to: {}/{}", output, path);
        }
    }

    Ok(())
}

fn exit_code(error: &NutritionError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low => 4,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(cli).await {
        tracing::error!(
            "Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("{}", e.user_friendly_message());
        eprintln!("Suggestion: {}", e.recovery_suggestion());
        std::process::exit(exit_code(&e));
    }

    Ok(())
}
