use anyhow::Result;
use climesense_analysis::{parse_month, AnalysisError, AnalysisSummary, DefaultAnalyzer};
use climesense_core::{AppError, Config, SweepConfig};
use serde::Serialize;
use std::sync::Arc;

const USAGE: &str = "\
Usage:
  climesense                                   show configuration and source status
  climesense conditions                        list conditions and event types
  climesense health                            probe both weather sources
  climesense query <place> <month> <day|-> <condition> [event_type]
  climesense summary <place> <month> <day|-> <condition> [event_type]
  climesense sweep <place> <month> <condition> [step] [range]";

#[tokio::main]
async fn main() -> Result<()> {
    climesense_core::init()?;

    let (config, _validation) = Config::load_validated()?;
    let analyzer = Arc::new(DefaultAnalyzer::from_config(&config).map_err(AppError::from)?);
    tracing::info!("ClimeSense started");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = match args.first().map(String::as_str) {
        None => {
            println!("Config directory: {}", config.config_dir.display());
            print_json(&analyzer.fetcher().source_status())
        }
        Some("conditions") => print_json(&climesense_extremes::catalog()),
        Some("health") => print_json(&analyzer.fetcher().test_sources().await),
        Some(cmd @ ("query" | "summary")) => query(&analyzer, cmd == "summary", &args[1..]).await,
        Some("sweep") => sweep(analyzer, &config.sweep, &args[1..]).await,
        Some(_) => {
            eprintln!("{}", USAGE);
            Ok(())
        }
    };

    if let Err(err) = outcome {
        tracing::error!("{}", err);
        eprintln!("{}", err.user_message());
        std::process::exit(1);
    }
    Ok(())
}

fn usage_error() -> AppError {
    AnalysisError::InvalidRequest(USAGE.to_string()).into()
}

async fn query(
    analyzer: &DefaultAnalyzer,
    summarize: bool,
    args: &[String],
) -> Result<(), AppError> {
    let [place, month, day, condition, rest @ ..] = args else {
        return Err(usage_error());
    };
    let month = parse_month(month)?;
    let day = match day.as_str() {
        "-" => None,
        d => Some(
            d.parse::<u32>()
                .map_err(|_| AnalysisError::InvalidRequest("invalid day format".to_string()))?,
        ),
    };
    let event_type = rest.first().map(String::as_str);

    let analysis = analyzer
        .analyze_place(place, month, day, condition, event_type)
        .await?;
    if summarize {
        print_json(&AnalysisSummary::from_analysis(&analysis, chrono::Utc::now()))
    } else {
        print_json(&analysis)
    }
}

async fn sweep(
    analyzer: Arc<DefaultAnalyzer>,
    defaults: &SweepConfig,
    args: &[String],
) -> Result<(), AppError> {
    let [place, month, condition, rest @ ..] = args else {
        return Err(usage_error());
    };
    let month = parse_month(month)?;
    let number = |i: usize, default: f64| -> Result<f64, AnalysisError> {
        rest.get(i).map_or(Ok(default), |raw| {
            raw.parse()
                .map_err(|_| AnalysisError::InvalidRequest(format!("not a number: {}", raw)))
        })
    };
    let step = number(0, defaults.default_step)?;
    let range = number(1, defaults.default_range)?;

    let report = analyzer
        .sweep_place(place, month, condition, step, range)
        .await?;
    print_json(&report)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value).map_err(anyhow::Error::from)?;
    println!("{}", json);
    Ok(())
}
