use checkout_flow::config::PageConfig;
use checkout_flow::interfaces::csv::script_reader::ScriptReader;
use checkout_flow::interfaces::csv::view_writer::ViewLogWriter;
use checkout_flow::interfaces::fixtures::Fixtures;
use checkout_flow::interfaces::replay::Replay;
use checkout_flow::telemetry;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Session script CSV (`event,value` rows)
    script: PathBuf,

    /// Page configuration JSON (publishable key, stream URL, CSRF token, ...)
    #[arg(long)]
    page: Option<PathBuf>,

    /// Canned coupon and processor replies JSON
    #[arg(long)]
    fixtures: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let config = match cli.page {
        Some(path) => PageConfig::load(path).into_diagnostic()?,
        None => PageConfig::default(),
    };
    let fixtures = match cli.fixtures {
        Some(path) => Fixtures::load(path).into_diagnostic()?,
        None => Fixtures::default(),
    };

    let mut replay = Replay::mount(&config, &fixtures).await.into_diagnostic()?;

    // Replay the session
    let file = File::open(cli.script).into_diagnostic()?;
    let reader = ScriptReader::new(file);
    for step_result in reader.steps() {
        match step_result {
            Ok(step) => {
                if let Err(e) = replay.apply(step).await {
                    warn!("Error applying step: {}", e);
                }
            }
            Err(e) => {
                warn!("Error reading step: {}", e);
            }
        }
    }

    let events = replay.finish().await.into_diagnostic()?;

    // Output the view log
    let stdout = io::stdout();
    let mut writer = ViewLogWriter::new(stdout.lock());
    writer.write_events(&events).into_diagnostic()?;

    Ok(())
}
