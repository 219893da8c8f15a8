//! Ocean Route command line
//!
//! Reads a route document, builds the sailed journey and prints it. All geometry
//! lives in `ocean-route-lib`; this binary only maps flags to configuration.

mod report;
mod settings;

use clap::Parser;
use ocean_route_lib::{Journey, RouteModel};
use report::CliError;
use settings::Settings;
use std::process::ExitCode;

/// Install the fmt subscriber, honouring `RUST_LOG` and defaulting to `info`
fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(settings: &Settings) -> Result<String, CliError> {
    let route = RouteModel::load(&settings.file, &settings.import_defaults())?;
    tracing::info!(
        "Loaded route '{}' with {} waypoints from {}",
        route.name,
        route.waypoints.len(),
        settings.file.display()
    );

    let journey = Journey::from_route(&route, settings.config())?;
    tracing::info!(
        "Journey has {} legs, {:.2} NM",
        journey.leg_count(),
        journey.total_distance()
    );

    report::render(&journey, settings.format)
}

fn main() -> ExitCode {
    let settings = Settings::parse();
    setup_logging();
    tracing::info!("ocean-route {}", env!("CARGO_PKG_VERSION"));

    match run(&settings) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
