//! Rendering a journey in the requested output format

use crate::settings::OutputFormat;
use ocean_route_lib::{Journey, JourneyInfo, LegSummary};
use serde::Serialize;

/// Errors while producing output
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Route(#[from] ocean_route_lib::RouteError),

    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything the JSON output contains
#[derive(Serialize)]
struct JsonReport<'a> {
    name: &'a str,
    info: JourneyInfo,
    legs: Vec<LegSummary>,
    curve: String,
}

/// Render `journey` as `format`
pub fn render(journey: &Journey, format: OutputFormat) -> Result<String, CliError> {
    let curve = journey.to_text()?;

    let output = match format {
        OutputFormat::Wkt => curve,
        OutputFormat::Json => serde_json::to_string_pretty(&JsonReport {
            name: journey.name(),
            info: journey.info(),
            legs: journey.summaries(),
            curve,
        })?,
        OutputFormat::Text => {
            let info = journey.info();
            format!(
                "{journey}Total: {:.2} NM over {} legs ({:.2} NM between waypoints, {:.2} NM turning)\n{curve}",
                info.total_distance_nm,
                info.leg_count,
                info.vector_distance_nm,
                info.total_arc_length_nm,
            )
        }
    };
    Ok(output)
}
