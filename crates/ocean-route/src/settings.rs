use clap::{Parser, ValueEnum};
use ocean_route_lib::{Config, FailurePolicy, ImportDefaults, SailMode, SegmentationConfig};
use std::path::PathBuf;
use std::time::Duration;

/// How the journey is printed
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One line per leg, totals and the compound curve
    #[default]
    Text,
    /// Only the compound curve
    Wkt,
    /// Name, totals, legs and curve as JSON
    Json,
}

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Ocean Route - computes sailed journey distances and compound curves from vessel route documents
pub struct Settings {
    /// Route document to read (route-exchange XML, or GPX with a .gpx extension)
    #[clap(short, long, value_name = "FILE")]
    pub file: PathBuf,

    /// Output format
    #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Split straight runs into chords no longer than this many nautical miles
    #[clap(long, value_name = "NM")]
    pub max_segment_nm: Option<f64>,

    /// Turn radius in meters for waypoints of documents without one (GPX)
    #[clap(long, default_value = "0.0", value_name = "METERS")]
    pub default_turn_radius_m: f64,

    /// Sail rhumb lines instead of great circles for documents without a sail mode (GPX)
    #[clap(long, default_value = "false")]
    pub default_rhumb: bool,

    /// Fail when the document has fewer than two waypoints
    #[clap(long, default_value = "false")]
    pub require_legs: bool,

    /// Attempts per great-circle run when segmenting
    #[clap(long, default_value = "3")]
    pub segment_attempts: u32,

    /// Total segmentation time budget per great-circle run, in milliseconds
    #[clap(long, default_value = "5000", value_name = "MS")]
    pub segment_timeout_ms: u64,

    /// Fail instead of falling back to straight runs when segmentation fails
    #[clap(long, default_value = "false")]
    pub propagate_segment_errors: bool,
}

impl Settings {
    /// Journey configuration described by the flags
    pub fn config(&self) -> Config {
        let failure_policy = if self.propagate_segment_errors {
            FailurePolicy::Propagate
        } else {
            FailurePolicy::Degrade
        };
        Config {
            max_segment_length_nm: self.max_segment_nm,
            require_legs: self.require_legs,
            segmentation: SegmentationConfig {
                max_attempts: self.segment_attempts,
                timeout: Duration::from_millis(self.segment_timeout_ms),
                failure_policy,
                ..SegmentationConfig::default()
            },
        }
    }

    /// Import defaults described by the flags
    pub fn import_defaults(&self) -> ImportDefaults {
        ImportDefaults {
            turn_radius_m: self.default_turn_radius_m,
            sail_mode: SailMode::from_rhumb_flag(self.default_rhumb),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library_defaults() {
        let settings = Settings::parse_from(["ocean-route", "--file", "route.xml"]);
        assert_eq!(settings.format, OutputFormat::Text);
        assert_eq!(settings.config(), Config::default());

        let defaults = settings.import_defaults();
        assert_eq!(defaults.turn_radius_m, 0.0);
        assert_eq!(defaults.sail_mode, SailMode::GreatCircle);
    }

    #[test]
    fn test_flags_map_to_config() {
        let settings = Settings::parse_from([
            "ocean-route",
            "--file",
            "route.gpx",
            "--format",
            "json",
            "--max-segment-nm",
            "25",
            "--default-turn-radius-m",
            "370.4",
            "--default-rhumb",
            "--require-legs",
            "--segment-attempts",
            "5",
            "--segment-timeout-ms",
            "250",
            "--propagate-segment-errors",
        ]);
        assert_eq!(settings.format, OutputFormat::Json);

        let config = settings.config();
        assert_eq!(config.max_segment_length_nm, Some(25.0));
        assert!(config.require_legs);
        assert_eq!(config.segmentation.max_attempts, 5);
        assert_eq!(config.segmentation.timeout, Duration::from_millis(250));
        assert_eq!(config.segmentation.failure_policy, FailurePolicy::Propagate);

        let defaults = settings.import_defaults();
        assert_eq!(defaults.turn_radius_m, 370.4);
        assert_eq!(defaults.sail_mode, SailMode::RhumbLine);
    }
}
