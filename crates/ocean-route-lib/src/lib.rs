//! Ocean Route Library - Sailed Journey Geometry
//!
//! This library turns an ordered list of navigation waypoints into a sailed journey whose
//! distance accounts for the turning radius of the vessel at every waypoint, and renders the
//! journey as a compound curve (straight runs joined by circular turn arcs) in a textual
//! exchange format.
//!
//! # Architecture
//!
//! - **[`SailMode`]**: Rhumb line or great circle sailing primitives (distance, bearings,
//!   destination, intermediate points)
//! - **[`SailVector`]**: One waypoint pair sailed with one [`SailMode`]
//! - **[`TurnArc`]**: The circular path flown while changing course at a waypoint
//! - **[`LegStraight`]** / **[`Leg`]**: Trimmed straight run plus its incoming turn arc
//! - **[`Journey`]**: All legs of a route, summaries and the compound curve
//! - **[`CurveGeometry`]**: Point / LineString / CircularString / CompoundCurve model with a
//!   recursive parser and serializer
//!
//! # Data Flow
//!
//! waypoints → sail vectors (pairwise) → legs (previous, current, next window) → journey →
//! compound curve → text. Both pairwise passes are parallelized with rayon.

pub mod curve;
pub mod geodesy;
mod journey;
mod leg;
mod route;
mod route_xml;
mod sail_vector;
pub mod segmenter;
mod turn_arc;

// Public API exports
pub use curve::{CircularString, CompoundCurve, CurveGeometry, CurveSegment};
pub use geodesy::SailMode;
pub use journey::{Config, Journey, JourneyInfo, LegSummary};
pub use leg::{Leg, LegStraight};
pub use route::{ImportDefaults, RouteModel, Waypoint};
pub use sail_vector::SailVector;
pub use segmenter::{FailurePolicy, GeodesicSegmenter, SegmentationConfig, Segmenter};
pub use turn_arc::{AnchoredTurnArc, TurnArc};

/// Error types for the route library
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid geometry at index {index}: {reason}")]
    InvalidGeometry { index: usize, reason: String },

    #[error("Degenerate sail vector at index {index}: '{origin}' and '{destination}' share a position")]
    DegenerateVector {
        index: usize,
        origin: String,
        destination: String,
    },

    #[error("Unsupported geometry tag: '{tag}'")]
    UnsupportedGeometryTag { tag: String },

    #[error("Malformed geometry text near '{fragment}': {reason}")]
    MalformedGeometryText { fragment: String, reason: String },

    #[error("Segmentation failed: {0}")]
    Segmentation(String),

    #[error("Segmentation timed out after {attempts} attempt(s) ({timeout:?} budget)")]
    SegmentationTimeout {
        attempts: u32,
        timeout: std::time::Duration,
    },

    #[error("Route document error: {0}")]
    RouteDocument(String),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RouteError>;
