//! Sailing primitives: rhumb line and great circle distance, bearing and interpolation
//!
//! Positions are `geo::Point<f64>` with x = longitude and y = latitude, both in degrees.
//! Distances crossing this module's public API are in nautical miles.

use geo::{Bearing, Destination, Distance, Geodesic, InterpolatePoint, Point, Rhumb};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Meters in one international nautical mile
pub const METERS_PER_NAUTICAL_MILE: f64 = 1852.0;

/// Distances at or below this value (NM) are treated as zero
pub const DISTANCE_EPSILON_NM: f64 = 1e-9;

/// Convert meters to nautical miles
#[inline(always)]
pub fn meters_to_nm(meters: f64) -> f64 {
    meters / METERS_PER_NAUTICAL_MILE
}

/// Convert nautical miles to meters
#[inline(always)]
pub fn nm_to_meters(nm: f64) -> f64 {
    nm * METERS_PER_NAUTICAL_MILE
}

/// Normalize a bearing into [0, 360)
#[inline]
pub fn normalize_bearing(degrees: f64) -> f64 {
    let bearing = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if bearing >= 360.0 { 0.0 } else { bearing }
}

/// Normalize a course change into (-180, 180]
///
/// Positive values are clockwise (starboard) turns, negative values are
/// counter-clockwise (port) turns.
#[inline]
pub fn normalize_turn(degrees: f64) -> f64 {
    let turn = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    if turn <= -180.0 { 180.0 } else { turn }
}

/// How a sail vector is sailed
///
/// Chosen per vector by the destination waypoint, so consecutive vectors of one
/// journey may use different solvers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SailMode {
    /// Ellipsoidal (WGS84) geodesic; initial and final bearing generally differ
    #[default]
    GreatCircle,
    /// Spherical loxodrome; constant bearing
    RhumbLine,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl SailMode {
    /// Resolve the sail mode from the route document flag (true = rhumb line)
    pub fn from_rhumb_flag(rhumb: bool) -> Self {
        if rhumb {
            SailMode::RhumbLine
        } else {
            SailMode::GreatCircle
        }
    }

    /// Whether this is rhumb line sailing
    #[inline]
    pub fn is_rhumb(self) -> bool {
        self == SailMode::RhumbLine
    }

    /// Human readable name, as used in journey reports
    pub fn describe(self) -> &'static str {
        match self {
            SailMode::GreatCircle => "great circle",
            SailMode::RhumbLine => "rhumb line",
        }
    }

    /// Distance between two positions in nautical miles
    pub fn distance_nm(self, origin: Point<f64>, destination: Point<f64>) -> f64 {
        let meters = match self {
            SailMode::GreatCircle => Geodesic.distance(origin, destination),
            SailMode::RhumbLine => Rhumb.distance(origin, destination),
        };
        meters_to_nm(meters)
    }

    /// Bearing at `origin` towards `destination`, in [0, 360)
    ///
    /// Returns `None` for coincident positions, where the bearing is undefined.
    pub fn initial_bearing(self, origin: Point<f64>, destination: Point<f64>) -> Option<f64> {
        if self.is_degenerate(origin, destination) {
            return None;
        }
        let bearing = match self {
            SailMode::GreatCircle => Geodesic.bearing(origin, destination),
            SailMode::RhumbLine => Rhumb.bearing(origin, destination),
        };
        Some(normalize_bearing(bearing))
    }

    /// Bearing on arrival at `destination`, in [0, 360)
    ///
    /// For rhumb lines this is the initial bearing. For great circles it is the
    /// reverse azimuth of the geodesic.
    pub fn final_bearing(self, origin: Point<f64>, destination: Point<f64>) -> Option<f64> {
        match self {
            SailMode::RhumbLine => self.initial_bearing(origin, destination),
            SailMode::GreatCircle => self
                .initial_bearing(destination, origin)
                .map(|reverse| normalize_bearing(reverse + 180.0)),
        }
    }

    /// Position reached by sailing `distance_nm` from `origin` along `bearing`
    pub fn destination(self, origin: Point<f64>, distance_nm: f64, bearing: f64) -> Point<f64> {
        let meters = nm_to_meters(distance_nm);
        match self {
            SailMode::GreatCircle => Geodesic.destination(origin, bearing, meters),
            SailMode::RhumbLine => Rhumb.destination(origin, bearing, meters),
        }
    }

    /// Position at `fraction` of the way from `origin` to `destination`
    ///
    /// Fractions at or below 0 return `origin` exactly, at or above 1 return
    /// `destination` exactly, so adjoining pieces share bit-identical endpoints.
    pub fn intermediate(self, origin: Point<f64>, destination: Point<f64>, fraction: f64) -> Point<f64> {
        if fraction <= 0.0 {
            return origin;
        }
        if fraction >= 1.0 {
            return destination;
        }
        match self {
            SailMode::GreatCircle => Geodesic.point_at_ratio_between(origin, destination, fraction),
            SailMode::RhumbLine => Rhumb.point_at_ratio_between(origin, destination, fraction),
        }
    }

    #[inline]
    fn is_degenerate(self, origin: Point<f64>, destination: Point<f64>) -> bool {
        origin == destination || self.distance_nm(origin, destination) <= DISTANCE_EPSILON_NM
    }
}
