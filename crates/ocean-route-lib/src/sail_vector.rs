//! Directed path between two consecutive waypoints

use crate::geodesy::meters_to_nm;
use crate::{Result, RouteError, SailMode, Waypoint};
use geo::Point;

/// One waypoint pair sailed with one solver
///
/// All derived values (distance, bearings) are computed once at construction; a
/// sail vector is immutable afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct SailVector {
    /// Solver, taken from the destination waypoint
    pub mode: SailMode,
    pub origin_name: String,
    pub destination_name: String,
    /// Turn radius at the origin waypoint (NM)
    pub incoming_turn_radius: f64,
    /// Turn radius at the destination waypoint (NM)
    pub outgoing_turn_radius: f64,
    pub origin: Point<f64>,
    pub destination: Point<f64>,
    /// Distance from origin to destination (NM)
    pub distance: f64,
    /// Bearing on departure, in [0, 360)
    pub initial_bearing: f64,
    /// Bearing on arrival, in [0, 360); equal to `initial_bearing` for rhumb lines
    pub final_bearing: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl SailVector {
    /// Build the vector from `origin` to `destination`
    ///
    /// `index` is the index of the origin waypoint (and so of the resulting leg)
    /// and is reported in errors. Both waypoints are expected to be validated.
    pub fn from_waypoints(index: usize, origin: &Waypoint, destination: &Waypoint) -> Result<Self> {
        let mode = destination.sail_mode;
        let origin_position = origin.position();
        let destination_position = destination.position();

        let degenerate = || RouteError::DegenerateVector {
            index,
            origin: origin.name.clone(),
            destination: destination.name.clone(),
        };

        let initial_bearing = mode
            .initial_bearing(origin_position, destination_position)
            .ok_or_else(degenerate)?;
        let final_bearing = mode
            .final_bearing(origin_position, destination_position)
            .ok_or_else(degenerate)?;

        Ok(Self {
            mode,
            origin_name: origin.name.clone(),
            destination_name: destination.name.clone(),
            incoming_turn_radius: meters_to_nm(origin.turn_radius_m),
            outgoing_turn_radius: meters_to_nm(destination.turn_radius_m),
            origin: origin_position,
            destination: destination_position,
            distance: mode.distance_nm(origin_position, destination_position),
            initial_bearing,
            final_bearing,
        })
    }

    /// Whether this vector is sailed as a rhumb line
    #[inline]
    pub fn rhumb_mode(&self) -> bool {
        self.mode.is_rhumb()
    }

    /// Position at `fraction` of the way along this vector
    #[inline]
    pub fn intermediate(&self, fraction: f64) -> Point<f64> {
        self.mode.intermediate(self.origin, self.destination, fraction)
    }

    /// Position `distance_nm` before the destination
    #[inline]
    pub fn point_before_destination(&self, distance_nm: f64) -> Point<f64> {
        self.intermediate(1.0 - distance_nm / self.distance)
    }

    /// Position `distance_nm` after the origin
    #[inline]
    pub fn point_after_origin(&self, distance_nm: f64) -> Point<f64> {
        self.intermediate(distance_nm / self.distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waypoint(name: &str, lat: f64, lon: f64, mode: SailMode, radius_m: f64) -> Waypoint {
        Waypoint::new(name, lat, lon, mode, radius_m)
    }

    #[test]
    fn test_mode_and_radii_come_from_endpoints() {
        let a = waypoint("A", 0.0, 0.0, SailMode::GreatCircle, 1852.0);
        let b = waypoint("B", 0.0, 1.0, SailMode::RhumbLine, 3704.0);

        let sv = SailVector::from_waypoints(0, &a, &b).unwrap();
        assert_eq!(sv.mode, SailMode::RhumbLine);
        assert!(sv.rhumb_mode());
        assert_eq!(sv.origin_name, "A");
        assert_eq!(sv.destination_name, "B");
        assert!((sv.incoming_turn_radius - 1.0).abs() < 1e-12);
        assert!((sv.outgoing_turn_radius - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rhumb_vector_has_constant_bearing() {
        let a = waypoint("A", 48.0, -5.0, SailMode::RhumbLine, 0.0);
        let b = waypoint("B", 40.0, -20.0, SailMode::RhumbLine, 0.0);
        let sv = SailVector::from_waypoints(0, &a, &b).unwrap();
        assert_eq!(sv.initial_bearing, sv.final_bearing);
        assert!(sv.initial_bearing >= 0.0 && sv.initial_bearing < 360.0);
    }

    #[test]
    fn test_great_circle_vector_distance_is_symmetric() {
        let a = waypoint("A", 56.16, 10.22, SailMode::GreatCircle, 0.0);
        let b = waypoint("B", 59.90, 10.75, SailMode::GreatCircle, 0.0);
        let ab = SailVector::from_waypoints(0, &a, &b).unwrap();
        let ba = SailVector::from_waypoints(0, &b, &a).unwrap();
        assert!((ab.distance - ba.distance).abs() < 1e-9);

        let diff = crate::geodesy::normalize_turn(ab.initial_bearing - ba.final_bearing).abs();
        assert!((diff - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_coincident_waypoints_are_degenerate() {
        let a = waypoint("A", 10.0, 10.0, SailMode::GreatCircle, 0.0);
        let b = waypoint("B", 10.0, 10.0, SailMode::GreatCircle, 0.0);
        match SailVector::from_waypoints(4, &a, &b) {
            Err(RouteError::DegenerateVector {
                index,
                origin,
                destination,
            }) => {
                assert_eq!(index, 4);
                assert_eq!(origin, "A");
                assert_eq!(destination, "B");
            }
            other => panic!("expected degenerate vector, got {other:?}"),
        }
    }

    #[test]
    fn test_trimmed_points() {
        let a = waypoint("A", 0.0, 0.0, SailMode::RhumbLine, 0.0);
        let b = waypoint("B", 0.0, 1.0, SailMode::RhumbLine, 0.0);
        let sv = SailVector::from_waypoints(0, &a, &b).unwrap();

        assert_eq!(sv.point_after_origin(0.0), sv.origin);
        assert_eq!(sv.point_before_destination(0.0), sv.destination);

        let after = sv.point_after_origin(5.0);
        assert!((sv.mode.distance_nm(sv.origin, after) - 5.0).abs() < 1e-6);
        let before = sv.point_before_destination(5.0);
        assert!((sv.mode.distance_nm(before, sv.destination) - 5.0).abs() < 1e-6);
    }
}
