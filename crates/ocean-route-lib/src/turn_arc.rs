//! Turn arcs: the circular path flown while changing course at a waypoint
//!
//! A turn arc is built in two phases. [`TurnArc`] holds the radius and the two
//! bearings and derives every scalar (turn angle, arc length, vector reduction).
//! Once the adjoining straight runs are trimmed, [`TurnArc::anchor`] fixes the arc
//! to its start and end positions and yields an immutable [`AnchoredTurnArc`].

use crate::geodesy::{normalize_bearing, normalize_turn};
use crate::{CircularString, SailMode};
use geo::Point;

/// Radius, incoming bearing and outgoing bearing of one turn
///
/// A missing bearing marks the first or last turn of a journey, where no arc is flown.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct TurnArc {
    /// Turn radius (NM)
    pub turn_radius: f64,
    /// Final bearing of the vector ending at the turn
    pub incoming_bearing: Option<f64>,
    /// Initial bearing of the vector starting at the turn
    pub outgoing_bearing: Option<f64>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TurnArc {
    /// Create a turn arc
    ///
    /// `turn_radius` is in nautical miles and must be finite and non-negative;
    /// waypoint validation guarantees this for journeys.
    pub fn new(turn_radius: f64, incoming_bearing: Option<f64>, outgoing_bearing: Option<f64>) -> Self {
        debug_assert!(turn_radius.is_finite() && turn_radius >= 0.0);
        Self {
            turn_radius,
            incoming_bearing,
            outgoing_bearing,
        }
    }

    /// The "no turn" arc used at both ends of a journey
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether an arc is actually flown (both bearings known, radius and angle non-zero)
    #[inline]
    pub fn is_turning(&self) -> bool {
        self.turn_radius > 0.0 && self.turn_angle() != 0.0
    }

    /// Signed course change in (-180, 180]; positive is a clockwise turn
    ///
    /// Zero when either bearing is missing.
    pub fn turn_angle(&self) -> f64 {
        match (self.incoming_bearing, self.outgoing_bearing) {
            (Some(incoming), Some(outgoing)) => normalize_turn(outgoing - incoming),
            _ => 0.0,
        }
    }

    /// Length of the arc (NM)
    pub fn arc_length(&self) -> f64 {
        if !self.is_turning() {
            return 0.0;
        }
        2.0 * std::f64::consts::PI * self.turn_radius * self.turn_angle().abs() / 360.0
    }

    /// Distance the turn trims from each adjoining straight run (NM)
    ///
    /// The tangent length `r * tan(|turn| / 2)`; unbounded for a 180° turn.
    pub fn vector_reduction(&self) -> f64 {
        if !self.is_turning() {
            return 0.0;
        }
        self.turn_radius * (self.turn_angle().abs() / 2.0).to_radians().tan()
    }

    /// Fix the arc to the positions where the turn starts and ends
    ///
    /// `mode` is the solver used to construct the rotation center and the mid-arc
    /// point from `incoming_point`.
    pub fn anchor(
        self,
        incoming_point: Point<f64>,
        outgoing_point: Point<f64>,
        mode: SailMode,
    ) -> AnchoredTurnArc {
        let mid_arc_point = match (self.is_turning(), self.incoming_bearing) {
            (true, Some(incoming_bearing)) => Some(mid_arc_point(
                incoming_point,
                incoming_bearing,
                self.turn_angle(),
                self.turn_radius,
                mode,
            )),
            _ => None,
        };

        AnchoredTurnArc {
            arc: self,
            incoming_point,
            mid_arc_point,
            outgoing_point,
        }
    }
}

/// Step to the rotation center, then from the center onto the middle of the arc
fn mid_arc_point(
    incoming_point: Point<f64>,
    incoming_bearing: f64,
    turn_angle: f64,
    turn_radius: f64,
    mode: SailMode,
) -> Point<f64> {
    let to_center = if turn_angle > 0.0 {
        normalize_bearing(incoming_bearing + 90.0)
    } else {
        normalize_bearing(incoming_bearing + 270.0)
    };
    let center_to_mid = normalize_bearing(to_center + 180.0 + turn_angle / 2.0);

    let center = mode.destination(incoming_point, turn_radius, to_center);
    mode.destination(center, turn_radius, center_to_mid)
}

/// A turn arc fixed to its start, middle and end positions
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchoredTurnArc {
    arc: TurnArc,
    incoming_point: Point<f64>,
    mid_arc_point: Option<Point<f64>>,
    outgoing_point: Point<f64>,
}

impl AnchoredTurnArc {
    /// The radius and bearings this arc was built from
    #[inline]
    pub fn arc(&self) -> &TurnArc {
        &self.arc
    }

    /// Where the turn starts
    #[inline]
    pub fn incoming_point(&self) -> Point<f64> {
        self.incoming_point
    }

    /// Where the turn ends
    #[inline]
    pub fn outgoing_point(&self) -> Point<f64> {
        self.outgoing_point
    }

    /// A point halfway along the arc, `None` when no arc is flown
    #[inline]
    pub fn mid_arc_point(&self) -> Option<Point<f64>> {
        self.mid_arc_point
    }

    #[inline]
    pub fn arc_length(&self) -> f64 {
        self.arc.arc_length()
    }

    #[inline]
    pub fn turn_angle(&self) -> f64 {
        self.arc.turn_angle()
    }

    /// The arc as a three-point circular string, `None` when no arc is flown
    pub fn to_circular_string(&self) -> Option<CircularString> {
        self.mid_arc_point.map(|mid| {
            CircularString::new(self.incoming_point.0, mid.0, self.outgoing_point.0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BEARINGS: [f64; 9] = [0.0, 10.0, 45.0, 90.0, 135.5, 200.0, 271.0, 350.0, 359.9];

    #[test]
    fn test_turn_angle_wraps_short_way() {
        let arc = TurnArc::new(1.0, Some(10.0), Some(350.0));
        assert!((arc.turn_angle() - -20.0).abs() < 1e-9);

        let arc = TurnArc::new(1.0, Some(350.0), Some(10.0));
        assert!((arc.turn_angle() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_turn_angle_range() {
        for &b1 in &BEARINGS {
            for &b2 in &BEARINGS {
                let angle = TurnArc::new(1.0, Some(b1), Some(b2)).turn_angle();
                assert!(angle > -180.0 && angle <= 180.0, "{b1} -> {b2}: {angle}");
            }
        }
    }

    #[test]
    fn test_reduction_and_length_are_symmetric() {
        for &b1 in &BEARINGS {
            for &b2 in &BEARINGS {
                let forward = TurnArc::new(2.5, Some(b1), Some(b2));
                let backward = TurnArc::new(2.5, Some(b2), Some(b1));
                assert!((forward.arc_length() - backward.arc_length()).abs() < 1e-9);
                assert!((forward.vector_reduction() - backward.vector_reduction()).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_right_angle_turn() {
        let arc = TurnArc::new(5.0, Some(90.0), Some(0.0));
        assert!((arc.turn_angle() - -90.0).abs() < 1e-9);
        // Quarter circle
        assert!((arc.arc_length() - 2.0 * std::f64::consts::PI * 5.0 / 4.0).abs() < 1e-9);
        // tan(45°) = 1
        assert!((arc.vector_reduction() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_arc_at_journey_ends_or_zero_radius() {
        for arc in [
            TurnArc::none(),
            TurnArc::new(3.0, None, Some(45.0)),
            TurnArc::new(3.0, Some(45.0), None),
            TurnArc::new(0.0, Some(0.0), Some(90.0)),
            TurnArc::new(3.0, Some(45.0), Some(45.0)),
        ] {
            assert!(!arc.is_turning());
            assert_eq!(arc.arc_length(), 0.0);
            assert_eq!(arc.vector_reduction(), 0.0);
        }
    }

    #[test]
    fn test_anchor_without_turn_has_no_circular_string() {
        let p = Point::new(1.0, 0.0);
        let anchored = TurnArc::none().anchor(p, p, SailMode::RhumbLine);
        assert!(anchored.mid_arc_point().is_none());
        assert!(anchored.to_circular_string().is_none());
        assert_eq!(anchored.arc_length(), 0.0);
    }

    #[test]
    fn test_mid_arc_point_port_turn() {
        // Sailing east along the equator, turning north at (0°N, 1°E) with a 5 NM radius
        let mode = SailMode::RhumbLine;
        let corner = Point::new(1.0, 0.0);
        let arc = TurnArc::new(5.0, Some(90.0), Some(0.0));
        let reduction = arc.vector_reduction();

        let incoming = mode.destination(corner, reduction, 270.0);
        let outgoing = mode.destination(corner, reduction, 0.0);
        let anchored = arc.anchor(incoming, outgoing, mode);
        let mid = anchored.mid_arc_point().unwrap();

        // Inside the corner
        assert!(mid.y() > 0.0);
        assert!(mid.x() < 1.0);

        // Distance from the corner to the arc: r * (1 / cos(45°) - 1)
        let expected = 5.0 * (std::f64::consts::SQRT_2 - 1.0);
        assert!((mode.distance_nm(corner, mid) - expected).abs() < 0.01);

        // The mid point is equidistant from both tangent points
        let d_in = mode.distance_nm(incoming, mid);
        let d_out = mode.distance_nm(outgoing, mid);
        assert!((d_in - d_out).abs() < 0.01);
    }

    #[test]
    fn test_mid_arc_point_starboard_turn() {
        // Sailing north, turning east: clockwise, centre to the east
        let mode = SailMode::GreatCircle;
        let corner = Point::new(0.0, 1.0);
        let arc = TurnArc::new(2.0, Some(0.0), Some(90.0));
        assert!(arc.turn_angle() > 0.0);

        let reduction = arc.vector_reduction();
        let incoming = mode.destination(corner, reduction, 180.0);
        let outgoing = mode.destination(corner, reduction, 90.0);
        let mid = arc.anchor(incoming, outgoing, mode).mid_arc_point().unwrap();

        assert!(mid.x() > 0.0);
        assert!(mid.y() < 1.0);
        let expected = 2.0 * (std::f64::consts::SQRT_2 - 1.0);
        assert!((mode.distance_nm(corner, mid) - expected).abs() < 0.01);
    }

    #[test]
    fn test_circular_string_points() {
        let mode = SailMode::RhumbLine;
        let corner = Point::new(1.0, 0.0);
        let arc = TurnArc::new(5.0, Some(90.0), Some(0.0));
        let incoming = mode.destination(corner, 5.0, 270.0);
        let outgoing = mode.destination(corner, 5.0, 0.0);

        let cs = arc
            .anchor(incoming, outgoing, mode)
            .to_circular_string()
            .unwrap();
        assert_eq!(cs.start(), incoming.0);
        assert_eq!(cs.end(), outgoing.0);
    }
}
