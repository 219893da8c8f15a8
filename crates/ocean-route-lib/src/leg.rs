//! Legs: one sail vector trimmed for its turns, plus the turn flown onto it
//!
//! A leg owns the straight run left over after both adjoining turn arcs have cut
//! into its sail vector, and the arc flown at its origin waypoint. Neighbouring
//! sail vectors are looked up by index in the journey's sail vector array.

use crate::segmenter::{segment_count, segment_with_policy};
use crate::{
    AnchoredTurnArc, CircularString, Result, RouteError, SailMode, SailVector, SegmentationConfig,
    Segmenter, TurnArc,
};
use geo::{LineString, Point};

/// Course changes this close to 180° count as reversals
const REVERSAL_TOLERANCE_DEG: f64 = 1e-9;

/// The straight portion of a leg, between the end of the incoming turn and the
/// start of the outgoing turn
#[derive(Clone, Debug, PartialEq)]
pub struct LegStraight {
    pub mode: SailMode,
    /// Where the incoming turn ends
    pub incoming_point: Point<f64>,
    /// Where the outgoing turn starts
    pub outgoing_point: Point<f64>,
    /// Length of the straight run (NM)
    pub distance: f64,
    /// Bearing of the run at `incoming_point`; constant for rhumb lines
    pub bearing: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl LegStraight {
    /// Trim `sail_vector` by the vector reductions of both turns
    ///
    /// Fails with `InvalidGeometry` at `index` when the turns need more room than the
    /// vector offers.
    pub fn new(
        index: usize,
        sail_vector: &SailVector,
        incoming_arc: &TurnArc,
        outgoing_arc: &TurnArc,
    ) -> Result<Self> {
        let incoming_reduction = incoming_arc.vector_reduction();
        let outgoing_reduction = outgoing_arc.vector_reduction();
        let trimmed = incoming_reduction + outgoing_reduction;

        // tan(90°) is finite in floating point, so a reversal needs its own check
        for (arc, waypoint) in [
            (incoming_arc, &sail_vector.origin_name),
            (outgoing_arc, &sail_vector.destination_name),
        ] {
            if arc.is_turning() && arc.turn_angle().abs() >= 180.0 - REVERSAL_TOLERANCE_DEG {
                return Err(RouteError::InvalidGeometry {
                    index,
                    reason: format!("course reverses at '{waypoint}', no turn arc fits"),
                });
            }
        }

        if !trimmed.is_finite() || trimmed > sail_vector.distance {
            return Err(RouteError::InvalidGeometry {
                index,
                reason: format!(
                    "turn radii too large for the {:.3} NM from '{}' to '{}': \
                     turns need {:.3} NM + {:.3} NM",
                    sail_vector.distance,
                    sail_vector.origin_name,
                    sail_vector.destination_name,
                    incoming_reduction,
                    outgoing_reduction
                ),
            });
        }

        let incoming_point = sail_vector.point_after_origin(incoming_reduction);
        let outgoing_point = sail_vector.point_before_destination(outgoing_reduction);
        let bearing = if sail_vector.rhumb_mode() || incoming_reduction == 0.0 {
            sail_vector.initial_bearing
        } else {
            sail_vector
                .mode
                .initial_bearing(incoming_point, outgoing_point)
                .unwrap_or(sail_vector.initial_bearing)
        };

        Ok(Self {
            mode: sail_vector.mode,
            incoming_point,
            outgoing_point,
            distance: sail_vector.distance - trimmed,
            bearing,
        })
    }

    /// Materialize the run as a line string
    ///
    /// Without a maximum segment length the run is its two endpoints. Otherwise rhumb
    /// runs are stepped along their constant bearing and great-circle runs go through
    /// `segmenter` under the retry policy of `config`. The first and last points are
    /// always exactly `incoming_point` and `outgoing_point`.
    pub fn polyline(
        &self,
        max_segment_nm: Option<f64>,
        segmenter: &dyn Segmenter,
        config: &SegmentationConfig,
    ) -> Result<LineString<f64>> {
        let endpoints = || LineString::from(vec![self.incoming_point, self.outgoing_point]);

        let Some(max_segment_nm) = max_segment_nm else {
            return Ok(endpoints());
        };
        if self.distance <= max_segment_nm {
            return Ok(endpoints());
        }

        // Bounded before either branch so no segmenter sees an oversized count
        let count = segment_count(self.distance, max_segment_nm)?;
        let points = match self.mode {
            SailMode::RhumbLine => self.rhumb_steps(count),
            SailMode::GreatCircle => segment_with_policy(
                segmenter,
                self.incoming_point,
                self.outgoing_point,
                max_segment_nm,
                config,
            )?,
        };
        Ok(LineString::from(points))
    }

    /// Repeated fixed-bearing steps of equal length
    fn rhumb_steps(&self, count: usize) -> Vec<Point<f64>> {
        let step = self.distance / count as f64;

        let mut points = Vec::with_capacity(count.saturating_add(1));
        let mut current = self.incoming_point;
        points.push(current);
        for _ in 1..count {
            current = self.mode.destination(current, step, self.bearing);
            points.push(current);
        }
        points.push(self.outgoing_point);
        points
    }
}

/// One sail vector with its trimmed straight run and the turn flown at its origin
#[derive(Clone, Debug, PartialEq)]
pub struct Leg {
    /// Index of the sail vector (and of its origin waypoint)
    pub index: usize,
    pub mode: SailMode,
    pub origin_name: String,
    pub destination_name: String,
    /// Untrimmed waypoint-to-waypoint distance (NM)
    pub vector_distance: f64,
    pub initial_bearing: f64,
    pub final_bearing: f64,
    /// Turn flown at the origin waypoint, ending where the straight run starts
    pub incoming_arc: AnchoredTurnArc,
    /// Turn at the destination waypoint; only its reduction is applied here
    pub outgoing_arc: TurnArc,
    pub straight: LegStraight,
    /// Straight distance plus the incoming arc length (NM)
    ///
    /// The outgoing arc is counted by the next leg, so summing leg distances counts
    /// every turn once.
    pub leg_distance: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Leg {
    /// Build the leg of `sail_vectors[index]`, using its neighbours for the turns
    pub fn new(sail_vectors: &[SailVector], index: usize) -> Result<Self> {
        let sail_vector = sail_vectors.get(index).ok_or_else(|| {
            RouteError::MalformedInput(format!(
                "leg {index} requested from {} sail vectors",
                sail_vectors.len()
            ))
        })?;
        let previous = index.checked_sub(1).and_then(|i| sail_vectors.get(i));
        let next = sail_vectors.get(index + 1);

        let incoming = TurnArc::new(
            sail_vector.incoming_turn_radius,
            previous.map(|p| p.final_bearing),
            Some(sail_vector.initial_bearing),
        );
        let outgoing = TurnArc::new(
            sail_vector.outgoing_turn_radius,
            Some(sail_vector.final_bearing),
            next.map(|n| n.initial_bearing),
        );

        let straight = LegStraight::new(index, sail_vector, &incoming, &outgoing)?;

        // The turn starts where the previous leg's straight run ends; both are
        // computed by the same call so the points are identical.
        let (arc_start, arc_mode) = match previous {
            Some(p) => (p.point_before_destination(incoming.vector_reduction()), p.mode),
            None => (sail_vector.origin, sail_vector.mode),
        };
        let incoming_arc = incoming.anchor(arc_start, straight.incoming_point, arc_mode);

        Ok(Self {
            index,
            mode: sail_vector.mode,
            origin_name: sail_vector.origin_name.clone(),
            destination_name: sail_vector.destination_name.clone(),
            vector_distance: sail_vector.distance,
            initial_bearing: sail_vector.initial_bearing,
            final_bearing: sail_vector.final_bearing,
            leg_distance: straight.distance + incoming.arc_length(),
            incoming_arc,
            outgoing_arc: outgoing,
            straight,
        })
    }

    /// The incoming turn as a circular string, `None` when no turn is flown
    pub fn circular_string(&self) -> Option<CircularString> {
        self.incoming_arc.to_circular_string()
    }

    /// The straight run as a line string; see [`LegStraight::polyline`]
    pub fn line_string(
        &self,
        max_segment_nm: Option<f64>,
        segmenter: &dyn Segmenter,
        config: &SegmentationConfig,
    ) -> Result<LineString<f64>> {
        self.straight
            .polyline(max_segment_nm, segmenter, config)
            .map_err(|err| match err {
                RouteError::MalformedInput(reason) => RouteError::MalformedInput(format!(
                    "leg {} from '{}' to '{}': {reason}",
                    self.index, self.origin_name, self.destination_name
                )),
                other => other,
            })
    }
}
