//! Journey - Top-level sailed route built from a waypoint list
//!
//! This module provides the high-level API: build sail vectors and legs from
//! waypoints, report per-leg and total distances, and assemble the journey's
//! compound curve.

use crate::{
    CompoundCurve, CurveGeometry, CurveSegment, GeodesicSegmenter, Leg, Result, RouteError,
    RouteModel, SailMode, SailVector, SegmentationConfig, Segmenter, Waypoint,
};

use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Configuration for journey construction and curve assembly
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Longest chord (NM) emitted when straight runs are materialized.
    /// `None` keeps every straight run as its two endpoints.
    /// Default: None
    pub max_segment_length_nm: Option<f64>,
    /// Fail with `MalformedInput` when there are fewer than two waypoints,
    /// instead of producing an empty journey.
    /// Default: false
    pub require_legs: bool,
    /// Retry and fallback behaviour of great-circle segmentation
    pub segmentation: SegmentationConfig,
}

impl Config {
    fn validate(&self) -> Result<()> {
        match self.max_segment_length_nm {
            Some(max) if !max.is_finite() || max <= 0.0 => {
                return Err(RouteError::MalformedInput(format!(
                    "maximum segment length must be a positive number of NM, got {max}"
                )));
            }
            _ => {}
        }
        if self.segmentation.max_attempts == 0 {
            return Err(RouteError::MalformedInput(
                "segmentation needs at least one attempt".to_string(),
            ));
        }
        Ok(())
    }
}

/// Totals over the whole journey
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JourneyInfo {
    pub waypoint_count: usize,
    pub leg_count: usize,
    /// Sum of all leg distances, turns included (NM)
    pub total_distance_nm: f64,
    /// Plain waypoint-to-waypoint distance, ignoring turns (NM)
    pub vector_distance_nm: f64,
    /// Sum of all turn arc lengths (NM)
    pub total_arc_length_nm: f64,
    /// `vector_distance_nm - total_distance_nm`: what cutting the corners saves
    pub distance_saved_nm: f64,
}

/// Report line for one leg
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LegSummary {
    pub index: usize,
    pub origin: String,
    pub destination: String,
    pub sail_mode: SailMode,
    pub vector_distance_nm: f64,
    pub leg_distance_nm: f64,
    pub straight_distance_nm: f64,
    /// Length of the turn flown at the origin waypoint
    pub arc_length_nm: f64,
    /// Course change at the origin waypoint, positive to starboard
    pub turn_angle: f64,
    pub initial_bearing: f64,
    pub final_bearing: f64,
}

impl From<&Leg> for LegSummary {
    fn from(leg: &Leg) -> Self {
        Self {
            index: leg.index,
            origin: leg.origin_name.clone(),
            destination: leg.destination_name.clone(),
            sail_mode: leg.mode,
            vector_distance_nm: leg.vector_distance,
            leg_distance_nm: leg.leg_distance,
            straight_distance_nm: leg.straight.distance,
            arc_length_nm: leg.incoming_arc.arc_length(),
            turn_angle: leg.incoming_arc.turn_angle(),
            initial_bearing: leg.initial_bearing,
            final_bearing: leg.final_bearing,
        }
    }
}

/// A sailed route: sail vectors, the legs built on them, and the configuration
#[derive(Debug, Clone)]
pub struct Journey {
    name: String,
    config: Config,
    waypoint_count: usize,
    /// One per consecutive waypoint pair; legs refer to these by index
    sail_vectors: Vec<SailVector>,
    legs: Vec<Leg>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Journey {
    /// Build a journey from waypoints in sailing order
    ///
    /// Waypoints are validated first. Sail vectors and legs are each built in one
    /// parallel pass; if several fail, the error with the lowest index is returned.
    pub fn from_waypoints(name: impl Into<String>, waypoints: &[Waypoint], config: Config) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("journey::from_waypoints");

        let name = name.into();
        config.validate()?;

        if waypoints.len() < 2 && config.require_legs {
            return Err(RouteError::MalformedInput(format!(
                "journey '{name}' needs at least two waypoints, got {}",
                waypoints.len()
            )));
        }

        waypoints
            .iter()
            .enumerate()
            .try_for_each(|(i, waypoint)| waypoint.validate(i))?;

        // Collect per item, then keep the first error in order
        let sail_vectors: Vec<SailVector> = waypoints
            .par_windows(2)
            .enumerate()
            .map(|(i, pair)| SailVector::from_waypoints(i, &pair[0], &pair[1]))
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<Result<_>>()?;

        let legs: Vec<Leg> = (0..sail_vectors.len())
            .into_par_iter()
            .map(|i| Leg::new(&sail_vectors, i))
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<Result<_>>()?;

        let journey = Self {
            name,
            config,
            waypoint_count: waypoints.len(),
            sail_vectors,
            legs,
        };

        debug!(
            "Built journey '{}': {} waypoints, {} legs, {:.3} NM",
            journey.name,
            journey.waypoint_count,
            journey.legs.len(),
            journey.total_distance()
        );

        Ok(journey)
    }

    /// Build a journey from a parsed route document
    pub fn from_route(route: &RouteModel, config: Config) -> Result<Self> {
        Self::from_waypoints(route.name.clone(), &route.waypoints, config)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    #[inline]
    pub fn sail_vectors(&self) -> &[SailVector] {
        &self.sail_vectors
    }

    #[inline]
    pub fn leg_count(&self) -> usize {
        self.legs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Sailed distance in NM: trimmed straight runs plus every turn, each once
    pub fn total_distance(&self) -> f64 {
        self.legs.iter().map(|leg| leg.leg_distance).sum()
    }

    /// Journey totals
    pub fn info(&self) -> JourneyInfo {
        let total_distance_nm = self.total_distance();
        let vector_distance_nm: f64 = self.sail_vectors.iter().map(|sv| sv.distance).sum();
        JourneyInfo {
            waypoint_count: self.waypoint_count,
            leg_count: self.legs.len(),
            total_distance_nm,
            vector_distance_nm,
            total_arc_length_nm: self.legs.iter().map(|leg| leg.incoming_arc.arc_length()).sum(),
            distance_saved_nm: vector_distance_nm - total_distance_nm,
        }
    }

    /// One summary per leg, in sailing order
    pub fn summaries(&self) -> Vec<LegSummary> {
        self.legs.iter().map(LegSummary::from).collect()
    }

    /// The journey as one compound curve, segmenting great circles geometrically
    pub fn compound_curve(&self) -> Result<CompoundCurve> {
        self.compound_curve_with(&GeodesicSegmenter)
    }

    /// The journey as one compound curve
    ///
    /// Each leg contributes its incoming turn (when one is flown) followed by its
    /// straight run. Great-circle runs longer than the configured maximum segment
    /// length are split by `segmenter`.
    pub fn compound_curve_with(&self, segmenter: &dyn Segmenter) -> Result<CompoundCurve> {
        #[cfg(feature = "profiling")]
        profiling::scope!("journey::compound_curve");

        let max_segment_nm = self.config.max_segment_length_nm;
        let per_leg: Vec<Result<Vec<CurveSegment>>> = self
            .legs
            .par_iter()
            .map(|leg| {
                let mut segments = Vec::with_capacity(2);
                if let Some(arc) = leg.circular_string() {
                    segments.push(CurveSegment::CircularString(arc));
                }
                let line = leg.line_string(max_segment_nm, segmenter, &self.config.segmentation)?;
                segments.push(CurveSegment::LineString(line));
                Ok(segments)
            })
            .collect();

        let mut curve = CompoundCurve::empty();
        for segments in per_leg {
            for segment in segments? {
                curve.push(segment)?;
            }
        }
        Ok(curve)
    }

    /// The compound curve serialized in the curve exchange format
    pub fn to_text(&self) -> Result<String> {
        Ok(CurveGeometry::from(self.compound_curve()?).to_text())
    }
}

impl fmt::Display for Journey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for leg in &self.legs {
            writeln!(
                f,
                "From {} to {} along a {} is a distance of {:.2} NM",
                leg.origin_name,
                leg.destination_name,
                leg.mode.describe(),
                leg.leg_distance
            )?;
        }
        Ok(())
    }
}
