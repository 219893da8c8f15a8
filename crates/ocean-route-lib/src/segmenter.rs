//! Great-circle straight-run segmentation
//!
//! Splitting a great-circle run into short chords may be delegated to an external
//! service (a spatial store, for instance). Such a call is modelled as a synchronous,
//! swappable [`Segmenter`] with a caller-supplied timeout. [`segment_with_policy`]
//! wraps any segmenter with retries and either degrades to a two-point run or
//! propagates the failure, according to [`FailurePolicy`].

use crate::curve::CONTINUITY_TOLERANCE;
use crate::{Result, RouteError, SailMode};
use geo::Point;
use std::time::{Duration, Instant};
use tracing::{trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Relative slack allowed when checking returned chord lengths
const SEGMENT_LENGTH_SLACK: f64 = 1e-6;

/// Splits the run from `start` to `end` into chords no longer than `max_segment_nm`
pub trait Segmenter: Send + Sync {
    /// Short name used in log messages
    fn name(&self) -> &str;

    /// Points from `start` to `end` inclusive
    ///
    /// Implementations backed by a remote service should give up once `timeout`
    /// has elapsed.
    fn segment(
        &self,
        start: Point<f64>,
        end: Point<f64>,
        max_segment_nm: f64,
        timeout: Duration,
    ) -> Result<Vec<Point<f64>>>;
}

/// Pure geometry segmenter using ellipsoidal geodesic interpolation
#[derive(Clone, Copy, Debug, Default)]
pub struct GeodesicSegmenter;

impl Segmenter for GeodesicSegmenter {
    fn name(&self) -> &str {
        "geodesic"
    }

    fn segment(
        &self,
        start: Point<f64>,
        end: Point<f64>,
        max_segment_nm: f64,
        _timeout: Duration,
    ) -> Result<Vec<Point<f64>>> {
        let mode = SailMode::GreatCircle;
        let count = segment_count(mode.distance_nm(start, end), max_segment_nm)?;
        Ok((0..=count)
            .map(|i| mode.intermediate(start, end, i as f64 / count as f64))
            .collect())
    }
}

/// Most chords one straight run may be split into
pub const MAX_SEGMENTS_PER_RUN: usize = 1_000_000;

/// Number of equal chords needed so none exceeds `max_segment_nm`; at least one
///
/// Fails with `MalformedInput` when more than [`MAX_SEGMENTS_PER_RUN`] chords are needed.
pub(crate) fn segment_count(distance_nm: f64, max_segment_nm: f64) -> Result<usize> {
    if distance_nm <= max_segment_nm {
        return Ok(1);
    }
    let count = (distance_nm / max_segment_nm).ceil();
    if !count.is_finite() || count > MAX_SEGMENTS_PER_RUN as f64 {
        return Err(RouteError::MalformedInput(format!(
            "splitting {distance_nm:.3} NM into chords of {max_segment_nm} NM needs more than \
             {MAX_SEGMENTS_PER_RUN} chords"
        )));
    }
    Ok((count as usize).max(1))
}

/// What to do once every segmentation attempt has failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FailurePolicy {
    /// Fall back to the two-point straight run
    #[default]
    Degrade,
    /// Return the last error to the caller
    Propagate,
}

/// Retry and timeout settings for segmentation
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentationConfig {
    /// Attempts per straight run, at least one (default 3)
    pub max_attempts: u32,
    /// Total time budget across all attempts for one straight run (default 5 s)
    pub timeout: Duration,
    /// Pause between attempts (default 50 ms)
    pub retry_delay: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(5),
            retry_delay: Duration::from_millis(50),
            failure_policy: FailurePolicy::Degrade,
        }
    }
}

/// Segment one great-circle run with retries and the configured failure policy
///
/// The result always starts at exactly `start` and ends at exactly `end`; it is either
/// a complete, validated polyline or the two-point fallback, never a partial one.
pub fn segment_with_policy(
    segmenter: &dyn Segmenter,
    start: Point<f64>,
    end: Point<f64>,
    max_segment_nm: f64,
    config: &SegmentationConfig,
) -> Result<Vec<Point<f64>>> {
    let started = Instant::now();
    let remaining = || config.timeout.saturating_sub(started.elapsed());
    let expired = || started.elapsed() > config.timeout;
    let max_attempts = config.max_attempts.max(1);

    let mut attempts = 0;
    let mut last_error = None;

    while attempts < max_attempts {
        let budget = remaining();
        if budget.is_zero() {
            break;
        }
        attempts += 1;

        let outcome = segmenter
            .segment(start, end, max_segment_nm, budget)
            .and_then(|points| {
                if expired() {
                    return Err(RouteError::SegmentationTimeout {
                        attempts,
                        timeout: config.timeout,
                    });
                }
                check_response(points, start, end, max_segment_nm)
            });

        match outcome {
            Ok(points) => return Ok(points),
            Err(err) => {
                trace!(
                    "Segmenter '{}' attempt {}/{} failed: {}",
                    segmenter.name(),
                    attempts,
                    max_attempts,
                    err
                );
                last_error = Some(err);
            }
        }

        if attempts < max_attempts {
            std::thread::sleep(config.retry_delay.min(remaining()));
        }
    }

    let out_of_time = attempts < max_attempts || expired();
    let error = match last_error {
        Some(err) if !out_of_time => err,
        _ => RouteError::SegmentationTimeout {
            attempts,
            timeout: config.timeout,
        },
    };

    match config.failure_policy {
        FailurePolicy::Degrade => {
            warn!(
                "Segmenter '{}' gave up ({}), using a straight two-point run",
                segmenter.name(),
                error
            );
            Ok(vec![start, end])
        }
        FailurePolicy::Propagate => Err(error),
    }
}

/// Accept a segmenter response only if it is a complete polyline between the endpoints
fn check_response(
    mut points: Vec<Point<f64>>,
    start: Point<f64>,
    end: Point<f64>,
    max_segment_nm: f64,
) -> Result<Vec<Point<f64>>> {
    if points.len() < 2 {
        return Err(RouteError::Segmentation(format!(
            "expected at least two points, got {}",
            points.len()
        )));
    }

    let close = |a: Point<f64>, b: Point<f64>| {
        (a.x() - b.x()).abs() <= CONTINUITY_TOLERANCE && (a.y() - b.y()).abs() <= CONTINUITY_TOLERANCE
    };
    let last = points.len() - 1;
    if !close(points[0], start) || !close(points[last], end) {
        return Err(RouteError::Segmentation(
            "response does not run between the requested endpoints".to_string(),
        ));
    }

    let limit = max_segment_nm * (1.0 + SEGMENT_LENGTH_SLACK);
    if let Some(chord) = points
        .windows(2)
        .map(|pair| SailMode::GreatCircle.distance_nm(pair[0], pair[1]))
        .find(|&length| length > limit)
    {
        return Err(RouteError::Segmentation(format!(
            "chord of {chord:.3} NM exceeds the {max_segment_nm} NM maximum"
        )));
    }

    // Snap so neighbouring curve segments share identical endpoints
    points[0] = start;
    points[last] = end;
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails a fixed number of times, then answers like the geodesic segmenter
    struct FlakySegmenter {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakySegmenter {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Segmenter for FlakySegmenter {
        fn name(&self) -> &str {
            "flaky"
        }

        fn segment(
            &self,
            start: Point<f64>,
            end: Point<f64>,
            max_segment_nm: f64,
            timeout: Duration,
        ) -> Result<Vec<Point<f64>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(RouteError::Segmentation("store unavailable".to_string()));
            }
            GeodesicSegmenter.segment(start, end, max_segment_nm, timeout)
        }
    }

    /// Always answers with a single chord between the wrong points
    struct WrongEndpoints;

    impl Segmenter for WrongEndpoints {
        fn name(&self) -> &str {
            "wrong"
        }

        fn segment(&self, start: Point<f64>, _: Point<f64>, _: f64, _: Duration) -> Result<Vec<Point<f64>>> {
            Ok(vec![start, Point::new(start.x() + 1.0, start.y())])
        }
    }

    /// Answers correctly, but too late
    struct SlowSegmenter(Duration);

    impl Segmenter for SlowSegmenter {
        fn name(&self) -> &str {
            "slow"
        }

        fn segment(
            &self,
            start: Point<f64>,
            end: Point<f64>,
            max_segment_nm: f64,
            timeout: Duration,
        ) -> Result<Vec<Point<f64>>> {
            std::thread::sleep(self.0);
            GeodesicSegmenter.segment(start, end, max_segment_nm, timeout)
        }
    }

    fn fast_config(policy: FailurePolicy) -> SegmentationConfig {
        SegmentationConfig {
            max_attempts: 3,
            timeout: Duration::from_secs(5),
            retry_delay: Duration::ZERO,
            failure_policy: policy,
        }
    }

    fn endpoints() -> (Point<f64>, Point<f64>) {
        (Point::new(-5.0, 48.0), Point::new(-60.0, 45.0))
    }

    #[test]
    fn test_segment_count() {
        assert_eq!(segment_count(10.0, 20.0).unwrap(), 1);
        assert_eq!(segment_count(20.0, 20.0).unwrap(), 1);
        assert_eq!(segment_count(20.1, 20.0).unwrap(), 2);
        assert_eq!(segment_count(3000.0, 100.0).unwrap(), 30);
    }

    #[test]
    fn test_segment_count_is_capped() {
        for max in [1e-310, 1e-6] {
            assert!(matches!(
                segment_count(3000.0, max),
                Err(RouteError::MalformedInput(_))
            ));
        }
        assert_eq!(segment_count(1.0, 1e-310).ok(), None);

        let (start, end) = endpoints();
        assert!(
            GeodesicSegmenter
                .segment(start, end, 1e-310, Duration::ZERO)
                .is_err()
        );
    }

    #[test]
    fn test_geodesic_segmenter_respects_max_length() {
        let (start, end) = endpoints();
        let points = GeodesicSegmenter
            .segment(start, end, 100.0, Duration::ZERO)
            .unwrap();

        assert_eq!(points[0], start);
        assert_eq!(points[points.len() - 1], end);
        for pair in points.windows(2) {
            assert!(SailMode::GreatCircle.distance_nm(pair[0], pair[1]) <= 100.0 + 1e-6);
        }

        // Monotonic: every point is further from the start than the one before
        let mut previous = 0.0;
        for point in &points[1..] {
            let d = SailMode::GreatCircle.distance_nm(start, *point);
            assert!(d > previous);
            previous = d;
        }
    }

    #[test]
    fn test_retry_recovers_from_transient_failures() {
        let (start, end) = endpoints();
        let segmenter = FlakySegmenter::new(2);
        let points =
            segment_with_policy(&segmenter, start, end, 100.0, &fast_config(FailurePolicy::Propagate))
                .unwrap();
        assert_eq!(segmenter.calls(), 3);
        assert!(points.len() > 2);
    }

    #[test]
    fn test_persistent_failure_degrades_to_straight_run() {
        let (start, end) = endpoints();
        let segmenter = FlakySegmenter::new(u32::MAX);
        let points =
            segment_with_policy(&segmenter, start, end, 100.0, &fast_config(FailurePolicy::Degrade))
                .unwrap();
        assert_eq!(points, vec![start, end]);
        assert_eq!(segmenter.calls(), 3);
    }

    #[test]
    fn test_persistent_failure_propagates() {
        let (start, end) = endpoints();
        let segmenter = FlakySegmenter::new(u32::MAX);
        let result =
            segment_with_policy(&segmenter, start, end, 100.0, &fast_config(FailurePolicy::Propagate));
        assert!(matches!(result, Err(RouteError::Segmentation(_))));
    }

    #[test]
    fn test_wrong_endpoints_count_as_failure() {
        let (start, end) = endpoints();
        let result = segment_with_policy(
            &WrongEndpoints,
            start,
            end,
            100.0,
            &fast_config(FailurePolicy::Propagate),
        );
        assert!(matches!(result, Err(RouteError::Segmentation(_))));

        let points =
            segment_with_policy(&WrongEndpoints, start, end, 100.0, &fast_config(FailurePolicy::Degrade))
                .unwrap();
        assert_eq!(points, vec![start, end]);
    }

    #[test]
    fn test_too_long_chords_count_as_failure() {
        let (start, end) = endpoints();
        let checked = check_response(vec![start, end], start, end, 100.0);
        assert!(matches!(checked, Err(RouteError::Segmentation(_))));
    }

    #[test]
    fn test_slow_segmenter_times_out() {
        let (start, end) = endpoints();
        let config = SegmentationConfig {
            max_attempts: 5,
            timeout: Duration::from_millis(10),
            retry_delay: Duration::ZERO,
            failure_policy: FailurePolicy::Propagate,
        };
        let result = segment_with_policy(
            &SlowSegmenter(Duration::from_millis(30)),
            start,
            end,
            100.0,
            &config,
        );
        match result {
            Err(RouteError::SegmentationTimeout { attempts, .. }) => assert_eq!(attempts, 1),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_default_config() {
        let config = SegmentationConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.failure_policy, FailurePolicy::Degrade);
    }
}
