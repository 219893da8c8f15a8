//! Curve geometry model and its textual exchange format
//!
//! Four closed variants: a point, a line string, a three-point circular string and a
//! compound curve made of line and circular strings joined end to end.
//!
//! # Text form
//!
//! `TAG(body)` where the tag is empty for points and line strings, `CIRCULARSTRING` or
//! `COMPOUNDCURVE`. A body is either comma separated `x y` pairs or comma separated
//! nested geometries:
//!
//! ```text
//! COMPOUNDCURVE((0 0, 1 0), CIRCULARSTRING(1 0, 1.3 0.3, 1 1), (1 1, 1 2))
//! ```
//!
//! An empty compound curve is written `COMPOUNDCURVE EMPTY`.

mod parser;

pub use parser::parse;

use crate::{Result, RouteError};
use geo::{Coord, LineString};
use std::fmt;

/// Maximum distance (degrees) between the end of one compound curve segment and the
/// start of the next
pub const CONTINUITY_TOLERANCE: f64 = 1e-9;

/// A single arc through three points: start, a point on the arc, end
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircularString {
    points: [Coord<f64>; 3],
}

impl CircularString {
    pub fn new(start: Coord<f64>, mid: Coord<f64>, end: Coord<f64>) -> Self {
        Self {
            points: [start, mid, end],
        }
    }

    #[inline]
    pub fn start(&self) -> Coord<f64> {
        self.points[0]
    }

    #[inline]
    pub fn mid(&self) -> Coord<f64> {
        self.points[1]
    }

    #[inline]
    pub fn end(&self) -> Coord<f64> {
        self.points[2]
    }

    #[inline]
    pub fn points(&self) -> &[Coord<f64>; 3] {
        &self.points
    }
}

/// One piece of a compound curve
#[derive(Clone, Debug, PartialEq)]
pub enum CurveSegment {
    LineString(LineString<f64>),
    CircularString(CircularString),
}

impl CurveSegment {
    /// First coordinate of the segment
    pub fn start(&self) -> Option<Coord<f64>> {
        match self {
            CurveSegment::LineString(line) => line.0.first().copied(),
            CurveSegment::CircularString(arc) => Some(arc.start()),
        }
    }

    /// Last coordinate of the segment
    pub fn end(&self) -> Option<Coord<f64>> {
        match self {
            CurveSegment::LineString(line) => line.0.last().copied(),
            CurveSegment::CircularString(arc) => Some(arc.end()),
        }
    }

    pub fn is_line_string(&self) -> bool {
        matches!(self, CurveSegment::LineString(_))
    }

    pub fn is_circular_string(&self) -> bool {
        matches!(self, CurveSegment::CircularString(_))
    }

    /// Describe why this segment cannot be part of a compound curve, if it cannot
    fn defect(&self) -> Option<String> {
        match self {
            CurveSegment::LineString(line) if line.0.len() < 2 => Some(format!(
                "a line string needs at least two points, found {}",
                line.0.len()
            )),
            _ => None,
        }
    }
}

/// Line and circular strings joined end to end
///
/// Construction enforces that each segment starts where the previous one ends.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct CompoundCurve {
    segments: Vec<CurveSegment>,
}

impl CompoundCurve {
    /// An empty compound curve
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a compound curve, checking segment sizes and continuity
    pub fn new(segments: Vec<CurveSegment>) -> Result<Self> {
        let mut curve = Self::empty();
        for segment in segments {
            curve.push(segment)?;
        }
        Ok(curve)
    }

    /// Append a segment that starts where the curve currently ends
    pub fn push(&mut self, segment: CurveSegment) -> Result<()> {
        let index = self.segments.len();
        if let Some(reason) = segment.defect() {
            return Err(RouteError::InvalidGeometry { index, reason });
        }
        if let Some(reason) = self.gap_to(&segment) {
            return Err(RouteError::InvalidGeometry { index, reason });
        }
        self.segments.push(segment);
        Ok(())
    }

    /// Describe the discontinuity between the current end and `next`, if any
    fn gap_to(&self, next: &CurveSegment) -> Option<String> {
        let end = self.end()?;
        let start = next.start()?;
        let gap = (end.x - start.x).abs().max((end.y - start.y).abs());
        (gap > CONTINUITY_TOLERANCE).then(|| {
            format!(
                "segment starts at ({} {}) but the previous segment ends at ({} {})",
                start.x, start.y, end.x, end.y
            )
        })
    }

    #[inline]
    pub fn segments(&self) -> &[CurveSegment] {
        &self.segments
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn start(&self) -> Option<Coord<f64>> {
        self.segments.first().and_then(CurveSegment::start)
    }

    pub fn end(&self) -> Option<Coord<f64>> {
        self.segments.last().and_then(CurveSegment::end)
    }

    /// Number of line string segments
    pub fn line_string_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_line_string()).count()
    }

    /// Number of circular string segments
    pub fn circular_string_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_circular_string()).count()
    }
}

/// Any geometry of the exchange format
#[derive(Clone, Debug, PartialEq)]
pub enum CurveGeometry {
    Point(Coord<f64>),
    LineString(LineString<f64>),
    CircularString(CircularString),
    CompoundCurve(CompoundCurve),
}

impl CurveGeometry {
    /// The compound curve, if this is one
    pub fn as_compound_curve(&self) -> Option<&CompoundCurve> {
        match self {
            CurveGeometry::CompoundCurve(curve) => Some(curve),
            _ => None,
        }
    }

    pub fn into_compound_curve(self) -> Option<CompoundCurve> {
        match self {
            CurveGeometry::CompoundCurve(curve) => Some(curve),
            _ => None,
        }
    }

    /// Serialize to the exchange format
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl std::str::FromStr for CurveGeometry {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

impl From<CompoundCurve> for CurveGeometry {
    fn from(curve: CompoundCurve) -> Self {
        CurveGeometry::CompoundCurve(curve)
    }
}

// ============================================================================
// Serialization
// ============================================================================

fn write_coords<'a>(
    f: &mut fmt::Formatter<'_>,
    coords: impl IntoIterator<Item = &'a Coord<f64>>,
) -> fmt::Result {
    f.write_str("(")?;
    for (i, coord) in coords.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{} {}", coord.x, coord.y)?;
    }
    f.write_str(")")
}

impl fmt::Display for CircularString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CIRCULARSTRING")?;
        write_coords(f, &self.points)
    }
}

impl fmt::Display for CurveSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveSegment::LineString(line) => write_coords(f, &line.0),
            CurveSegment::CircularString(arc) => fmt::Display::fmt(arc, f),
        }
    }
}

impl fmt::Display for CompoundCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("COMPOUNDCURVE EMPTY");
        }
        f.write_str("COMPOUNDCURVE(")?;
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            fmt::Display::fmt(segment, f)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for CurveGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveGeometry::Point(coord) => write_coords(f, std::iter::once(coord)),
            CurveGeometry::LineString(line) => write_coords(f, &line.0),
            CurveGeometry::CircularString(arc) => fmt::Display::fmt(arc, f),
            CurveGeometry::CompoundCurve(curve) => fmt::Display::fmt(curve, f),
        }
    }
}
