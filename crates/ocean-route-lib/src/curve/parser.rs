//! Recursive parser for the curve exchange format
//!
//! The body of a tagged geometry is split into top-level elements by tracking
//! parenthesis depth (commas inside nested parentheses do not split). Each element is
//! either an `x y` coordinate pair or a nested `TAG(body)` geometry, which is parsed
//! recursively. Inside a `COMPOUNDCURVE` an untagged element is always a line string.

use super::{CircularString, CompoundCurve, CurveGeometry, CurveSegment};
use crate::{Result, RouteError};
use geo::{Coord, LineString};

/// Longest fragment quoted back in error messages
const MAX_FRAGMENT_CHARS: usize = 60;

/// Where a geometry appears, which decides how an untagged body is read
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Context {
    TopLevel,
    Compound,
}

/// The four known shapes; `Untagged` covers both points and line strings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tag {
    Untagged,
    Point,
    LineString,
    CircularString,
    CompoundCurve,
}

impl Tag {
    fn parse(tag: &str) -> Result<Self> {
        match tag.to_ascii_uppercase().as_str() {
            "" => Ok(Tag::Untagged),
            "POINT" => Ok(Tag::Point),
            "LINESTRING" => Ok(Tag::LineString),
            "CIRCULARSTRING" => Ok(Tag::CircularString),
            "COMPOUNDCURVE" => Ok(Tag::CompoundCurve),
            _ => Err(RouteError::UnsupportedGeometryTag {
                tag: tag.to_string(),
            }),
        }
    }
}

/// Parse a geometry from the exchange format
///
/// Fails on unbalanced parentheses, unknown tags, empty bodies and non-numeric
/// coordinates; no partially built geometry is ever returned.
pub fn parse(text: &str) -> Result<CurveGeometry> {
    let text = text.trim();
    if text.is_empty() {
        return Err(malformed(text, "empty geometry text"));
    }
    check_balanced(text)?;
    parse_geometry(text, Context::TopLevel)
}

fn malformed(fragment: &str, reason: impl Into<String>) -> RouteError {
    let fragment = if fragment.chars().count() > MAX_FRAGMENT_CHARS {
        let cut: String = fragment.chars().take(MAX_FRAGMENT_CHARS).collect();
        format!("{cut}...")
    } else {
        fragment.to_string()
    };
    RouteError::MalformedGeometryText {
        fragment,
        reason: reason.into(),
    }
}

fn check_balanced(text: &str) -> Result<()> {
    let mut depth: usize = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return Err(malformed(&text[i..], "unbalanced ')'"));
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(malformed(text, format!("{depth} unclosed '('")));
    }
    Ok(())
}

/// Index of the parenthesis closing the one opened at `open`
fn matching_close(text: &str, open: usize) -> Result<usize> {
    let mut depth: usize = 0;
    for (i, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + i);
                }
            }
            _ => {}
        }
    }
    Err(malformed(&text[open..], "unclosed '('"))
}

/// Split a body into its top-level, comma separated elements
fn split_top_level(body: &str) -> Result<Vec<&str>> {
    if body.trim().is_empty() {
        return Err(malformed(body, "empty body"));
    }

    let mut elements = Vec::new();
    let mut depth: usize = 0;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                elements.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    elements.push(&body[start..]);

    elements
        .into_iter()
        .map(|element| {
            let element = element.trim();
            if element.is_empty() {
                Err(malformed(body, "empty element"))
            } else {
                Ok(element)
            }
        })
        .collect()
}

fn parse_coord(text: &str) -> Result<Coord<f64>> {
    if text.contains('(') {
        return Err(malformed(text, "expected a coordinate pair, found a nested geometry"));
    }
    let mut values = text.split_whitespace().map(|token| {
        token
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| malformed(text, format!("non-numeric coordinate '{token}'")))
    });
    match (values.next(), values.next(), values.next()) {
        (Some(x), Some(y), None) => Ok(Coord { x: x?, y: y? }),
        _ => Err(malformed(text, "expected exactly two coordinates")),
    }
}

fn parse_coords(elements: &[&str]) -> Result<Vec<Coord<f64>>> {
    elements.iter().copied().map(parse_coord).collect()
}

/// Parse `TAG EMPTY`
fn parse_empty(text: &str) -> Option<Result<CurveGeometry>> {
    let upper = text.to_ascii_uppercase();
    let tag = upper.strip_suffix("EMPTY")?.trim_end();
    // "EMPTY" must be a separate word
    if !tag.is_empty() && upper.len() - tag.len() == "EMPTY".len() {
        return None;
    }
    Some(match Tag::parse(tag) {
        Ok(Tag::CompoundCurve) => Ok(CurveGeometry::CompoundCurve(CompoundCurve::empty())),
        Ok(_) => Err(malformed(text, "only a compound curve may be empty")),
        Err(e) => Err(e),
    })
}

fn parse_geometry(text: &str, context: Context) -> Result<CurveGeometry> {
    let text = text.trim();

    let Some(open) = text.find('(') else {
        if let Some(empty) = parse_empty(text) {
            return empty;
        }
        return match context {
            Context::TopLevel => parse_coord(text).map(CurveGeometry::Point),
            Context::Compound => Err(malformed(text, "expected a parenthesized segment")),
        };
    };

    let close = matching_close(text, open)?;
    if close != text.len() - 1 {
        return Err(malformed(&text[close + 1..], "unexpected text after geometry"));
    }

    let tag = Tag::parse(text[..open].trim())?;
    let body = &text[open + 1..close];
    let elements = split_top_level(body)?;

    match tag {
        Tag::Untagged | Tag::Point | Tag::LineString | Tag::CircularString => {
            let coords = parse_coords(&elements)?;
            build_simple(tag, coords, context, text)
        }
        Tag::CompoundCurve => {
            if context == Context::Compound {
                return Err(malformed(text, "compound curves cannot be nested"));
            }
            parse_compound(&elements).map(CurveGeometry::CompoundCurve)
        }
    }
}

/// Turn a coordinate list into the shape its tag and position call for
fn build_simple(
    tag: Tag,
    coords: Vec<Coord<f64>>,
    context: Context,
    text: &str,
) -> Result<CurveGeometry> {
    let count = coords.len();
    match (tag, context) {
        (Tag::Untagged, Context::TopLevel) if count == 1 => Ok(CurveGeometry::Point(coords[0])),
        (Tag::Point, Context::TopLevel) if count == 1 => Ok(CurveGeometry::Point(coords[0])),
        (Tag::Point, _) => Err(malformed(
            text,
            match context {
                Context::TopLevel => format!("a point has one coordinate pair, found {count}"),
                Context::Compound => "a compound curve cannot contain a point".to_string(),
            },
        )),
        (Tag::Untagged | Tag::LineString, _) if count >= 2 => {
            Ok(CurveGeometry::LineString(LineString::new(coords)))
        }
        (Tag::Untagged | Tag::LineString, _) => Err(malformed(
            text,
            format!("a line string needs at least two points, found {count}"),
        )),
        (Tag::CircularString, _) if count == 3 => Ok(CurveGeometry::CircularString(
            CircularString::new(coords[0], coords[1], coords[2]),
        )),
        (Tag::CircularString, _) => Err(malformed(
            text,
            format!("a circular string has exactly three points, found {count}"),
        )),
        (Tag::CompoundCurve, _) => Err(malformed(text, "expected nested segments")),
    }
}

fn parse_compound(elements: &[&str]) -> Result<CompoundCurve> {
    let mut curve = CompoundCurve::empty();
    for element in elements {
        let segment = match parse_geometry(element, Context::Compound)? {
            CurveGeometry::LineString(line) => CurveSegment::LineString(line),
            CurveGeometry::CircularString(arc) => CurveSegment::CircularString(arc),
            _ => {
                return Err(malformed(
                    element,
                    "compound curve segments must be line or circular strings",
                ));
            }
        };
        curve.push(segment).map_err(|err| match err {
            RouteError::InvalidGeometry { reason, .. } => malformed(element, reason),
            other => other,
        })?;
    }
    Ok(curve)
}
