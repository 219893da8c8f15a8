//! Reader for the vessel route-exchange XML format
//!
//! ```xml
//! <RouteModel xmlns="http://www.sam-electronics.de/2010/reducedRouteModel.xsd">
//!     <Name>AARHUS-OSLO</Name>
//!     <Waypoints>
//!         <Name>BASIN</Name>
//!         <Latitude>0.9801527642</Latitude>   <!-- radians -->
//!         <Longitude>0.1784168646</Longitude> <!-- radians -->
//!         <SailMode>0</SailMode>              <!-- 0 great circle, 1 rhumb line -->
//!         <Radius>370.4</Radius>              <!-- meters -->
//!     </Waypoints>
//! </RouteModel>
//! ```
//!
//! Unknown elements (track limits, speeds, notes, ...) are ignored.

use crate::{Result, RouteError, RouteModel, SailMode, Waypoint};
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, Event};

const ROOT_TAGS: [&[u8]; 2] = [b"RouteModel", b"RouteModelType"];

/// Fields collected for one `<Waypoints>` element
#[derive(Default)]
struct PartialWaypoint {
    name: Option<String>,
    latitude_rad: Option<f64>,
    longitude_rad: Option<f64>,
    sail_mode: Option<SailMode>,
    radius_m: Option<f64>,
}

impl PartialWaypoint {
    fn set(&mut self, tag: &str, text: &str, index: usize) -> Result<()> {
        match tag {
            "Name" => self.name = Some(text.to_string()),
            "Latitude" => self.latitude_rad = Some(parse_number(tag, text, index)?),
            "Longitude" => self.longitude_rad = Some(parse_number(tag, text, index)?),
            "Radius" => self.radius_m = Some(parse_number(tag, text, index)?),
            "SailMode" => {
                let flag = text.trim().parse::<i64>().map_err(|_| {
                    RouteError::RouteDocument(format!(
                        "waypoint {index}: SailMode '{text}' is not an integer"
                    ))
                })?;
                self.sail_mode = Some(SailMode::from_rhumb_flag(flag != 0));
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self, index: usize) -> Result<Waypoint> {
        let missing = |field: &str| {
            RouteError::RouteDocument(format!("waypoint {index} is missing <{field}>"))
        };
        let name = self.name.unwrap_or_else(|| format!("WP{}", index + 1));
        let latitude = self.latitude_rad.ok_or_else(|| missing("Latitude"))?;
        let longitude = self.longitude_rad.ok_or_else(|| missing("Longitude"))?;
        let sail_mode = self.sail_mode.ok_or_else(|| missing("SailMode"))?;
        let radius = self.radius_m.ok_or_else(|| missing("Radius"))?;

        Ok(Waypoint::new(
            name,
            latitude.to_degrees(),
            longitude.to_degrees(),
            sail_mode,
            radius,
        ))
    }
}

fn parse_number(tag: &str, text: &str, index: usize) -> Result<f64> {
    text.trim().parse::<f64>().map_err(|_| {
        RouteError::RouteDocument(format!(
            "waypoint {index}: <{tag}> value '{text}' is not a number"
        ))
    })
}

/// Resolve `&name;` or `&#NN;` into the character(s) it stands for
fn resolve_reference(reference: &BytesRef<'_>) -> Result<String> {
    if let Some(ch) = reference.resolve_char_ref()? {
        return Ok(ch.to_string());
    }
    let name = reference
        .decode()
        .map_err(|err| RouteError::RouteDocument(err.to_string()))?;
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| RouteError::RouteDocument(format!("unknown entity '&{name};'")))
}

/// Parse a route-exchange XML document into a route model
pub(crate) fn parse_route_xml(xml: &str) -> Result<RouteModel> {
    // Text is trimmed per element once complete: entity references split it into
    // several events, and trimming those would drop the spaces around them.
    let mut reader = Reader::from_str(xml);

    let mut buffer = Vec::new();

    let mut seen_root = false;
    let mut route_name: Option<String> = None;
    let mut waypoints: Vec<Waypoint> = Vec::new();
    let mut current: Option<PartialWaypoint> = None;
    // Element path below the root, by local name
    let mut path: Vec<String> = Vec::new();
    // Character data of the innermost open element
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buffer)? {
            Event::Start(ref e) => {
                let local = e.local_name();
                let tag = std::str::from_utf8(local.as_ref())
                    .map_err(|err| RouteError::RouteDocument(err.to_string()))?
                    .to_string();
                text.clear();

                if !seen_root {
                    if !ROOT_TAGS.contains(&tag.as_bytes()) {
                        return Err(RouteError::RouteDocument(format!(
                            "unexpected root element <{tag}>"
                        )));
                    }
                    seen_root = true;
                } else {
                    if path.is_empty() && tag == "Waypoints" {
                        current = Some(PartialWaypoint::default());
                    }
                    path.push(tag);
                }
            }
            Event::Text(e) => {
                let content = e
                    .xml_content()
                    .map_err(|err| RouteError::RouteDocument(err.to_string()))?;
                text.push_str(&content);
            }
            Event::GeneralRef(e) => text.push_str(&resolve_reference(&e)?),
            Event::End(_) => {
                let value = std::mem::take(&mut text);
                let value = value.trim();
                match (path.as_slice(), current.as_mut()) {
                    ([name], _) if name == "Name" => route_name = Some(value.to_string()),
                    ([parent, field], Some(partial)) if parent == "Waypoints" => {
                        partial.set(field, value, waypoints.len())?;
                    }
                    _ => {}
                }

                let closed = path.pop();
                if path.is_empty() && closed.as_deref() == Some("Waypoints") {
                    if let Some(partial) = current.take() {
                        let index = waypoints.len();
                        waypoints.push(partial.finish(index)?);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buffer.clear();
    }

    if !seen_root {
        return Err(RouteError::RouteDocument(
            "document has no RouteModel element".to_string(),
        ));
    }

    let model = RouteModel::new(route_name.unwrap_or_default(), waypoints);
    tracing::debug!(
        "Parsed route '{}' with {} waypoints",
        model.name,
        model.waypoints.len()
    );
    Ok(model)
}
