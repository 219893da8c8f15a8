//! Route model: the ordered waypoint list a journey is built from
//!
//! This module provides the `Waypoint` and `RouteModel` types plus readers that turn
//! GPX files and vessel route-exchange XML documents into a `RouteModel`.

use crate::{Result, RouteError, SailMode, route_xml};
use geo::Point;
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A navigation fix with the sailing parameters of the leg arriving at it
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Waypoint {
    /// Waypoint name as given by the route document
    pub name: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// How the vector arriving at this waypoint is sailed
    pub sail_mode: SailMode,
    /// Turning radius of the vessel at this waypoint in meters
    pub turn_radius_m: f64,
}

impl Waypoint {
    /// Create a new waypoint
    pub fn new(
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        sail_mode: SailMode,
        turn_radius_m: f64,
    ) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            sail_mode,
            turn_radius_m,
        }
    }

    /// Position as a geo point (x = longitude, y = latitude)
    #[inline]
    pub fn position(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// Check that the waypoint describes a physically meaningful fix
    ///
    /// `index` is the waypoint's position in its route and is reported in errors.
    pub fn validate(&self, index: usize) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(RouteError::InvalidGeometry {
                index,
                reason: format!(
                    "waypoint '{}' latitude {} is outside [-90, 90]",
                    self.name, self.latitude
                ),
            });
        }
        if !self.longitude.is_finite() {
            return Err(RouteError::InvalidGeometry {
                index,
                reason: format!("waypoint '{}' longitude is not finite", self.name),
            });
        }
        if !self.turn_radius_m.is_finite() || self.turn_radius_m < 0.0 {
            return Err(RouteError::InvalidGeometry {
                index,
                reason: format!(
                    "waypoint '{}' turn radius {} m must be a finite value >= 0",
                    self.name, self.turn_radius_m
                ),
            });
        }
        Ok(())
    }
}

/// Defaults for route documents that carry no per-waypoint sailing data
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImportDefaults {
    /// Turn radius assigned to every waypoint, in meters
    pub turn_radius_m: f64,
    /// Sail mode assigned to every waypoint
    pub sail_mode: SailMode,
}

impl Default for ImportDefaults {
    fn default() -> Self {
        Self {
            turn_radius_m: 0.0,
            sail_mode: SailMode::GreatCircle,
        }
    }
}

/// A named, ordered list of waypoints
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RouteModel {
    /// Route name
    pub name: String,
    /// Waypoints in sailing order
    pub waypoints: Vec<Waypoint>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RouteModel {
    /// Create a new route model
    pub fn new(name: impl Into<String>, waypoints: Vec<Waypoint>) -> Self {
        Self {
            name: name.into(),
            waypoints,
        }
    }

    /// Parse a vessel route-exchange XML document
    ///
    /// Latitudes and longitudes in the document are radians, radii are meters.
    pub fn from_route_xml(xml: &str) -> Result<Self> {
        route_xml::parse_route_xml(xml)
    }

    /// Build a route model from GPX data
    ///
    /// Uses the first `<rte>` of the file, falling back to the points of the first
    /// track. GPX carries no turning data, so radius and sail mode come from `defaults`.
    pub fn from_gpx(gpx_data: gpx::Gpx, defaults: &ImportDefaults) -> Result<Self> {
        let (name, points) = if let Some(route) = gpx_data.routes.into_iter().next() {
            (route.name, route.points)
        } else if let Some(track) = gpx_data.tracks.into_iter().next() {
            let points = track
                .segments
                .into_iter()
                .flat_map(|segment| segment.points)
                .collect();
            (track.name, points)
        } else {
            return Err(RouteError::RouteDocument(
                "GPX file contains neither a route nor a track".to_string(),
            ));
        };

        let name = name
            .or_else(|| gpx_data.metadata.and_then(|m| m.name))
            .unwrap_or_default();

        let waypoints = points
            .into_iter()
            .enumerate()
            .map(|(i, wp)| {
                let point = wp.point();
                Waypoint::new(
                    wp.name.unwrap_or_else(|| format!("WP{}", i + 1)),
                    point.y(),
                    point.x(),
                    defaults.sail_mode,
                    defaults.turn_radius_m,
                )
            })
            .collect();

        Ok(Self::new(name, waypoints))
    }

    /// Load a route document from disk
    ///
    /// Files with a `.gpx` extension are read as GPX, anything else as route XML.
    pub fn load(path: impl AsRef<Path>, defaults: &ImportDefaults) -> Result<Self> {
        let path = path.as_ref();
        let is_gpx = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gpx"));

        if is_gpx {
            let file = std::fs::File::open(path)?;
            let reader = std::io::BufReader::new(file);
            Self::from_gpx(gpx::read(reader)?, defaults)
        } else {
            let xml = std::fs::read_to_string(path)?;
            Self::from_route_xml(xml.trim())
        }
    }
}
