//! Geocoding and road-snapping adapters.
//!
//! Patient addresses are stored as free text; the geocoder resolves them
//! to coordinates before routing. The roads adapter pulls a raw GPS fix
//! onto the nearest road segment and falls back to the fix when the API
//! has nothing close enough.

use std::fmt;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::geo::{GeoPoint, InvalidCoordinate};

#[derive(Debug, Clone)]
pub struct GeocodeConfig {
    pub base_url: String,
    pub roads_base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api".to_string(),
            roads_base_url: "https://roads.googleapis.com/v1".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug)]
pub enum GeocodeError {
    Http(reqwest::Error),
    /// Non-OK status in the geocoder response body.
    Status(String),
    /// OK status but no results for the address.
    NoResult,
    BadCoordinate(InvalidCoordinate),
}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        GeocodeError::Http(err)
    }
}

impl From<InvalidCoordinate> for GeocodeError {
    fn from(err: InvalidCoordinate) -> Self {
        GeocodeError::BadCoordinate(err)
    }
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocodeError::Http(err) => write!(f, "geocode request failed: {}", err),
            GeocodeError::Status(status) => write!(f, "geocode API status {}", status),
            GeocodeError::NoResult => write!(f, "address did not resolve"),
            GeocodeError::BadCoordinate(err) => write!(f, "geocode result: {}", err),
        }
    }
}

impl std::error::Error for GeocodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeocodeError::Http(err) => Some(err),
            GeocodeError::BadCoordinate(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeocodeClient {
    config: GeocodeConfig,
    client: reqwest::blocking::Client,
}

impl GeocodeClient {
    pub fn new(config: GeocodeConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Resolves a street address to coordinates (first result wins).
    pub fn geocode(&self, address: &str) -> Result<GeoPoint, GeocodeError> {
        let url = format!(
            "{}/geocode/json?address={}&key={}",
            self.config.base_url,
            urlencode(address),
            self.config.api_key
        );

        let body: GeocodeResponse = self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .json()?;

        if body.status != "OK" {
            return Err(GeocodeError::Status(body.status));
        }

        let result = body.results.into_iter().next().ok_or(GeocodeError::NoResult)?;
        debug!(address, "geocoded address");
        Ok(result.geometry.location.try_into()?)
    }

    /// Snaps a GPS fix onto the nearest road, returning the fix unchanged
    /// when the roads API has no match.
    pub fn snap_to_road(&self, fix: GeoPoint) -> Result<GeoPoint, GeocodeError> {
        let url = format!(
            "{}/snapToRoads?path={},{}&key={}",
            self.config.roads_base_url,
            fix.latitude(),
            fix.longitude(),
            self.config.api_key
        );

        let body: SnapResponse = self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .json()?;

        match body.snapped_points.into_iter().next() {
            Some(snapped) => Ok(snapped.location.try_into()?),
            None => {
                warn!("no snapped point, keeping raw fix");
                Ok(fix)
            }
        }
    }
}

/// Percent-encodes everything outside the URL-safe set, the same set the
/// original client escaped.
fn urlencode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLngWire,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct LatLngWire {
    lat: f64,
    lng: f64,
}

impl TryFrom<LatLngWire> for GeoPoint {
    type Error = InvalidCoordinate;

    fn try_from(wire: LatLngWire) -> Result<Self, Self::Error> {
        GeoPoint::new(wire.lat, wire.lng)
    }
}

#[derive(Debug, Deserialize)]
struct SnapResponse {
    #[serde(rename = "snappedPoints", default)]
    snapped_points: Vec<SnappedPoint>,
}

#[derive(Debug, Deserialize)]
struct SnappedPoint {
    location: SnappedLocation,
}

/// The roads API spells coordinates out, unlike the maps APIs.
#[derive(Debug, Clone, Copy, Deserialize)]
struct SnappedLocation {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<SnappedLocation> for GeoPoint {
    type Error = InvalidCoordinate;

    fn try_from(wire: SnappedLocation) -> Result<Self, Self::Error> {
        GeoPoint::new(wire.latitude, wire.longitude)
    }
}
