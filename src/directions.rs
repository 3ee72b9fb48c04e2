//! Directions HTTP adapter.
//!
//! Issues blocking requests against the Google Directions API and
//! normalizes the response into the owned `Route` model. The `{lat, lng}`
//! wire shape becomes `GeoPoint` here and nowhere else.

use std::fmt;

use serde::Deserialize;
use tracing::debug;

use crate::geo::{GeoPoint, InvalidCoordinate};
use crate::polyline::{MalformedPolyline, Polyline};
use crate::route::{strip_html, Route, RouteStep};

#[derive(Debug, Clone)]
pub struct DirectionsConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Which flavor of route to request.
///
/// Tracking/ETA refreshes ask for traffic-adjusted durations; in-app
/// navigation starts with a plain driving route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOptions {
    Driving,
    DrivingWithTraffic,
}

#[derive(Debug)]
pub enum DirectionsError {
    Http(reqwest::Error),
    /// Non-OK status in the API response body.
    Status(String),
    NoRoute,
    BadPolyline(MalformedPolyline),
    BadCoordinate(InvalidCoordinate),
}

impl From<reqwest::Error> for DirectionsError {
    fn from(err: reqwest::Error) -> Self {
        DirectionsError::Http(err)
    }
}

impl From<MalformedPolyline> for DirectionsError {
    fn from(err: MalformedPolyline) -> Self {
        DirectionsError::BadPolyline(err)
    }
}

impl From<InvalidCoordinate> for DirectionsError {
    fn from(err: InvalidCoordinate) -> Self {
        DirectionsError::BadCoordinate(err)
    }
}

impl fmt::Display for DirectionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectionsError::Http(err) => write!(f, "directions request failed: {}", err),
            DirectionsError::Status(status) => write!(f, "directions API status {}", status),
            DirectionsError::NoRoute => write!(f, "no route between origin and destination"),
            DirectionsError::BadPolyline(err) => write!(f, "route geometry: {}", err),
            DirectionsError::BadCoordinate(err) => write!(f, "route coordinate: {}", err),
        }
    }
}

impl std::error::Error for DirectionsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DirectionsError::Http(err) => Some(err),
            DirectionsError::BadPolyline(err) => Some(err),
            DirectionsError::BadCoordinate(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectionsClient {
    config: DirectionsConfig,
    client: reqwest::blocking::Client,
}

impl DirectionsClient {
    pub fn new(config: DirectionsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Fetches a route and normalizes the top-ranked result.
    pub fn route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        options: RouteOptions,
    ) -> Result<Route, DirectionsError> {
        let mut url = format!(
            "{}/directions/json?origin={:.6},{:.6}&destination={:.6},{:.6}",
            self.config.base_url,
            origin.latitude(),
            origin.longitude(),
            destination.latitude(),
            destination.longitude(),
        );
        match options {
            RouteOptions::Driving => url.push_str("&mode=driving"),
            RouteOptions::DrivingWithTraffic => {
                url.push_str("&traffic_model=best_guess&departure_time=now")
            }
        }
        debug!(%url, "fetching directions");
        let url = format!("{}&key={}", url, self.config.api_key);

        let body: DirectionsResponse = self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .json()?;

        normalize(body)
    }
}

/// Converts the top-ranked wire route into the owned model.
fn normalize(body: DirectionsResponse) -> Result<Route, DirectionsError> {
    if body.status != "OK" {
        return Err(DirectionsError::Status(body.status));
    }

    let route = body.routes.into_iter().next().ok_or(DirectionsError::NoRoute)?;
    let leg = route.legs.into_iter().next().ok_or(DirectionsError::NoRoute)?;

    let polyline = Polyline::decode(&route.overview_polyline.points)?;
    debug!(points = polyline.len(), steps = leg.steps.len(), "decoded route");

    let eta_text = leg
        .duration_in_traffic
        .as_ref()
        .map(|d| d.text.clone())
        .unwrap_or_else(|| leg.duration.text.clone());

    let steps = leg
        .steps
        .into_iter()
        .map(|step| {
            Ok(RouteStep {
                start: step.start_location.try_into()?,
                end: step.end_location.try_into()?,
                distance_m: step.distance.value,
                duration_s: step.duration.value,
                distance_text: step.distance.text,
                instruction: strip_html(&step.html_instructions),
                maneuver: step.maneuver,
            })
        })
        .collect::<Result<Vec<_>, DirectionsError>>()?;

    Ok(Route {
        polyline,
        steps,
        destination: leg.end_location.try_into()?,
        distance_m: leg.distance.value,
        duration_s: leg.duration.value,
        duration_in_traffic_s: leg.duration_in_traffic.map(|d| d.value),
        eta_text,
    })
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<RouteWire>,
}

#[derive(Debug, Deserialize)]
struct RouteWire {
    overview_polyline: OverviewPolyline,
    legs: Vec<LegWire>,
}

#[derive(Debug, Deserialize)]
struct OverviewPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct LegWire {
    distance: TextValue,
    duration: TextValue,
    duration_in_traffic: Option<TextValue>,
    end_location: LatLngWire,
    steps: Vec<StepWire>,
}

#[derive(Debug, Deserialize)]
struct StepWire {
    html_instructions: String,
    maneuver: Option<String>,
    distance: TextValue,
    duration: TextValue,
    start_location: LatLngWire,
    end_location: LatLngWire,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    value: i32,
}

/// The `{lat, lng}` shape the directions API uses for locations.
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

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "status": "OK",
        "routes": [{
            "overview_polyline": { "points": "_p~iF~ps|U_ulLnnqC" },
            "legs": [{
                "distance": { "text": "4.9 mi", "value": 7852 },
                "duration": { "text": "14 mins", "value": 841 },
                "duration_in_traffic": { "text": "16 mins", "value": 962 },
                "end_location": { "lat": 40.7, "lng": -120.95 },
                "steps": [{
                    "html_instructions": "Head <b>north</b> on Rainbow Blvd",
                    "distance": { "text": "0.3 mi", "value": 483 },
                    "duration": { "text": "1 min", "value": 58 },
                    "start_location": { "lat": 38.5, "lng": -120.2 },
                    "end_location": { "lat": 38.6, "lng": -120.2 }
                }, {
                    "html_instructions": "Turn <b>left</b> onto Charleston Blvd",
                    "maneuver": "turn-left",
                    "distance": { "text": "4.6 mi", "value": 7369 },
                    "duration": { "text": "13 mins", "value": 783 },
                    "start_location": { "lat": 38.6, "lng": -120.2 },
                    "end_location": { "lat": 40.7, "lng": -120.95 }
                }]
            }]
        }]
    }"#;

    #[test]
    fn test_parse_and_normalize_response() {
        let body: DirectionsResponse = serde_json::from_str(RESPONSE).unwrap();
        assert_eq!(body.status, "OK");
        let route = normalize(body).unwrap();

        assert_eq!(route.polyline.len(), 2);
        assert_eq!(route.steps.len(), 2);
        assert_eq!(route.steps[0].instruction, "Head north on Rainbow Blvd");
        assert!(route.steps[0].maneuver.is_none());
        assert_eq!(route.steps[1].maneuver.as_deref(), Some("turn-left"));
        assert_eq!(route.destination.latitude(), 40.7);
        assert_eq!(route.duration_in_traffic_s, Some(962));
        assert_eq!(route.eta_text, "16 mins");
        assert_eq!(route.eta_seconds(), 962);
    }

    #[test]
    fn test_non_ok_status_is_an_error() {
        let body: DirectionsResponse =
            serde_json::from_str(r#"{ "status": "ZERO_RESULTS", "routes": [] }"#).unwrap();
        match normalize(body) {
            Err(DirectionsError::Status(status)) => assert_eq!(status, "ZERO_RESULTS"),
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[test]
    fn test_ok_with_no_routes_is_no_route() {
        let body: DirectionsResponse =
            serde_json::from_str(r#"{ "status": "OK", "routes": [] }"#).unwrap();
        assert!(matches!(normalize(body), Err(DirectionsError::NoRoute)));
    }
}
