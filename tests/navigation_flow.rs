//! Drives a full navigation session over a decoded route geometry.

use beacon_nav::geo::{distance_m, GeoPoint};
use beacon_nav::polyline::Polyline;
use beacon_nav::route::{Route, RouteStep};
use beacon_nav::session::{NavEvent, NavigationSession};

fn point(lat: f64, lng: f64) -> GeoPoint {
    GeoPoint::new(lat, lng).unwrap()
}

/// A short drive through downtown Las Vegas: north on Las Vegas Blvd,
/// left onto Fremont St, straight to the destination.
fn downtown_route() -> Route {
    let a = point(36.1600, -115.1430);
    let b = point(36.1650, -115.1430);
    let c = point(36.1650, -115.1480);
    let d = point(36.1650, -115.1520);

    let geometry = Polyline::new(vec![a, b, c, d]);
    // The geometry survives a wire round-trip intact.
    let decoded = Polyline::decode(&geometry.encode()).unwrap();
    assert_eq!(decoded.len(), 4);

    let step = |start: GeoPoint, end: GeoPoint, instruction: &str, maneuver: Option<&str>| {
        RouteStep {
            start,
            end,
            distance_m: distance_m(start, end) as i32,
            duration_s: 60,
            distance_text: "0.3 mi".to_string(),
            instruction: instruction.to_string(),
            maneuver: maneuver.map(str::to_string),
        }
    };

    Route {
        polyline: decoded,
        steps: vec![
            step(a, b, "Head north on Las Vegas Blvd", None),
            step(b, c, "Turn left onto Fremont St", Some("turn-left")),
            step(c, d, "Continue on Fremont St", Some("straight")),
        ],
        destination: d,
        distance_m: 1360,
        duration_s: 180,
        duration_in_traffic_s: Some(240),
        eta_text: "4 mins".to_string(),
    }
}

fn announcements(events: &[NavEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            NavEvent::Announce(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn follows_route_to_arrival() {
    let route = downtown_route();
    let destination = route.destination;
    let (mut session, start_events) = NavigationSession::start(route);

    let opening = announcements(&start_events);
    assert_eq!(opening[0], "Navigation started.");
    // The first leg is unlabeled, so the opening merges it into the turn.
    assert!(opening[1].starts_with("Continue straight for"));
    assert!(opening[1].contains("until Fremont St"));

    // Mid-block: nothing to report.
    assert!(session.update_position(point(36.1620, -115.1430)).is_empty());

    // Approaching the corner: advance to the turn and announce it.
    let events = session.update_position(point(36.1648, -115.1430));
    assert_eq!(session.current_step(), 1);
    assert_eq!(
        announcements(&events),
        vec!["Turn left onto Fremont St"]
    );
    assert!(events.contains(&NavEvent::StepAdvanced(1)));

    // Through the turn: the straight continuation merges to the destination.
    let events = session.update_position(point(36.1650, -115.1478));
    assert_eq!(session.current_step(), 2);
    let spoken = announcements(&events);
    assert_eq!(spoken.len(), 1);
    assert!(spoken[0].ends_with("to your destination"));

    // Rolling up to the door.
    let events = session.update_position(destination);
    assert!(events.contains(&NavEvent::Arrived));
}

#[test]
fn traffic_refresh_keeps_position_and_reannounces() {
    let (mut session, _) = NavigationSession::start(downtown_route());
    let corner = point(36.1648, -115.1430);
    session.update_position(corner);
    assert_eq!(session.current_step(), 1);

    let events = session.apply_reroute(downtown_route(), corner);
    assert_eq!(session.current_step(), 1);
    assert_eq!(announcements(&events), vec!["Turn left onto Fremont St"]);
}

#[test]
fn banner_tracks_current_maneuver() {
    let (mut session, _) = NavigationSession::start(downtown_route());
    assert_eq!(session.current_banner().maneuver, "turn-left");

    session.update_position(point(36.1648, -115.1430));
    session.update_position(point(36.1650, -115.1478));
    assert_eq!(session.current_banner().maneuver, "destination");
}

#[test]
fn eta_prefers_traffic_adjusted_duration() {
    let route = downtown_route();
    assert_eq!(route.eta_seconds(), 240);
    assert_eq!(route.eta_text, "4 mins");
}
