//! beacon-nav navigation core
//!
//! Geometry, route modelling, and turn-by-turn session logic for the
//! CareBeacon visit-coordination app. The UI shell owns rendering, speech,
//! and the realtime stores; this crate models routes and emits events.

pub mod geo;
pub mod polyline;
pub mod route;
pub mod directions;
pub mod geocode;
pub mod places;
pub mod session;
