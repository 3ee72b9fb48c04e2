//! Turn-by-turn navigation session.
//!
//! Owns the per-navigation state the UI layer used to scatter across
//! component state: the active route, the current step index, which steps
//! have been announced, and the last spoken instruction. One session is
//! constructed per navigation start and discarded on stop or arrival.
//!
//! The session never speaks or renders; it returns `NavEvent` values and
//! the shell decides what to do with them (including dropping announcements
//! when voice is muted).

use std::collections::HashSet;

use tracing::debug;

use crate::geo::{distance_m, GeoPoint};
use crate::route::{effective_instruction, next_instruction, EffectiveInstruction, Route};

/// A step counts as completed when the fix is this close to its end and
/// closer to the end than to the start.
const ADVANCE_THRESHOLD_M: f64 = 150.0;

/// Arrival radius around the destination once all steps are done.
const ARRIVAL_THRESHOLD_M: f64 = 50.0;

/// Camera look-ahead along the heading, in degrees (~89 m).
const LOOK_AHEAD_DEG: f64 = 0.0008;

/// What the shell should do in response to a position update.
#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    /// Speak (or display) an instruction.
    Announce(String),
    /// The current step index moved forward.
    StepAdvanced(usize),
    /// Past the last step and inside the arrival radius.
    Arrived,
}

#[derive(Debug, Clone)]
pub struct NavigationSession {
    route: Route,
    current_step: usize,
    announced: HashSet<usize>,
    last_instruction: Option<String>,
}

impl NavigationSession {
    /// Starts a session over a freshly fetched route. The returned events
    /// carry the opening announcements.
    pub fn start(route: Route) -> (Self, Vec<NavEvent>) {
        let mut session = Self {
            route,
            current_step: 0,
            announced: HashSet::new(),
            last_instruction: None,
        };

        let mut events = vec![NavEvent::Announce("Navigation started.".to_string())];
        if !session.route.steps.is_empty() {
            let opening = effective_instruction(&session.route.steps, 0);
            events.push(NavEvent::Announce(opening.instruction));
            session.announced.insert(0);
        }

        (session, events)
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// The banner for the current position: merged instruction plus the
    /// maneuver tag driving the arrow icon.
    pub fn current_banner(&self) -> EffectiveInstruction {
        effective_instruction(&self.route.steps, self.current_step)
    }

    /// Preview of the maneuver after the current one.
    pub fn next_preview(&self) -> Option<EffectiveInstruction> {
        next_instruction(&self.route.steps, self.current_step)
    }

    /// Feeds one location fix through the step-advancement rule.
    ///
    /// Steps complete in order: from the current step forward, a step is
    /// done when the fix is within the advance threshold of its end and
    /// closer to the end than the start; the scan stops at the first step
    /// that is not. Newly reached steps are announced once, with a repeat
    /// guard on the exact instruction text.
    pub fn update_position(&mut self, fix: GeoPoint) -> Vec<NavEvent> {
        let mut events = Vec::new();
        let start_index = self.current_step;
        let mut index = self.current_step;

        for i in index..self.route.steps.len() {
            let step = &self.route.steps[i];
            let dist_to_end = distance_m(fix, step.end);
            let dist_to_start = distance_m(fix, step.start);
            debug!(step = i, dist_to_end, dist_to_start, "step proximity");

            if dist_to_end < ADVANCE_THRESHOLD_M && dist_to_end < dist_to_start {
                index = i + 1;
                if index < self.route.steps.len() && !self.announced.contains(&index) {
                    let next_step = &self.route.steps[index];
                    let instruction = if next_step.is_straight() {
                        effective_instruction(&self.route.steps, index).instruction
                    } else {
                        next_step.instruction.clone()
                    };
                    if self.last_instruction.as_deref() != Some(instruction.as_str()) {
                        events.push(NavEvent::Announce(instruction.clone()));
                        self.last_instruction = Some(instruction);
                    }
                    self.announced.insert(index);
                }
            } else {
                break;
            }
        }

        self.current_step = index;
        if index != start_index {
            events.push(NavEvent::StepAdvanced(index));
        }

        if index >= self.route.steps.len()
            && distance_m(fix, self.route.destination) < ARRIVAL_THRESHOLD_M
        {
            events.push(NavEvent::Arrived);
        }

        events
    }

    /// Swaps in a re-fetched route (the periodic traffic refresh),
    /// re-deriving the step index from the fix and re-announcing from the
    /// new position.
    pub fn apply_reroute(&mut self, route: Route, fix: GeoPoint) -> Vec<NavEvent> {
        let mut index = 0;
        for (i, step) in route.steps.iter().enumerate() {
            let dist_to_end = distance_m(fix, step.end);
            let dist_to_start = distance_m(fix, step.start);
            debug!(step = i, dist_to_end, dist_to_start, "reroute proximity");
            if dist_to_end < ADVANCE_THRESHOLD_M && dist_to_end < dist_to_start {
                index = i + 1;
            } else {
                break;
            }
        }

        self.route = route;
        self.current_step = index;
        self.announced.clear();

        let mut events = Vec::new();
        if index < self.route.steps.len() {
            let opening = effective_instruction(&self.route.steps, index);
            events.push(NavEvent::Announce(opening.instruction));
            self.announced.insert(index);
        }
        events
    }
}

/// Edge trigger for the "arriving soon" notification: fires only when the
/// ETA crosses from above the threshold to at-or-below it. Seeded at zero
/// so a route that starts short never fires.
#[derive(Debug, Clone)]
pub struct EtaMonitor {
    threshold_minutes: f64,
    previous_minutes: f64,
}

impl Default for EtaMonitor {
    fn default() -> Self {
        Self {
            threshold_minutes: 5.0,
            previous_minutes: 0.0,
        }
    }
}

impl EtaMonitor {
    pub fn new(threshold_minutes: f64) -> Self {
        Self {
            threshold_minutes,
            previous_minutes: 0.0,
        }
    }

    /// Records an ETA observation; true exactly when the threshold was
    /// just crossed downward.
    pub fn observe(&mut self, eta_minutes: f64) -> bool {
        let crossed = eta_minutes <= self.threshold_minutes
            && self.previous_minutes > self.threshold_minutes;
        self.previous_minutes = eta_minutes;
        crossed
    }
}

/// Camera center slightly ahead of the fix along the heading, so the
/// vehicle marker sits in the lower part of the viewport. The longitude
/// offset is corrected for meridian convergence; at the poles the fix is
/// returned unchanged.
pub fn look_ahead_camera(fix: GeoPoint, heading_deg: f64) -> GeoPoint {
    let heading_rad = heading_deg.to_radians();
    let lat_offset = LOOK_AHEAD_DEG * heading_rad.cos();
    let lng_offset = LOOK_AHEAD_DEG * heading_rad.sin() / fix.latitude().to_radians().cos();
    GeoPoint::new(fix.latitude() + lat_offset, fix.longitude() + lng_offset).unwrap_or(fix)
}
