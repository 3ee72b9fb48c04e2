//! Owned route model and voice-instruction shaping.
//!
//! The directions adapter normalizes the wire response into `Route` at the
//! boundary; everything here works on the owned model. Instruction text is
//! shaped for speech: HTML stripped, distances in feet/miles, runs of
//! straight steps merged into a single announcement.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::polyline::Polyline;

/// One maneuver leg of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub start: GeoPoint,
    pub end: GeoPoint,
    /// Step length in meters.
    pub distance_m: i32,
    pub duration_s: i32,
    /// Human-readable step length as the API rendered it ("0.3 mi").
    pub distance_text: String,
    /// Plain-text instruction (HTML already stripped).
    pub instruction: String,
    /// Maneuver tag ("turn-left", "merge", ...); absent for plain segments.
    pub maneuver: Option<String>,
}

impl RouteStep {
    /// Whether this step continues the current road rather than turning.
    /// Unlabeled steps and "toward" hints count as straight.
    pub fn is_straight(&self) -> bool {
        match self.maneuver.as_deref() {
            None | Some("") => true,
            Some(m) => {
                let m = m.to_lowercase();
                m == "straight" || m.contains("toward")
            }
        }
    }
}

/// One directions response, held for the duration of a navigation or
/// display session and discarded on re-route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub polyline: Polyline,
    pub steps: Vec<RouteStep>,
    pub destination: GeoPoint,
    pub distance_m: i32,
    pub duration_s: i32,
    /// Traffic-adjusted duration when the API was asked for one.
    pub duration_in_traffic_s: Option<i32>,
    /// Display ETA as the API rendered it ("23 mins").
    pub eta_text: String,
}

impl Route {
    /// Travel time in seconds, preferring the traffic-adjusted figure.
    pub fn eta_seconds(&self) -> i32 {
        self.duration_in_traffic_s.unwrap_or(self.duration_s)
    }

    pub fn eta_minutes(&self) -> f64 {
        self.eta_seconds() as f64 / 60.0
    }
}

/// A speech-ready instruction covering one or more merged steps.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveInstruction {
    pub instruction: String,
    pub distance_text: String,
    /// Maneuver of the turn the instruction leads into; "destination" when
    /// the merged run reaches the end of the route.
    pub maneuver: String,
}

/// Drops `<...>` tag runs from API instruction HTML.
pub fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Formats a distance for announcements: feet rounded to tens under
/// 1,000 ft, miles to one decimal beyond.
pub fn format_distance(meters: f64) -> String {
    let feet = meters * 3.28084;
    if feet < 1000.0 {
        format!("{} ft", ((feet / 10.0).round() as i64) * 10)
    } else {
        format!("{:.1} mi", feet / 5280.0)
    }
}

/// Pulls the road name out of an instruction ("Turn left onto Main St"
/// => "Main St"); empty when no road is named.
pub fn extract_next_road(instruction: &str) -> &str {
    let lower = instruction.to_lowercase();
    // Indexes into `lower` only line up with `instruction` for ASCII text.
    if let Some(idx) = lower.find("onto") {
        instruction.get(idx + 4..).unwrap_or("").trim()
    } else if let Some(idx) = lower.find("at ") {
        instruction.get(idx + 3..).unwrap_or("").trim()
    } else {
        ""
    }
}

/// The announcement for the step at `index`, merging any run of straight
/// steps ahead of the next turn into a single "Continue straight for ..."
/// instruction.
pub fn effective_instruction(steps: &[RouteStep], index: usize) -> EffectiveInstruction {
    if index >= steps.len() {
        return EffectiveInstruction {
            instruction: "Follow the route".to_string(),
            distance_text: String::new(),
            maneuver: String::new(),
        };
    }

    let mut current = index;
    let mut merged_m = 0.0;

    while current < steps.len() {
        let step = &steps[current];
        if step.is_straight() {
            merged_m += step.distance_m as f64;
            current += 1;
        } else {
            if merged_m == 0.0 {
                // The step itself is the turn; announce it as-is.
                break;
            }
            let next_road = extract_next_road(&step.instruction);
            let until = if next_road.is_empty() {
                String::new()
            } else {
                format!(" until {}", next_road)
            };
            return EffectiveInstruction {
                instruction: format!(
                    "Continue straight for {}{}, then {}",
                    format_distance(merged_m),
                    until,
                    step.instruction.to_lowercase()
                ),
                distance_text: format_distance(merged_m),
                maneuver: step.maneuver.clone().unwrap_or_default().to_lowercase(),
            };
        }
    }

    if merged_m > 0.0 {
        EffectiveInstruction {
            instruction: format!(
                "Continue straight for {} to your destination",
                format_distance(merged_m)
            ),
            distance_text: format_distance(merged_m),
            maneuver: "destination".to_string(),
        }
    } else {
        // No straights to merge; announce the step as-is.
        let step = &steps[index];
        EffectiveInstruction {
            instruction: step.instruction.clone(),
            distance_text: step.distance_text.clone(),
            maneuver: step.maneuver.clone().unwrap_or_default(),
        }
    }
}

/// Preview of the maneuver after `index`, for the secondary banner.
pub fn next_instruction(steps: &[RouteStep], index: usize) -> Option<EffectiveInstruction> {
    let next = steps.get(index + 1)?;
    Some(EffectiveInstruction {
        instruction: format!("Then: {}", next.instruction),
        distance_text: next.distance_text.clone(),
        maneuver: next.maneuver.clone().unwrap_or_default(),
    })
}
