//! Route geometry and the encoded-polyline codec.
//!
//! The directions API ships geometry as a compact ASCII string (signed
//! deltas, five bits per character, zig-zag sign). Decoding happens here at
//! the boundary; the rest of the crate only sees decoded coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// A route geometry as an ordered sequence of decoded coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<GeoPoint>,
}

/// An encoded polyline that cannot be consumed under the continuation-bit
/// grammar: either the string ends mid-chunk or a byte is below the 63
/// offset. `offset` is the byte position of the offending chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MalformedPolyline {
    pub offset: usize,
}

impl fmt::Display for MalformedPolyline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed polyline chunk at byte {}", self.offset)
    }
}

impl std::error::Error for MalformedPolyline {}

impl Polyline {
    /// Creates a new Polyline from already-decoded coordinate points.
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    /// Decodes an encoded-polyline string into path-ordered points.
    ///
    /// The empty string decodes to an empty polyline. Coordinates are the
    /// running delta sums scaled by 1e-5, the fixed-point convention of the
    /// encoding.
    pub fn decode(encoded: &str) -> Result<Self, MalformedPolyline> {
        let bytes = encoded.as_bytes();
        let mut cursor = 0;
        let mut lat: i64 = 0;
        let mut lng: i64 = 0;
        let mut points = Vec::new();

        while cursor < bytes.len() {
            lat += decode_delta(bytes, &mut cursor)? as i64;
            lng += decode_delta(bytes, &mut cursor)? as i64;
            points.push(GeoPoint::new(lat as f64 * 1e-5, lng as f64 * 1e-5).map_err(|_| {
                MalformedPolyline { offset: cursor }
            })?);
        }

        Ok(Self { points })
    }

    /// Encodes the points back into the compact ASCII form.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        let mut prev_lat: i64 = 0;
        let mut prev_lng: i64 = 0;

        for point in &self.points {
            let lat = (point.latitude() * 1e5).round() as i64;
            let lng = (point.longitude() * 1e5).round() as i64;
            encode_delta((lat - prev_lat) as i32, &mut out);
            encode_delta((lng - prev_lng) as i32, &mut out);
            prev_lat = lat;
            prev_lng = lng;
        }

        out
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<GeoPoint> {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Decodes one signed delta starting at `*cursor`, advancing it past the
/// consumed chunk.
///
/// Chunk accumulation uses a `u32` with wrapping shifts so pathological
/// long deltas reproduce the reference implementation's 32-bit bitwise
/// behavior exactly.
fn decode_delta(bytes: &[u8], cursor: &mut usize) -> Result<i32, MalformedPolyline> {
    let start = *cursor;
    let mut shift = 0u32;
    let mut result = 0u32;

    loop {
        let Some(&raw) = bytes.get(*cursor) else {
            return Err(MalformedPolyline { offset: start });
        };
        if raw < 63 {
            return Err(MalformedPolyline { offset: *cursor });
        }
        *cursor += 1;
        let value = (raw - 63) as u32;
        result |= (value & 0x1f).wrapping_shl(shift);
        shift += 5;
        if value & 0x20 == 0 {
            break;
        }
    }

    // Zig-zag: bit 0 carries the sign.
    let delta = if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    };
    Ok(delta as i32)
}

fn encode_delta(delta: i32, out: &mut String) {
    let mut value = ((delta << 1) ^ (delta >> 31)) as u32;
    loop {
        let mut chunk = (value & 0x1f) as u8;
        value >>= 5;
        if value != 0 {
            chunk |= 0x20;
        }
        out.push((chunk + 63) as char);
        if value == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    #[test]
    fn test_decode_empty_string() {
        let polyline = Polyline::decode("").unwrap();
        assert!(polyline.is_empty());
    }

    #[test]
    fn test_decode_single_point_reference() {
        let polyline = Polyline::decode("_p~iF~ps|U").unwrap();
        assert_eq!(polyline.points(), &[point(38.5, -120.2)]);
    }

    #[test]
    fn test_decode_reference_vector() {
        let polyline = Polyline::decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        assert_eq!(
            polyline.points(),
            &[
                point(38.5, -120.2),
                point(40.7, -120.95),
                point(43.252, -126.453),
            ]
        );
    }

    #[test]
    fn test_encode_reference_vector() {
        let polyline = Polyline::new(vec![
            point(38.5, -120.2),
            point(40.7, -120.95),
            point(43.252, -126.453),
        ]);
        assert_eq!(polyline.encode(), "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
    }

    #[test]
    fn test_round_trip() {
        let original = Polyline::new(vec![
            point(36.1147, -115.1728),
            point(36.1727, -115.1580),
            point(36.1215, -115.1739),
            point(-33.8675, 151.2070),
            point(0.0, 0.0),
        ]);
        let decoded = Polyline::decode(&original.encode()).unwrap();
        assert_eq!(decoded.len(), original.len());
        for (a, b) in original.points().iter().zip(decoded.points()) {
            assert!((a.latitude() - b.latitude()).abs() <= 1e-5);
            assert!((a.longitude() - b.longitude()).abs() <= 1e-5);
        }
    }

    #[test]
    fn test_truncated_chunk_is_malformed() {
        // A single byte with the continuation bit set and nothing after it.
        let err = Polyline::decode("_").unwrap_err();
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_truncated_second_coordinate_is_malformed() {
        // Valid latitude chunk, then a longitude chunk cut off mid-stream.
        assert!(Polyline::decode("_p~iF~ps").is_err());
    }

    #[test]
    fn test_byte_below_offset_is_malformed() {
        assert!(Polyline::decode("_p~iF\x1f").is_err());
    }

    #[test]
    fn test_into_points() {
        let points = vec![point(38.5, -120.2), point(40.7, -120.95)];
        let polyline = Polyline::new(points.clone());
        assert_eq!(polyline.into_points(), points);
    }
}
