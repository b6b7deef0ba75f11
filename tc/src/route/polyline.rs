//! Encoded polyline decoding and distance-based sampling
//!
//! Polylines use the Google encoded polyline format (precision 1e5). Sampling
//! picks points evenly spaced by along-path distance, so a dense urban stretch
//! gets no more samples than an empty highway of the same length.

use serde::Serialize;
use tracing::debug;

use super::{GeoPoint, RouteError};

const PRECISION: f64 = 1e5;

/// Decode an encoded polyline into points
pub fn decode(encoded: &str) -> Result<Vec<GeoPoint>, RouteError> {
    debug!(len = encoded.len(), "decode: called");
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;

    while index < bytes.len() {
        let start = index;
        lat = lat.checked_add(next_value(bytes, &mut index)?).ok_or_else(|| overflow(start))?;
        lon = lon.checked_add(next_value(bytes, &mut index)?).ok_or_else(|| overflow(start))?;

        let point = GeoPoint::new(lat as f64 / PRECISION, lon as f64 / PRECISION);
        if !(-90.0..=90.0).contains(&point.lat) || !(-180.0..=180.0).contains(&point.lon) {
            return Err(RouteError::InvalidPolyline {
                position: start,
                reason: format!("coordinate out of range ({point})"),
            });
        }
        points.push(point);
    }

    debug!(points = points.len(), "decode: done");
    Ok(points)
}

fn overflow(position: usize) -> RouteError {
    RouteError::InvalidPolyline {
        position,
        reason: "coordinate overflow".to_string(),
    }
}

fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, RouteError> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(RouteError::InvalidPolyline {
                position: *index,
                reason: "truncated value".to_string(),
            });
        };

        let chunk = i64::from(byte) - 63;
        if !(0..64).contains(&chunk) {
            return Err(RouteError::InvalidPolyline {
                position: *index,
                reason: format!("invalid character {:?}", byte as char),
            });
        }
        *index += 1;

        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
        if shift > 60 {
            return Err(RouteError::InvalidPolyline {
                position: *index,
                reason: "value too long".to_string(),
            });
        }
    }

    Ok(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}

/// Encode points as a polyline
pub fn encode(points: &[GeoPoint]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lon: i64 = 0;

    for point in points {
        let lat = (point.lat * PRECISION).round() as i64;
        let lon = (point.lon * PRECISION).round() as i64;
        encode_value(lat - prev_lat, &mut out);
        encode_value(lon - prev_lon, &mut out);
        prev_lat = lat;
        prev_lon = lon;
    }

    out
}

fn encode_value(delta: i64, out: &mut String) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while value >= 0x20 {
        out.push(char::from((0x20 | (value & 0x1f)) as u8 + 63));
        value >>= 5;
    }
    out.push(char::from(value as u8 + 63));
}

/// A point chosen from a decoded path
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplePoint {
    pub point: GeoPoint,
    /// Cumulative distance from the start of the path
    pub offset_km: f64,
    /// Index into the decoded path
    pub index: usize,
}

/// Running along-path distance for each point; first entry is 0
pub fn cumulative_distances(points: &[GeoPoint]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(points.len());
    let mut total = 0.0;
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            total += points[i - 1].distance_km(point);
        }
        cumulative.push(total);
    }
    cumulative
}

/// Number of samples for a path of `total_km`
///
/// `min(max_samples, max(2, floor(total / interval) + 1))`, or 1 for a zero-length path.
/// A non-positive interval places no distance constraint.
pub fn sample_count(total_km: f64, interval_km: f64, max_samples: usize) -> usize {
    let max_samples = max_samples.max(1);
    if total_km <= 0.0 {
        return 1;
    }

    let by_distance = if interval_km > 0.0 {
        let n = (total_km / interval_km).floor() + 1.0;
        if n >= max_samples as f64 { max_samples } else { n as usize }
    } else {
        max_samples
    };

    by_distance.max(2).min(max_samples)
}

/// Choose evenly spaced sample points along a decoded path
///
/// For each of `k` target offsets spread over `[0, total]` the first point
/// whose cumulative distance reaches the target is selected. Targets are
/// non-decreasing so a single forward scan suffices.
pub fn sample_points(points: &[GeoPoint], interval_km: f64, max_samples: usize) -> Result<Vec<SamplePoint>, RouteError> {
    debug!(points = points.len(), %interval_km, %max_samples, "sample_points: called");
    if points.is_empty() {
        return Err(RouteError::MissingGeometry);
    }

    let cumulative = cumulative_distances(points);
    let total = cumulative[cumulative.len() - 1];
    let k = sample_count(total, interval_km, max_samples);
    debug!(%total, %k, "sample_points: computed sample count");

    if k == 1 {
        return Ok(vec![SamplePoint {
            point: points[0],
            offset_km: 0.0,
            index: 0,
        }]);
    }

    let last = points.len() - 1;
    let mut samples = Vec::with_capacity(k);
    let mut j = 0;
    for i in 0..k {
        let target = if i == k - 1 {
            total
        } else {
            total * i as f64 / (k - 1) as f64
        };
        while j < last && cumulative[j] < target {
            j += 1;
        }
        samples.push(SamplePoint {
            point: points[j],
            offset_km: cumulative[j],
            index: j,
        });
    }

    Ok(samples)
}

/// Decodes a route polyline and reduces it to evenly spaced samples
#[derive(Debug, Clone, Copy)]
pub struct PolylineSampler {
    pub interval_km: f64,
    pub max_samples: usize,
}

impl PolylineSampler {
    pub fn new(interval_km: f64, max_samples: usize) -> Self {
        Self {
            interval_km,
            max_samples,
        }
    }

    /// Decode `encoded` and sample it
    pub fn sample(&self, encoded: &str) -> Result<Vec<SamplePoint>, RouteError> {
        let points = decode(encoded)?;
        sample_points(&points, self.interval_km, self.max_samples)
    }
}
