//! Normalization of heterogeneous upstream station records.
//!
//! The station directory is not consistent about its record shape: the label
//! may arrive as `stationName` or `name`, the station code as `codeName`,
//! `codeNumber`, or `id`, and coordinates either as a two-element `coords`
//! array or as separate `latitude`/`longitude` (or `lat`/`lng`) scalars that
//! may themselves be numbers or strings with thousands separators. Some
//! records additionally ship the array as `[lng, lat]`. Everything funnels
//! through this module into one canonical shape before the rest of the crate
//! sees it.

use crate::models::LatLng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A station record as the directory returns it, aliases and all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawStationRecord {
    pub id: Option<Value>,
    pub name: Option<String>,
    pub station_name: Option<String>,
    pub code_name: Option<Value>,
    pub code_number: Option<Value>,
    pub coords: Option<Vec<Value>>,
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
    pub lat: Option<Value>,
    pub lng: Option<Value>,
}

impl RawStationRecord {
    /// Decode a record from raw JSON, ignoring fields we do not know.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// Display label: the canonical station-name field wins over the generic one.
pub fn station_label(record: &RawStationRecord) -> &str {
    record
        .station_name
        .as_deref()
        .or(record.name.as_deref())
        .unwrap_or("")
}

/// Station code for detail lookups: `codeName`, then `codeNumber`, then `id`.
pub fn station_code(record: &RawStationRecord) -> Option<String> {
    [&record.code_name, &record.code_number, &record.id]
        .into_iter()
        .flatten()
        .find_map(value_to_code)
}

fn value_to_code(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse one coordinate component: a finite JSON number, or a string with
/// thousands separators stripped.
pub fn parse_coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let sanitized = s.replace(',', "");
            let parsed: f64 = sanitized.trim().parse().ok()?;
            parsed.is_finite().then_some(parsed)
        }
        _ => None,
    }
}

/// Decide which component is latitude.
///
/// The upstream axis order is unreliable; some records are `[lng, lat]`. If
/// the first magnitude cannot be a latitude but the second can, swap.
/// Best-effort only: two small swapped values go undetected, which is a
/// data-quality issue upstream, not something this heuristic can fix.
pub fn orient_axes(v1: f64, v2: f64) -> (f64, f64) {
    if v1.abs() > 90.0 && v2.abs() <= 90.0 {
        (v2, v1)
    } else {
        (v1, v2)
    }
}

/// Extract range-valid coordinates from a record, or `None`.
///
/// The `coords` array shape is preferred; separate scalar fields are the
/// fallback. Either way the axis-swap heuristic and the range check apply.
pub fn extract_coords(record: &RawStationRecord) -> Option<LatLng> {
    if let Some(coords) = record.coords.as_deref() {
        if coords.len() >= 2 {
            if let (Some(v1), Some(v2)) =
                (parse_coordinate(&coords[0]), parse_coordinate(&coords[1]))
            {
                return checked(v1, v2);
            }
        }
    }

    let lat_raw = record.latitude.as_ref().or(record.lat.as_ref())?;
    let lng_raw = record.longitude.as_ref().or(record.lng.as_ref())?;
    let v1 = parse_coordinate(lat_raw)?;
    let v2 = parse_coordinate(lng_raw)?;
    checked(v1, v2)
}

fn checked(v1: f64, v2: f64) -> Option<LatLng> {
    let (lat, lng) = orient_axes(v1, v2);
    let point = LatLng::new(lat, lng);
    point.is_valid().then_some(point)
}

/// Case-insensitive, trimmed form used for exact-match comparison.
pub fn normalize_name(value: &str) -> String {
    value.trim().to_lowercase()
}
