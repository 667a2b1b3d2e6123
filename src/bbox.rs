use serde_json::Value;

/// Minimum longitude span, in degrees, for a layer to count as global.
pub const GLOBAL_LON_THRESHOLD: f64 = 340.0;
/// Minimum latitude span, in degrees, for a layer to count as global.
pub const GLOBAL_LAT_THRESHOLD: f64 = 120.0;

/// Geographic extent of a layer in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub east: f64,
    pub north: f64,
    pub south: f64,
}

impl BoundingBox {
    /// Builds a box from raw JSON bounds. Returns `None` if any bound is
    /// missing or not numeric.
    pub fn from_values(west: &Value, east: &Value, north: &Value, south: &Value) -> Option<Self> {
        Some(Self {
            west: coerce_f64(west)?,
            east: coerce_f64(east)?,
            north: coerce_f64(north)?,
            south: coerce_f64(south)?,
        })
    }

    /// `east - west`. Not normalized across the antimeridian, so inverted
    /// boxes yield a negative span.
    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn is_global(&self) -> bool {
        self.lon_span() >= GLOBAL_LON_THRESHOLD && self.lat_span() >= GLOBAL_LAT_THRESHOLD
    }
}

/// True when the four bounds describe (near) worldwide coverage.
///
/// Never fails: a missing or non-numeric bound classifies the layer as
/// regional.
pub fn is_global_bbox(west: &Value, east: &Value, north: &Value, south: &Value) -> bool {
    BoundingBox::from_values(west, east, north, south)
        .map(|bbox| bbox.is_global())
        .unwrap_or(false)
}

/// Float conversion for a bound: JSON numbers, or strings holding a number.
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
