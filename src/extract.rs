use std::fmt;

use serde_json::{Number, Value};

use crate::bbox::is_global_bbox;
use crate::scan::value_text;
use crate::schema::Field;
use crate::tags::pdf_tag;

/// A single spreadsheet cell value, keeping numbers and booleans typed the way
/// they appeared in the source document.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(Number),
    Bool(bool),
}

impl CellValue {
    /// Pass-through conversion for raw JSON values. Nested structures are kept
    /// as their compact JSON text.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => CellValue::Empty,
            Some(Value::String(s)) => CellValue::Text(s.clone()),
            Some(Value::Number(n)) => CellValue::Number(n.clone()),
            Some(Value::Bool(b)) => CellValue::Bool(*b),
            Some(other) => CellValue::Text(other.to_string()),
        }
    }

    /// Length of the displayed text, in characters.
    pub fn display_len(&self) -> usize {
        match self {
            CellValue::Empty => 0,
            CellValue::Text(s) => s.chars().count(),
            other => other.to_string().chars().count(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

/// One hazard layer flattened into report fields.
///
/// Every field is always populated; fields outside the active column schema
/// are simply not rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRow {
    pub name: String,
    pub title: String,
    pub abstract_text: String,
    pub queryable: CellValue,
    pub crs: String,
    pub west_bound: CellValue,
    pub east_bound: CellValue,
    pub north_bound: CellValue,
    pub south_bound: CellValue,
    /// Drives row highlighting; rendered as "Yes"/"No" under `is_global`.
    pub global: bool,
    pub pdf_v2: String,
    pub style_names: String,
    pub keyword_list: String,
}

impl ExtractedRow {
    pub fn is_global_label(&self) -> &'static str {
        if self.global {
            "Yes"
        } else {
            "No"
        }
    }

    /// Value rendered for `field`.
    pub fn cell(&self, field: Field) -> CellValue {
        match field {
            Field::Name => self.name.as_str().into(),
            Field::Title => self.title.as_str().into(),
            Field::Abstract => self.abstract_text.as_str().into(),
            Field::Queryable => self.queryable.clone(),
            Field::Crs => self.crs.as_str().into(),
            Field::WestBound => self.west_bound.clone(),
            Field::EastBound => self.east_bound.clone(),
            Field::NorthBound => self.north_bound.clone(),
            Field::SouthBound => self.south_bound.clone(),
            Field::IsGlobal => self.is_global_label().into(),
            Field::PdfV2 => self.pdf_v2.as_str().into(),
            Field::StyleNames => self.style_names.as_str().into(),
            Field::KeywordList => self.keyword_list.as_str().into(),
        }
    }
}

/// Flattens a matched layer object into an [`ExtractedRow`].
///
/// Missing or oddly shaped sub-structures fall back to empty values.
pub fn extract_row(layer: &Value) -> ExtractedRow {
    let bbox = layer
        .get("ex_geographic_bounding_box")
        .filter(|b| b.is_object());
    let bound = |key: &str| bbox.and_then(|b| b.get(key)).unwrap_or(&Value::Null);

    let west = bound("west_bound_longitude");
    let east = bound("east_bound_longitude");
    let north = bound("north_bound_latitude");
    let south = bound("south_bound_latitude");

    let keywords: &[Value] = layer
        .get("keyword_list")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    ExtractedRow {
        name: string_field(layer, "name"),
        title: string_field(layer, "title"),
        abstract_text: string_field(layer, "abstract").trim().to_string(),
        queryable: CellValue::from_json(layer.get("queryable")),
        crs: joined_field(layer, "CRS"),
        west_bound: CellValue::from_json(Some(west)),
        east_bound: CellValue::from_json(Some(east)),
        north_bound: CellValue::from_json(Some(north)),
        south_bound: CellValue::from_json(Some(south)),
        global: is_global_bbox(west, east, north, south),
        pdf_v2: pdf_tag(keywords),
        style_names: style_names(layer),
        keyword_list: joined_field(layer, "keyword_list"),
    }
}

fn string_field(layer: &Value, key: &str) -> String {
    match layer.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(value) => value_text(value),
    }
}

/// Arrays are joined with ", "; any other non-null value is stringified.
fn joined_field(layer: &Value, key: &str) -> String {
    match layer.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::Array(items)) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
        Some(other) => value_text(other),
    }
}

fn style_names(layer: &Value) -> String {
    let Some(styles) = layer.get("style").and_then(Value::as_array) else {
        return String::new();
    };
    styles
        .iter()
        .filter(|s| s.is_object())
        .map(|s| string_field(s, "name"))
        .collect::<Vec<_>>()
        .join(", ")
}
