#![allow(dead_code)]

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use serde_json::{json, Value};

use harvester::{CellValue, HarvestConfig, HarvestMode};

pub const TIMESTAMP: &str = "20240101_120000";

pub fn test_config(root: &Path, mode: HarvestMode) -> HarvestConfig {
    let mut config = HarvestConfig::new(root, mode);
    config.timestamp = TIMESTAMP.to_string();
    config
}

/// A trimmed-down capabilities document: two hazard layers nested inside the
/// layer tree, one regional and one global, plus an unrelated base layer.
pub fn sample_capabilities() -> Value {
    json!({
        "version": "1.3.0",
        "service": { "name": "WMS", "title": "Hazard maps" },
        "capability": {
            "layer": {
                "title": "Root",
                "keyword_list": ["root"],
                "layer": [
                    {
                        "name": "GRAPHRASTER:fires_final",
                        "title": "Fires",
                        "abstract": "  Active fire detections  ",
                        "queryable": 1,
                        "CRS": ["EPSG:4326", "EPSG:3857"],
                        "ex_geographic_bounding_box": {
                            "west_bound_longitude": 20,
                            "east_bound_longitude": 30.5,
                            "north_bound_latitude": 48,
                            "south_bound_latitude": 43.5
                        },
                        "style": [{ "name": "default" }],
                        "keyword_list": ["HazardLookup", "pdf:hazardlookup:Local"]
                    },
                    {
                        "name": "GRAPHRASTER:quakes",
                        "title": "Earthquakes",
                        "queryable": 0,
                        "CRS": ["EPSG:4326"],
                        "ex_geographic_bounding_box": {
                            "west_bound_longitude": -180,
                            "east_bound_longitude": 180,
                            "north_bound_latitude": 90,
                            "south_bound_latitude": -90
                        },
                        "style": [{ "name": "default" }, { "name": "intensity" }],
                        "keyword_list": ["hazardlookup", "pdf:hazardlookup:global:risk"]
                    },
                    {
                        "name": "basemap",
                        "title": "Base map",
                        "keyword_list": ["basemap"]
                    }
                ]
            }
        }
    })
}

pub fn write_json(path: &Path, value: &Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// Text shown for a cell read back from an xlsx file.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Text a [`CellValue`] should read back as.
pub fn expected_text(value: &CellValue) -> String {
    value.to_string()
}

pub fn sheet_names(path: &Path) -> Vec<String> {
    let workbook: Xlsx<_> = open_workbook(path).expect("open workbook");
    workbook.sheet_names().to_vec()
}

/// All rows of a worksheet as display text, padded to equal width.
pub fn read_sheet(path: &Path, name: &str) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("open workbook");
    let range = workbook
        .worksheet_range(name)
        .unwrap_or_else(|e| panic!("missing sheet {}: {}", name, e));
    range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect()
}
