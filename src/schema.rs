use crate::bbox::{GLOBAL_LAT_THRESHOLD, GLOBAL_LON_THRESHOLD};
use crate::extract::ExtractedRow;
use crate::tags::{tag_sort_key, TagSortKey, NO_PDF_LABEL, PDF_HAZARD_PREFIX};

/// Fields of an [`ExtractedRow`] that can be rendered as a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Title,
    Abstract,
    Queryable,
    Crs,
    WestBound,
    EastBound,
    NorthBound,
    SouthBound,
    IsGlobal,
    PdfV2,
    StyleNames,
    KeywordList,
}

impl Field {
    pub fn key(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Title => "title",
            Field::Abstract => "abstract",
            Field::Queryable => "queryable",
            Field::Crs => "crs",
            Field::WestBound => "west_bound",
            Field::EastBound => "east_bound",
            Field::NorthBound => "north_bound",
            Field::SouthBound => "south_bound",
            Field::IsGlobal => "is_global",
            Field::PdfV2 => "pdf_v2",
            Field::StyleNames => "style_names",
            Field::KeywordList => "keyword_list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub field: Field,
    pub label: &'static str,
}

impl Column {
    pub const fn new(field: Field, label: &'static str) -> Self {
        Self { field, label }
    }
}

pub const BASE_COLUMNS: [Column; 12] = [
    Column::new(Field::Name, "Layer Name"),
    Column::new(Field::Title, "Title"),
    Column::new(Field::Abstract, "Abstract"),
    Column::new(Field::Queryable, "Queryable"),
    Column::new(Field::Crs, "CRS"),
    Column::new(Field::WestBound, "West Bound Lon"),
    Column::new(Field::EastBound, "East Bound Lon"),
    Column::new(Field::NorthBound, "North Bound Lat"),
    Column::new(Field::SouthBound, "South Bound Lat"),
    Column::new(Field::IsGlobal, "Is Global"),
    Column::new(Field::StyleNames, "Style Name(s)"),
    Column::new(Field::KeywordList, "Keywords"),
];

/// Ordered columns rendered in each document sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    columns: Vec<Column>,
}

impl ColumnSchema {
    pub fn base() -> Self {
        Self {
            columns: BASE_COLUMNS.to_vec(),
        }
    }

    /// Base schema with the extension's column right after "Is Global".
    pub fn extended(extension: &dyn TagExtension) -> Self {
        let mut schema = Self::base();
        schema.insert_after(Field::IsGlobal, extension.column());
        schema
    }

    pub fn for_extension(extension: Option<&dyn TagExtension>) -> Self {
        match extension {
            Some(ext) => Self::extended(ext),
            None => Self::base(),
        }
    }

    /// Inserts `column` after `anchor`, or appends when `anchor` is absent.
    pub fn insert_after(&mut self, anchor: Field, column: Column) {
        let idx = self
            .columns
            .iter()
            .position(|c| c.field == anchor)
            .map(|i| i + 1)
            .unwrap_or(self.columns.len());
        self.columns.insert(idx, column);
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.label)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Legend entry explaining one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub name: String,
    pub description: String,
}

impl ColumnDescription {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Legend entry name after which an extension's description is spliced in.
pub const GLOBAL_COLUMN_NAME: &str = "Is Global";

pub fn base_column_descriptions() -> Vec<ColumnDescription> {
    vec![
        ColumnDescription::new(
            "Layer Name",
            "The WMS layer identifier (e.g. GRAPHRASTER:fires_final).",
        ),
        ColumnDescription::new("Title", "Human-readable display name of the layer."),
        ColumnDescription::new(
            "Abstract",
            "Brief description of the layer's content or purpose.",
        ),
        ColumnDescription::new(
            "Queryable",
            "1 = layer supports GetFeatureInfo requests; 0 = display-only.",
        ),
        ColumnDescription::new(
            "CRS",
            "Comma-separated list of supported coordinate reference systems.",
        ),
        ColumnDescription::new(
            "West Bound Lon",
            "Western edge of the bounding box in decimal degrees (−180 to 180).",
        ),
        ColumnDescription::new(
            "East Bound Lon",
            "Eastern edge of the bounding box in decimal degrees (−180 to 180).",
        ),
        ColumnDescription::new(
            "North Bound Lat",
            "Northern edge of the bounding box in decimal degrees (−90 to 90).",
        ),
        ColumnDescription::new(
            "South Bound Lat",
            "Southern edge of the bounding box in decimal degrees (−90 to 90).",
        ),
        ColumnDescription::new(
            GLOBAL_COLUMN_NAME,
            format!(
                "'Yes' when the layer's bbox spans ≥ {}° longitude AND ≥ {}° latitude, \
                 indicating worldwide coverage. 'No' for regional or country-level layers.",
                GLOBAL_LON_THRESHOLD, GLOBAL_LAT_THRESHOLD
            ),
        ),
        ColumnDescription::new(
            "Style Name(s)",
            "Comma-separated WMS style names available for this layer.",
        ),
        ColumnDescription::new(
            "Keywords",
            "Full keyword_list from the capabilities document, comma-separated.",
        ),
    ]
}

/// Optional secondary classification surfaced as an extra column.
///
/// The row extractor always computes the tag; an extension decides whether
/// and how it appears in sheets, the legend, and summaries.
pub trait TagExtension {
    fn column(&self) -> Column;

    fn description(&self) -> ColumnDescription;

    fn tag<'r>(&self, row: &'r ExtractedRow) -> &'r str;

    fn sort_key(&self, tag: &str) -> TagSortKey;

    /// Suffix added to report file names.
    fn file_suffix(&self) -> &'static str;
}

/// The PDF V2 category taken from `pdf:hazardlookup:<tag>` keywords.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTagExtension;

impl TagExtension for PdfTagExtension {
    fn column(&self) -> Column {
        Column::new(Field::PdfV2, "PDF V2")
    }

    fn description(&self) -> ColumnDescription {
        ColumnDescription::new(
            "PDF V2",
            format!(
                "Suffix extracted from the '{}<keyword>' entry in the keyword_list \
                 (e.g. 'local', 'global:risk', 'global:additional'). \
                 Shows '{}' when no such keyword is present.",
                PDF_HAZARD_PREFIX, NO_PDF_LABEL
            ),
        )
    }

    fn tag<'r>(&self, row: &'r ExtractedRow) -> &'r str {
        &row.pdf_v2
    }

    fn sort_key(&self, tag: &str) -> TagSortKey {
        tag_sort_key(tag)
    }

    fn file_suffix(&self) -> &'static str {
        "_pdf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn base_schema_has_no_tag_column() {
        let schema = ColumnSchema::base();
        assert_eq!(schema.len(), 12);
        assert!(schema.columns().iter().all(|c| c.field != Field::PdfV2));
    }

    #[test]
    fn extended_schema_inserts_after_is_global() {
        let schema = ColumnSchema::extended(&PdfTagExtension);
        let keys: Vec<_> = schema.columns().iter().map(|c| c.field.key()).collect();
        assert_eq!(
            keys,
            vec![
                "name",
                "title",
                "abstract",
                "queryable",
                "crs",
                "west_bound",
                "east_bound",
                "north_bound",
                "south_bound",
                "is_global",
                "pdf_v2",
                "style_names",
                "keyword_list",
            ]
        );
    }

    #[test]
    fn insert_after_missing_anchor_appends() {
        let mut schema = ColumnSchema::base();
        schema.insert_after(Field::PdfV2, Column::new(Field::Title, "Again"));
        assert_eq!(schema.labels().last(), Some("Again"));
    }

    #[test]
    fn descriptions_match_base_labels() {
        let names: Vec<_> = base_column_descriptions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        let labels: Vec<_> = ColumnSchema::base().labels().map(String::from).collect();
        assert_eq!(names, labels);
    }
}
