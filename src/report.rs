use std::borrow::Cow;
use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatPattern, Workbook, Worksheet, XlsxError};
use tracing::{debug, warn};

use crate::error::Result;
use crate::extract::{CellValue, ExtractedRow};
use crate::logging::HARVEST_REPORT;
use crate::schema::{base_column_descriptions, ColumnDescription, ColumnSchema, GLOBAL_COLUMN_NAME};

pub const HEADER_FILL: u32 = 0x1F4E79;
pub const HEADER_FONT_COLOR: u32 = 0xFFFFFF;

/// Extra characters added to the widest cell of a column.
pub const COLUMN_PADDING: usize = 4;
pub const MAX_COLUMN_WIDTH: usize = 60;
/// Excel's limit on worksheet name length.
pub const MAX_SHEET_NAME_LEN: usize = 31;
pub const LEGEND_SHEET_NAME: &str = "Legend";
/// Excel's limit on the characters held by one cell.
pub const MAX_CELL_CHARS: usize = 32_767;

const LEGEND_WIDTHS: [f64; 3] = [22.0, 20.0, 70.0];

/// Background applied to a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFill {
    Global,
    Odd,
    Even,
}

impl RowFill {
    /// Global rows are always highlighted; other rows alternate by their
    /// 1-based position among data rows.
    pub fn for_row(global: bool, position: usize) -> Self {
        if global {
            RowFill::Global
        } else if position % 2 == 0 {
            RowFill::Even
        } else {
            RowFill::Odd
        }
    }

    pub fn rgb(&self) -> u32 {
        match self {
            RowFill::Global => 0xFFD700,
            RowFill::Odd => 0xD6E4F0,
            RowFill::Even => 0xFFFFFF,
        }
    }

    pub fn hex(&self) -> String {
        format!("{:06X}", self.rgb())
    }

    pub fn label(&self) -> &'static str {
        match self {
            RowFill::Global => "Global layer",
            RowFill::Odd => "Odd data row",
            RowFill::Even => "Even data row",
        }
    }

    pub fn meaning(&self) -> &'static str {
        match self {
            RowFill::Global => {
                "Row highlighted in yellow — bbox qualifies as worldwide coverage (Is Global = Yes)."
            }
            RowFill::Odd => {
                "Light blue alternating row — regional or country-level layer (Is Global = No)."
            }
            RowFill::Even => {
                "White alternating row — regional or country-level layer (Is Global = No)."
            }
        }
    }

    fn format(&self) -> Format {
        Format::new()
            .set_background_color(Color::RGB(self.rgb()))
            .set_pattern(FormatPattern::Solid)
    }
}

/// Width for a column: widest of label and cells plus padding, capped.
pub fn column_width<'a>(label: &str, cells: impl IntoIterator<Item = &'a CellValue>) -> usize {
    let widest = cells
        .into_iter()
        .map(CellValue::display_len)
        .fold(label.chars().count(), usize::max);
    (widest + COLUMN_PADDING).min(MAX_COLUMN_WIDTH)
}

/// Worksheet-safe name: invalid characters replaced, cut to 31 characters.
pub fn sheet_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned.to_string()
    }
}

/// One document's extracted rows laid out under a column schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    header: Vec<&'static str>,
    rows: Vec<Vec<CellValue>>,
    fills: Vec<RowFill>,
    widths: Vec<usize>,
}

impl Sheet {
    pub fn build(name: &str, rows: &[ExtractedRow], schema: &ColumnSchema) -> Self {
        let header: Vec<&'static str> = schema.labels().collect();
        let cells: Vec<Vec<CellValue>> = rows
            .iter()
            .map(|row| schema.columns().iter().map(|c| row.cell(c.field)).collect())
            .collect();
        let fills = rows
            .iter()
            .enumerate()
            .map(|(i, row)| RowFill::for_row(row.global, i + 1))
            .collect();
        let widths = header
            .iter()
            .enumerate()
            .map(|(col, label)| column_width(label, cells.iter().map(|r| &r[col])))
            .collect();

        Self {
            name: sheet_name(name),
            header,
            rows: cells,
            fills,
            widths,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &[&'static str] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn fills(&self) -> &[RowFill] {
        &self.fills
    }

    pub fn column_widths(&self) -> &[usize] {
        &self.widths
    }

    fn write_to(&self, ws: &mut Worksheet) -> std::result::Result<(), XlsxError> {
        ws.set_name(&self.name)?;

        let header_format = Format::new()
            .set_bold()
            .set_font_color(Color::RGB(HEADER_FONT_COLOR))
            .set_background_color(Color::RGB(HEADER_FILL))
            .set_pattern(FormatPattern::Solid)
            .set_align(FormatAlign::Center)
            .set_text_wrap();
        for (col, label) in self.header.iter().enumerate() {
            ws.write_string_with_format(0, col as u16, *label, &header_format)?;
        }

        for (i, (cells, fill)) in self.rows.iter().zip(&self.fills).enumerate() {
            let row = (i + 1) as u32;
            let format = fill.format().set_align(FormatAlign::Top);
            for (col, value) in cells.iter().enumerate() {
                write_cell(ws, row, col as u16, value, &format)?;
            }
        }

        for (col, width) in self.widths.iter().enumerate() {
            ws.set_column_width(col as u16, *width as f64)?;
        }
        ws.set_freeze_panes(1, 0)?;
        Ok(())
    }
}

fn write_cell(
    ws: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: &Format,
) -> std::result::Result<(), XlsxError> {
    match value {
        CellValue::Empty => ws.write_blank(row, col, format)?,
        CellValue::Text(s) => {
            let text = fit_cell_text(s);
            if let Cow::Owned(_) = text {
                warn!(
                    target: HARVEST_REPORT,
                    row,
                    col,
                    chars = s.chars().count(),
                    "cell text exceeds {} characters, truncating",
                    MAX_CELL_CHARS
                );
            }
            ws.write_string_with_format(row, col, &*text, format)?
        }
        CellValue::Number(n) => match n.as_f64() {
            Some(f) => ws.write_number_with_format(row, col, f, format)?,
            None => ws.write_string_with_format(row, col, n.to_string(), format)?,
        },
        CellValue::Bool(b) => ws.write_boolean_with_format(row, col, *b, format)?,
    };
    Ok(())
}

/// Cuts text to [`MAX_CELL_CHARS`]; borrowed when it already fits.
pub fn fit_cell_text(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => Cow::Owned(text[..end].to_string()),
        None => Cow::Borrowed(text),
    }
}

/// Trailing sheet explaining row colours and columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    highlights: [RowFill; 3],
    descriptions: Vec<ColumnDescription>,
}

impl Legend {
    /// `extra` is spliced in after the "Is Global" entry, or appended if that
    /// entry is missing.
    pub fn build(extra: Option<ColumnDescription>) -> Self {
        Self::with_descriptions(base_column_descriptions(), extra)
    }

    pub fn with_descriptions(
        mut descriptions: Vec<ColumnDescription>,
        extra: Option<ColumnDescription>,
    ) -> Self {
        if let Some(extra) = extra {
            match descriptions.iter().position(|d| d.name == GLOBAL_COLUMN_NAME) {
                Some(idx) => descriptions.insert(idx + 1, extra),
                None => descriptions.push(extra),
            }
        }
        Self {
            highlights: [RowFill::Global, RowFill::Odd, RowFill::Even],
            descriptions,
        }
    }

    pub fn highlights(&self) -> &[RowFill] {
        &self.highlights
    }

    pub fn descriptions(&self) -> &[ColumnDescription] {
        &self.descriptions
    }

    /// Zero-based row of the "Column Descriptions" title.
    pub fn descriptions_title_row(&self) -> u32 {
        self.highlights.len() as u32 + 4
    }

    fn write_to(&self, ws: &mut Worksheet) -> std::result::Result<(), XlsxError> {
        ws.set_name(LEGEND_SHEET_NAME)?;

        let section = Format::new().set_bold().set_font_size(12);
        let bold = Format::new().set_bold();
        let plain = Format::new();
        let wrap = Format::new().set_text_wrap().set_align(FormatAlign::Top);

        ws.write_string_with_format(0, 0, "Row Colour Key", &section)?;
        for (col, title) in ["Colour", "Label", "Meaning"].iter().enumerate() {
            ws.write_string_with_format(1, col as u16, *title, &bold)?;
        }
        for (i, fill) in self.highlights.iter().enumerate() {
            let row = i as u32 + 2;
            let swatch = fill
                .format()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter);
            ws.write_string_with_format(row, 0, format!("  #{}  ", fill.hex()), &swatch)?;
            ws.write_string_with_format(row, 1, fill.label(), &plain)?;
            ws.write_string_with_format(row, 2, fill.meaning(), &wrap)?;
        }

        let title_row = self.descriptions_title_row();
        ws.write_string_with_format(title_row, 0, "Column Descriptions", &section)?;
        ws.write_string_with_format(title_row + 1, 0, "Column", &bold)?;
        ws.write_string_with_format(title_row + 1, 1, "Description", &bold)?;
        for (i, desc) in self.descriptions.iter().enumerate() {
            let row = title_row + 2 + i as u32;
            ws.write_string_with_format(row, 0, &desc.name, &bold)?;
            ws.write_string_with_format(row, 1, &desc.description, &wrap)?;
        }

        for (col, width) in LEGEND_WIDTHS.iter().enumerate() {
            ws.set_column_width(col as u16, *width)?;
        }
        Ok(())
    }
}

/// A workbook for one group: document sheets followed by the legend.
#[derive(Debug, Clone, Default)]
pub struct Report {
    sheets: Vec<Sheet>,
    legend: Option<Legend>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document sheet, renaming it if the name is already taken.
    pub fn add_sheet(&mut self, mut sheet: Sheet) {
        sheet.name = self.unique_name(&sheet.name);
        debug!(
            target: HARVEST_REPORT,
            sheet = %sheet.name,
            rows = sheet.rows.len(),
            "added sheet"
        );
        self.sheets.push(sheet);
    }

    pub fn set_legend(&mut self, legend: Legend) {
        self.legend = Some(legend);
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn legend(&self) -> Option<&Legend> {
        self.legend.as_ref()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut workbook = self.to_workbook()?;
        workbook.save(path)?;
        debug!(target: HARVEST_REPORT, path = %path.display(), "saved report");
        Ok(())
    }

    pub fn to_buffer(&self) -> Result<Vec<u8>> {
        let mut workbook = self.to_workbook()?;
        Ok(workbook.save_to_buffer()?)
    }

    fn to_workbook(&self) -> Result<Workbook> {
        let mut workbook = Workbook::new();
        for sheet in &self.sheets {
            sheet.write_to(workbook.add_worksheet())?;
        }
        if let Some(legend) = &self.legend {
            legend.write_to(workbook.add_worksheet())?;
        }
        Ok(workbook)
    }

    fn unique_name(&self, base: &str) -> String {
        // Excel compares sheet names case-insensitively, beyond ASCII too.
        let taken = |name: &str| {
            let name = name.to_lowercase();
            name == LEGEND_SHEET_NAME.to_lowercase()
                || self.sheets.iter().any(|s| s.name.to_lowercase() == name)
        };
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| {
                let suffix = n.to_string();
                let keep = MAX_SHEET_NAME_LEN - suffix.len();
                let stem: String = base.chars().take(keep).collect();
                format!("{}{}", stem, suffix)
            })
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_row;
    use crate::schema::{PdfTagExtension, TagExtension};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn regional(name: &str) -> ExtractedRow {
        extract_row(&json!({ "name": name, "keyword_list": ["hazardlookup"] }))
    }

    fn global(name: &str) -> ExtractedRow {
        extract_row(&json!({
            "name": name,
            "keyword_list": ["hazardlookup"],
            "ex_geographic_bounding_box": {
                "west_bound_longitude": -180,
                "east_bound_longitude": 180,
                "north_bound_latitude": 90,
                "south_bound_latitude": -90
            }
        }))
    }

    #[test]
    fn fills_alternate_with_global_precedence() {
        let rows = vec![global("a"), regional("b"), regional("c"), global("d")];
        let sheet = Sheet::build("doc", &rows, &ColumnSchema::base());
        assert_eq!(
            sheet.fills(),
            &[RowFill::Global, RowFill::Even, RowFill::Odd, RowFill::Global]
        );
    }

    #[test]
    fn global_row_on_odd_position_is_highlighted() {
        let sheet = Sheet::build("doc", &[global("a")], &ColumnSchema::base());
        assert_eq!(sheet.fills(), &[RowFill::Global]);
        assert_eq!(sheet.fills()[0].hex(), "FFD700");
    }

    #[test]
    fn width_is_padded_and_capped() {
        let long = CellValue::from("x".repeat(50).as_str());
        assert_eq!(column_width(&"y".repeat(10), [&long]), 54);

        let huge = CellValue::from("x".repeat(80).as_str());
        assert_eq!(column_width("Title", [&huge]), MAX_COLUMN_WIDTH);

        assert_eq!(column_width("Queryable", [&CellValue::Empty]), 13);
    }

    #[test]
    fn sheet_cells_follow_schema() {
        let rows = vec![regional("first"), global("second")];
        let sheet = Sheet::build("doc", &rows, &ColumnSchema::extended(&PdfTagExtension));

        assert_eq!(sheet.header()[10], "PDF V2");
        assert_eq!(sheet.rows().len(), 2);
        assert_eq!(sheet.rows()[0][0], CellValue::from("first"));
        assert_eq!(sheet.rows()[1][0], CellValue::from("second"));
        assert_eq!(sheet.rows()[1][9], CellValue::from("Yes"));
        assert_eq!(
            sheet.rows()[0][10],
            CellValue::from(crate::tags::NO_PDF_LABEL)
        );
    }

    #[test]
    fn empty_document_gives_header_only() {
        let sheet = Sheet::build("doc", &[], &ColumnSchema::base());
        assert!(sheet.rows().is_empty());
        assert_eq!(sheet.header().len(), 12);
        assert_eq!(sheet.column_widths()[0], "Layer Name".len() + COLUMN_PADDING);
    }

    #[test]
    fn sheet_names_are_truncated_and_cleaned() {
        assert_eq!(sheet_name(&"a".repeat(40)).len(), 31);
        assert_eq!(sheet_name("dev/prod:caps"), "dev_prod_caps");
        assert_eq!(sheet_name(""), "Sheet");
    }

    #[test]
    fn duplicate_sheet_names_are_renamed() {
        let mut report = Report::new();
        report.add_sheet(Sheet::build("caps", &[], &ColumnSchema::base()));
        report.add_sheet(Sheet::build("caps", &[], &ColumnSchema::base()));
        report.add_sheet(Sheet::build("legend", &[], &ColumnSchema::base()));

        let names: Vec<_> = report.sheets().iter().map(Sheet::name).collect();
        assert_eq!(names, vec!["caps", "caps1", "legend1"]);
    }

    #[test]
    fn non_ascii_case_duplicates_are_renamed() {
        let mut report = Report::new();
        report.add_sheet(Sheet::build("Ärger", &[], &ColumnSchema::base()));
        report.add_sheet(Sheet::build("ärger", &[], &ColumnSchema::base()));

        let names: Vec<_> = report.sheets().iter().map(Sheet::name).collect();
        assert_eq!(names, vec!["Ärger", "ärger1"]);
        assert!(report.to_buffer().is_ok());
    }

    #[test]
    fn oversized_text_is_cut_to_cell_limit() {
        let short = "abc";
        assert!(matches!(fit_cell_text(short), Cow::Borrowed("abc")));

        let exact = "x".repeat(MAX_CELL_CHARS);
        assert!(matches!(fit_cell_text(&exact), Cow::Borrowed(_)));

        let multibyte = "é".repeat(MAX_CELL_CHARS + 10);
        let cut = fit_cell_text(&multibyte);
        assert_eq!(cut.chars().count(), MAX_CELL_CHARS);
    }

    #[test]
    fn long_abstract_still_saves() {
        let row = extract_row(&json!({
            "name": "long",
            "abstract": "x".repeat(40_000),
            "keyword_list": ["hazardlookup"]
        }));
        let sheet = Sheet::build("doc", &[row], &ColumnSchema::base());
        assert_eq!(sheet.column_widths()[2], MAX_COLUMN_WIDTH);

        let mut report = Report::new();
        report.add_sheet(sheet);
        report.set_legend(Legend::build(None));

        let bytes = report.to_buffer().unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn legend_splices_extra_after_is_global() {
        let legend = Legend::build(Some(PdfTagExtension.description()));
        let names: Vec<_> = legend.descriptions().iter().map(|d| d.name.as_str()).collect();
        let idx = names.iter().position(|n| *n == "Is Global").unwrap();
        assert_eq!(names[idx + 1], "PDF V2");
        assert_eq!(names.len(), 13);
    }

    #[test]
    fn legend_appends_extra_without_anchor() {
        let descriptions = vec![ColumnDescription::new("Title", "t")];
        let legend =
            Legend::with_descriptions(descriptions, Some(ColumnDescription::new("PDF V2", "p")));
        let names: Vec<_> = legend.descriptions().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Title", "PDF V2"]);
    }

    #[test]
    fn legend_lists_three_highlights() {
        let legend = Legend::build(None);
        let hexes: Vec<_> = legend.highlights().iter().map(RowFill::hex).collect();
        assert_eq!(hexes, vec!["FFD700", "D6E4F0", "FFFFFF"]);
        assert_eq!(legend.descriptions_title_row(), 7);
    }

    #[test]
    fn report_serializes_to_xlsx_bytes() {
        let mut report = Report::new();
        report.add_sheet(Sheet::build("doc", &[global("a")], &ColumnSchema::base()));
        report.set_legend(Legend::build(None));

        let bytes = report.to_buffer().unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
