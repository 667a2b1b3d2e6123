pub mod bbox;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod groups;
pub mod logging;
pub mod report;
pub mod scan;
pub mod schema;
pub mod summary;
pub mod tags;

use std::fs;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, info_span};

pub use crate::config::{HarvestConfig, HarvestMode};
pub use crate::error::{FetchError, HarvestError, Result};
pub use crate::extract::{extract_row, CellValue, ExtractedRow};
pub use crate::groups::{collect_groups, load_document, InputDocument};
pub use crate::report::{Legend, Report, Sheet};
pub use crate::scan::find_hazard_layers;
pub use crate::schema::{ColumnSchema, PdfTagExtension, TagExtension};
pub use crate::summary::{DocumentSummary, GroupSummary};

use crate::logging::{HARVEST_REPORT, HARVEST_SCAN};

/// Finds every hazard layer in a document and flattens it into a row.
pub fn extract_layers(document: &Value) -> Vec<ExtractedRow> {
    find_hazard_layers(document)
        .into_iter()
        .map(extract_row)
        .collect()
}

/// Turns groups of capabilities documents into one report per group.
#[derive(Debug)]
pub struct Harvester {
    config: HarvestConfig,
    schema: ColumnSchema,
}

impl Harvester {
    pub fn new(config: HarvestConfig) -> Self {
        let schema = config.schema();
        Self { config, schema }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    fn extension(&self) -> Option<&dyn TagExtension> {
        self.config.tag_extension.as_deref()
    }

    /// Scans, extracts and lays out one document.
    pub fn harvest_document(&self, document: &InputDocument) -> (Sheet, DocumentSummary) {
        let _span = info_span!("document", name = %document.name).entered();

        let rows = extract_layers(&document.value);
        debug!(
            target: HARVEST_SCAN,
            layers = rows.len(),
            global = rows.iter().filter(|r| r.global).count(),
            "extracted layers"
        );

        let sheet = Sheet::build(&document.stem, &rows, &self.schema);
        let summary = DocumentSummary::from_rows(&document.name, &rows, self.extension());
        (sheet, summary)
    }

    pub fn begin_group(&self, group: &str) -> GroupReport<'_> {
        GroupReport {
            harvester: self,
            group: group.to_string(),
            report: Report::new(),
            documents: Vec::new(),
        }
    }

    /// Builds and saves one report per group, in order. No groups is not an
    /// error; the result is simply empty.
    pub fn run(&self, groups: &IndexMap<String, Vec<InputDocument>>) -> Result<Vec<GroupSummary>> {
        let mut results = Vec::with_capacity(groups.len());
        for (group, documents) in groups {
            let mut builder = self.begin_group(group);
            for document in documents {
                builder.add_document(document);
            }
            results.push(builder.finish()?);
        }
        Ok(results)
    }
}

/// A group's report under construction. Sheets are added one document at a
/// time; the legend is appended and the file written by [`GroupReport::finish`].
pub struct GroupReport<'h> {
    harvester: &'h Harvester,
    group: String,
    report: Report,
    documents: Vec<DocumentSummary>,
}

impl GroupReport<'_> {
    pub fn add_document(&mut self, document: &InputDocument) -> &DocumentSummary {
        let (sheet, summary) = self.harvester.harvest_document(document);
        self.report.add_sheet(sheet);
        self.documents.push(summary);
        &self.documents[self.documents.len() - 1]
    }

    /// Appends the legend without saving, for callers that persist the
    /// report themselves.
    pub fn into_report(mut self) -> (Report, Vec<DocumentSummary>) {
        let extra = self.harvester.extension().map(|ext| ext.description());
        self.report.set_legend(Legend::build(extra));
        (self.report, self.documents)
    }

    pub fn finish(self) -> Result<GroupSummary> {
        let harvester = self.harvester;
        let group = self.group.clone();
        let out_file = harvester.config.report_path(&group);
        let (report, documents) = self.into_report();

        if let Some(parent) = out_file.parent() {
            fs::create_dir_all(parent)?;
        }
        report.save(&out_file)?;
        info!(
            target: HARVEST_REPORT,
            group = %group,
            sheets = report.sheets().len(),
            path = %out_file.display(),
            "wrote report"
        );

        Ok(GroupSummary::new(
            &group,
            out_file,
            documents,
            harvester.extension(),
        ))
    }
}
