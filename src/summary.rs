use std::path::PathBuf;

use crate::extract::ExtractedRow;
use crate::schema::TagExtension;
use crate::tags::{TagCounts, NO_PDF_LABEL};

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSummary {
    pub file_name: String,
    pub total: usize,
    pub global_count: usize,
    /// Empty unless a tag extension is active.
    pub tag_counts: TagCounts,
}

impl DocumentSummary {
    pub fn from_rows(
        file_name: &str,
        rows: &[ExtractedRow],
        extension: Option<&dyn TagExtension>,
    ) -> Self {
        let tag_counts = match extension {
            Some(ext) => TagCounts::from_rows(rows, |row| ext.tag(row)),
            None => TagCounts::default(),
        };
        Self {
            file_name: file_name.to_string(),
            total: rows.len(),
            global_count: rows.iter().filter(|r| r.global).count(),
            tag_counts,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    /// Group name; the root group is empty.
    pub group: String,
    pub out_file: PathBuf,
    pub documents: Vec<DocumentSummary>,
    /// Every tag seen in the group, in display order.
    pub all_tags: Vec<String>,
}

impl GroupSummary {
    pub fn new(
        group: &str,
        out_file: PathBuf,
        documents: Vec<DocumentSummary>,
        extension: Option<&dyn TagExtension>,
    ) -> Self {
        let mut all_tags = Vec::new();
        if let Some(ext) = extension {
            for doc in &documents {
                doc.tag_counts.merge_into(&mut all_tags);
            }
            all_tags.sort_by_cached_key(|t| ext.sort_key(t));
        }
        Self {
            group: group.to_string(),
            out_file,
            documents,
            all_tags,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.group.is_empty() {
            "(root)"
        } else {
            &self.group
        }
    }

    pub fn total_layers(&self) -> usize {
        self.documents.iter().map(|d| d.total).sum()
    }
}

/// Heading for a tag column in the summary table.
pub fn tag_heading(tag: &str) -> String {
    if tag == NO_PDF_LABEL {
        "No keywords to be included in PDF found".to_string()
    } else {
        title_case(tag)
    }
}

/// Upper-cases the first letter of every alphabetic run, lower-cases the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if prev_alpha {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_alpha = c.is_alphabetic();
    }
    out
}

/// Plain-text table: one line per document with totals and, when `with_tags`
/// is set, one count column per tag.
pub fn render_summary_table(summary: &GroupSummary, with_tags: bool) -> String {
    let mut headings = vec![
        "File".to_string(),
        "Total Layers".to_string(),
        "Global".to_string(),
    ];
    if with_tags {
        headings.extend(summary.all_tags.iter().map(|t| tag_heading(t)));
    }

    let rows: Vec<Vec<String>> = summary
        .documents
        .iter()
        .map(|doc| {
            let mut cells = vec![
                doc.file_name.clone(),
                doc.total.to_string(),
                doc.global_count.to_string(),
            ];
            if with_tags {
                cells.extend(
                    summary
                        .all_tags
                        .iter()
                        .map(|t| doc.tag_counts.get(t).to_string()),
                );
            }
            cells
        })
        .collect();

    let widths: Vec<usize> = headings
        .iter()
        .enumerate()
        .map(|(col, h)| {
            rows.iter()
                .map(|r| r[col].chars().count())
                .fold(h.chars().count(), usize::max)
        })
        .collect();

    let format_line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(col, (cell, width))| {
                if col == 0 {
                    format!("{:<width$}", cell, width = width)
                } else {
                    format!("{:>width$}", cell, width = width)
                }
            })
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let separator = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");

    let mut lines = vec![format_line(headings.as_slice()), separator];
    lines.extend(rows.iter().map(|r| format_line(r.as_slice())));
    lines.join("\n")
}
