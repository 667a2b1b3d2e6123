use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::schema::{ColumnSchema, PdfTagExtension, TagExtension};

/// Output mode selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HarvestMode {
    #[default]
    Base,
    Pdf,
}

impl HarvestMode {
    pub fn tag_extension(&self) -> Option<Box<dyn TagExtension>> {
        match self {
            HarvestMode::Base => None,
            HarvestMode::Pdf => Some(Box::new(PdfTagExtension)),
        }
    }
}

/// Everything a harvest run needs, passed in explicitly.
pub struct HarvestConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub envs_dir: PathBuf,
    pub tag_extension: Option<Box<dyn TagExtension>>,
    /// Prefix of report file names, normally a `%Y%m%d_%H%M%S` timestamp.
    pub timestamp: String,
    /// Host slug per group, used to name output directories and files.
    pub group_slugs: IndexMap<String, String>,
}

impl HarvestConfig {
    pub fn new(root: &Path, mode: HarvestMode) -> Self {
        Self {
            input_dir: root.join("input"),
            output_dir: root.join("output"),
            envs_dir: root.join("envs"),
            tag_extension: mode.tag_extension(),
            timestamp: chrono::Local::now().format("%Y%m%d_%H%M%S").to_string(),
            group_slugs: IndexMap::new(),
        }
    }

    pub fn schema(&self) -> ColumnSchema {
        ColumnSchema::for_extension(self.tag_extension.as_deref())
    }

    /// Slug naming a group's output: host slug, else the group name, else "base".
    pub fn group_slug<'a>(&'a self, group: &'a str) -> &'a str {
        match self.group_slugs.get(group) {
            Some(slug) => slug.as_str(),
            None if group.is_empty() => "base",
            None => group,
        }
    }

    /// `<output_dir>/<slug>/<timestamp>_<slug>[suffix]_layers.xlsx`
    pub fn report_path(&self, group: &str) -> PathBuf {
        let slug = self.group_slug(group);
        let suffix = self
            .tag_extension
            .as_ref()
            .map(|ext| ext.file_suffix())
            .unwrap_or("");
        self.output_dir
            .join(slug)
            .join(format!("{}_{}{}_layers.xlsx", self.timestamp, slug, suffix))
    }
}

impl std::fmt::Debug for HarvestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarvestConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("envs_dir", &self.envs_dir)
            .field("tag_extension", &self.tag_extension.as_ref().map(|e| e.column().label))
            .field("timestamp", &self.timestamp)
            .field("group_slugs", &self.group_slugs)
            .finish()
    }
}
