use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use harvester::fetch::{self, EnvEntry, Fetcher};
use harvester::summary::render_summary_table;
use harvester::{collect_groups, load_document, HarvestConfig, HarvestMode, Harvester};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Include the PDF V2 column and per-category counts
    Pdf,
}

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    long_about = "Extract hazardlookup layers from WMS capabilities JSON files into Excel reports."
)]
pub struct Args {
    /// Output mode. Pass 'pdf' to include PDF V2 columns in the Excel and summary.
    #[clap(long, value_enum)]
    mode: Option<Mode>,

    /// Skip fetching from the envs directory even if credential files are present
    #[clap(long)]
    no_fetch: bool,

    /// Path to a specific .<group>.<env>.env file to fetch. Can be repeated.
    /// Takes precedence over scanning the envs directory.
    #[clap(long = "env", value_name = "PATH")]
    env_files: Vec<PathBuf>,

    /// Directory holding capabilities JSON files, one subdirectory per group
    #[clap(long, default_value = "input")]
    input_dir: PathBuf,

    /// Directory reports are written to
    #[clap(long, default_value = "output")]
    output_dir: PathBuf,

    /// Directory scanned for .<group>.<env>.env credential files
    #[clap(long, default_value = "envs")]
    envs_dir: PathBuf,

    /// Enable debug logging
    #[clap(short, long)]
    verbose: bool,

    /// Also write logs to this directory
    #[clap(long)]
    log_dir: Option<PathBuf>,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    fn harvest_mode(&self) -> HarvestMode {
        match self.mode {
            Some(Mode::Pdf) => HarvestMode::Pdf,
            None => HarvestMode::Base,
        }
    }
}

fn progress_bar(len: usize, prefix: &str) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:30.cyan/blue}] {percent:>3}% {elapsed} {prefix:.bold.blue} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> "),
    );
    bar.set_prefix(prefix.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Runs the fetch phase and returns the group → saved-file mapping of
/// successful fetches.
fn fetch_all(entries: &[EnvEntry], config: &HarvestConfig) -> Result<IndexMap<String, Vec<PathBuf>>> {
    println!(
        "{}",
        format!("Found {} env file(s) → fetching capabilities…", entries.len())
            .cyan()
            .bold()
    );

    let fetcher = Fetcher::new().context("Failed to create HTTP client")?;
    let bar = progress_bar(entries.len(), "Fetching");
    let mut results = Vec::with_capacity(entries.len());
    for entry in entries {
        bar.set_message(format!("{}/{}", entry.group, entry.env_name));
        results.push((entry, fetcher.fetch_capabilities(entry, &config.input_dir)));
        bar.inc(1);
    }
    bar.finish_and_clear();

    let mut fetched: IndexMap<String, Vec<PathBuf>> = IndexMap::new();
    for (entry, result) in results {
        match result {
            Ok(path) => {
                println!("  {} {}/{}", "✓".green().bold(), entry.group, entry.env_name);
                fetched.entry(entry.group.clone()).or_default().push(path);
            }
            Err(e) => {
                println!(
                    "  {} {}/{}  {}",
                    "✗".red().bold(),
                    entry.group,
                    entry.env_name,
                    e.to_string().red().dimmed()
                );
            }
        }
    }
    println!();
    Ok(fetched)
}

fn main() -> Result<()> {
    let args = Args::parse_args();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _guard = match &args.log_dir {
        Some(dir) => Some(
            harvester::logging::init_logging_with_dir(args.verbose, dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?,
        ),
        None => {
            harvester::logging::init_logging(args.verbose);
            None
        }
    };

    let mode = args.harvest_mode();
    let mut config = HarvestConfig::new(std::path::Path::new("."), mode);
    config.input_dir = args.input_dir.clone();
    config.output_dir = args.output_dir.clone();
    config.envs_dir = args.envs_dir.clone();

    // Source detection
    let env_entries: Vec<EnvEntry> = if args.env_files.is_empty() {
        fetch::scan_envs(&config.envs_dir)
            .with_context(|| format!("Failed to scan {}", config.envs_dir.display()))?
    } else {
        args.env_files
            .iter()
            .map(|p| {
                EnvEntry::from_path(p).with_context(|| format!("Failed to read {}", p.display()))
            })
            .collect::<Result<_>>()?
    };
    config.group_slugs = fetch::group_slugs(&env_entries);

    let use_envs = !env_entries.is_empty() && !args.no_fetch;
    let fetched = if use_envs {
        Some(fetch_all(&env_entries, &config)?)
    } else {
        if env_entries.is_empty() && !args.no_fetch {
            println!(
                "{}\n",
                "No env files found — falling back to input JSON files…".yellow()
            );
        }
        None
    };

    // Explicit env files harvest only what was just fetched
    let groups = match fetched {
        Some(fetched) if !args.env_files.is_empty() => fetched,
        _ => collect_groups(&config.input_dir)
            .with_context(|| format!("Failed to scan {}", config.input_dir.display()))?,
    };

    if groups.is_empty() {
        let message = if env_entries.is_empty() && !args.no_fetch {
            "Nothing to do: no env files and no JSON files in the input directory."
        } else {
            "No JSON files found in the input directory."
        };
        println!("{}", message.red().bold());
        return Ok(());
    }

    let mode_tag = match mode {
        HarvestMode::Pdf => " · PDF mode".yellow().bold().to_string(),
        HarvestMode::Base => String::new(),
    };
    println!("{}{}", "Layer Harvester".cyan().bold(), mode_tag);
    println!(
        "{}\n",
        "Extracting hazardlookup layers from WMS capabilities files".dimmed()
    );

    let harvester = Harvester::new(config);
    let mut group_results = Vec::with_capacity(groups.len());

    for (group_name, paths) in &groups {
        let label = if group_name.is_empty() {
            "input/".to_string()
        } else {
            format!("input/{}/", group_name)
        };
        let bar = progress_bar(paths.len(), &label);
        let mut builder = harvester.begin_group(group_name);

        for path in paths {
            bar.set_message(path.display().to_string());
            match load_document(path) {
                Ok(document) => {
                    builder.add_document(&document);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable document"),
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        let summary = builder
            .finish()
            .with_context(|| format!("Failed to write report for group {:?}", group_name))?;
        group_results.push(summary);
    }

    let with_tags = harvester.config().tag_extension.is_some();
    for result in &group_results {
        println!();
        println!(
            "{}",
            format!("  ◆  {}  ◆", result.display_name().to_uppercase())
                .bright_yellow()
                .bold()
        );
        println!("{}", render_summary_table(result, with_tags));
        println!(
            "  {} {}",
            "✓ Saved:".green().bold(),
            result.out_file.display().to_string().underline()
        );
    }

    println!();
    println!("{}", "Done.".dimmed());
    Ok(())
}
