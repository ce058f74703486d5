//! Manifest commands - create and inspect the manifest without network access

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

use drivesync_core::config::Config;
use drivesync_core::domain::{EntryDescriptor, FetchTarget, Manifest};

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

#[derive(Debug, Subcommand)]
pub enum ManifestCommand {
    /// Create an empty manifest if none exists
    Init,
    /// Show how each entry will be fetched
    List,
}

impl ManifestCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let fmt = get_formatter(format == OutputFormat::Json);
        let path = config.manifest_path();
        match self {
            ManifestCommand::Init => execute_init(&path, &*fmt, format),
            ManifestCommand::List => execute_list(&path, &*fmt, format),
        }
    }
}

fn execute_init(path: &Path, fmt: &dyn OutputFormatter, format: OutputFormat) -> Result<()> {
    let existed = path.is_file();
    let manifest = Manifest::load_or_create(path)?;

    if matches!(format, OutputFormat::Json) {
        fmt.print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "created": !existed,
            "entries": manifest.len(),
        }));
    } else if existed {
        fmt.info(&format!(
            "{} already exists with {} entries",
            path.display(),
            manifest.len()
        ));
    } else {
        fmt.success(&format!("Created empty manifest {}", path.display()));
    }
    Ok(())
}

fn execute_list(path: &Path, fmt: &dyn OutputFormatter, format: OutputFormat) -> Result<()> {
    let manifest = Manifest::load_or_create(path)?;
    let reports: Vec<EntryReport> = manifest
        .entries()
        .map(|(name, entry)| EntryReport::describe(name, entry))
        .collect();

    if matches!(format, OutputFormat::Json) {
        let entries: Vec<serde_json::Value> = reports.iter().map(EntryReport::to_json).collect();
        fmt.print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "entries": entries,
        }));
        return Ok(());
    }

    if reports.is_empty() {
        fmt.info(&format!("{} has no entries", path.display()));
        return Ok(());
    }

    for report in &reports {
        match &report.problem {
            None => fmt.info(&report.summary()),
            Some(problem) => fmt.warn(&format!("{}: {problem}", report.name)),
        }
    }
    let invalid = reports.iter().filter(|r| r.problem.is_some()).count();
    fmt.info(&format!(
        "{} entries, {} will be skipped",
        reports.len(),
        invalid
    ));
    Ok(())
}

/// How one entry would be processed by `sync`
#[derive(Debug, Clone, PartialEq, Eq)]
struct EntryReport {
    name: String,
    /// `gapps` or `other`, once classified
    kind: Option<&'static str>,
    /// Export format for `gapps` entries
    format: Option<String>,
    /// Explicit ID, `None` when the name is looked up
    id: Option<String>,
    /// Why the entry will be skipped
    problem: Option<String>,
}

impl EntryReport {
    fn describe(name: &str, entry: &EntryDescriptor) -> Self {
        let mut report = Self {
            name: name.to_string(),
            kind: None,
            format: None,
            id: entry.id.clone(),
            problem: None,
        };

        let plan = match entry.plan(name) {
            Ok(plan) => plan,
            Err(e) => {
                report.problem = Some(e.to_string());
                return report;
            }
        };
        match plan.target {
            Ok(FetchTarget::Raw) => report.kind = Some("other"),
            Ok(FetchTarget::Exported(mime)) => {
                report.kind = Some("gapps");
                report.format = Some(mime.as_str().to_string());
            }
            Err(e) => report.problem = Some(e.to_string()),
        }
        report
    }

    fn id_source(&self) -> &'static str {
        if self.id.is_some() {
            "explicit"
        } else {
            "lookup"
        }
    }

    fn summary(&self) -> String {
        let mut line = format!("{} [{}]", self.name, self.kind.unwrap_or("?"));
        if let Some(format) = &self.format {
            line.push_str(&format!(" as {format}"));
        }
        match &self.id {
            Some(id) => line.push_str(&format!(", id {id}")),
            None => line.push_str(", id by name lookup"),
        }
        line
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "type": self.kind,
            "format": self.format,
            "id": self.id,
            "id_source": self.id_source(),
            "valid": self.problem.is_none(),
            "problem": self.problem,
        })
    }
}
