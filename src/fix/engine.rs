//! Batch driver.
//!
//! Loads a project, walks every unit, then saves once. Nothing is written
//! until every unit has been scanned, and nothing at all when no fix was
//! made.

use std::io::{self, Write};
use std::path::Path;

use tracing::info;

use super::output::Reporter;
use super::walker::fix_unit;
use crate::config::{FileMatcher, FixFileConfig};
use crate::error::Result;
use crate::project::{Project, ProjectOrigin};

/// Engine settings after merging CLI flags and the config file.
#[derive(Debug, Clone, Default)]
pub struct FixOptions {
    /// Report and preview, never write.
    pub dry_run: bool,
    /// Include/exclude filter for directory targets.
    pub matcher: FileMatcher,
}

impl FixOptions {
    /// CLI `--dry-run` wins; otherwise the file's `[fix] dry_run` applies.
    pub fn from_config(file_config: Option<&FixFileConfig>, cli_dry_run: bool) -> Result<Self> {
        match file_config {
            Some(config) => Ok(Self {
                dry_run: cli_dry_run || config.fix.dry_run,
                matcher: config.build_file_matcher()?,
            }),
            None => Ok(Self {
                dry_run: cli_dry_run,
                matcher: FileMatcher::default(),
            }),
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixSummary {
    pub files_scanned: usize,
    /// Files with at least one fixed declaration.
    pub files_modified: usize,
    /// Fixed declarations across all files.
    pub total_fixes: usize,
    /// The project was persisted.
    pub saved: bool,
}

pub struct FixEngine {
    options: FixOptions,
}

impl FixEngine {
    pub fn new(options: FixOptions) -> Self {
        Self { options }
    }

    /// Fix `target`, printing progress to stdout.
    pub async fn run(&self, target: &Path) -> Result<FixSummary> {
        self.run_with_output(target, io::stdout()).await
    }

    /// Fix `target`, printing progress to `out`.
    pub async fn run_with_output<W: Write>(&self, target: &Path, out: W) -> Result<FixSummary> {
        let mut reporter = Reporter::new(out);

        let origin = ProjectOrigin::resolve(target)?;
        reporter.loading(&origin)?;

        let mut project = Project::load_origin(origin, &self.options.matcher)?;
        reporter.found(project.len())?;

        let mut summary = FixSummary {
            files_scanned: project.len(),
            ..FixSummary::default()
        };

        for unit in project.units_mut() {
            let report = fix_unit(unit);
            if report.is_clean() {
                continue;
            }
            reporter.fixes(&report)?;
            summary.total_fixes += report.fix_count();
            summary.files_modified += 1;
        }

        if summary.total_fixes == 0 {
            reporter.nothing_to_fix()?;
            return Ok(summary);
        }

        if self.options.dry_run {
            reporter.preview_header()?;
            for unit in project.modified_units() {
                reporter.preview(unit)?;
            }
            reporter.dry_run_done(summary.total_fixes, summary.files_modified)?;
        } else {
            reporter.saving()?;
            let written = project.save().await?;
            summary.saved = true;
            info!("Wrote {} file(s)", written);
            reporter.done(summary.total_fixes, summary.files_modified)?;
        }

        Ok(summary)
    }
}
