//! Project loading and persistence.
//!
//! A `Project` is the set of parsed units behind one invocation target.
//! Loading is parallel; saving is the only asynchronous operation and runs
//! once, after every unit has been scanned.

pub mod file_safety;
mod loader;
pub mod source;
pub mod tsconfig;

use std::path::Path;

use tracing::{debug, info};

pub use loader::{parse_files, ProjectOrigin};
pub use source::{LineChange, SourceUnit};

use crate::config::FileMatcher;
use crate::error::{ParamFixError, Result};
use file_safety::AtomicWriter;

/// Parsed source units of one invocation target, in sorted path order.
#[derive(Debug)]
pub struct Project {
    origin: ProjectOrigin,
    units: Vec<SourceUnit>,
}

impl Project {
    /// Resolve `target` and load every file it selects.
    pub fn load(target: &Path, matcher: &FileMatcher) -> Result<Self> {
        let origin = ProjectOrigin::resolve(target)?;
        Self::load_origin(origin, matcher)
    }

    pub fn load_origin(origin: ProjectOrigin, matcher: &FileMatcher) -> Result<Self> {
        let paths = origin.collect_files(matcher)?;
        debug!("Selected {} file(s) from {}", paths.len(), origin.path().display());
        let units = parse_files(paths)?;
        Ok(Self { origin, units })
    }

    pub fn origin(&self) -> &ProjectOrigin {
        &self.origin
    }

    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut [SourceUnit] {
        &mut self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units with unsaved markers.
    pub fn modified_units(&self) -> impl Iterator<Item = &SourceUnit> {
        self.units.iter().filter(|u| u.is_modified())
    }

    /// Persist every modified unit. Returns the number of files written.
    ///
    /// Every rendering is re-parsed first; if any unit would gain syntax
    /// errors nothing is written. Each file is then replaced atomically and
    /// the unit adopts the saved text as its new baseline.
    pub async fn save(&mut self) -> Result<usize> {
        let mut staged = Vec::new();
        for (idx, unit) in self.units.iter().enumerate() {
            if !unit.is_modified() {
                continue;
            }
            let (text, tree, errors) = unit.reparse_rendered()?;
            if errors > unit.error_nodes() {
                return Err(ParamFixError::Validation {
                    path: unit.path().to_path_buf(),
                    before: unit.error_nodes(),
                    after: errors,
                });
            }
            staged.push((idx, text, tree, errors));
        }

        let writer = AtomicWriter::new();
        let written = staged.len();
        for (idx, text, tree, errors) in staged {
            let unit = &mut self.units[idx];
            writer.write(unit.path(), &text).await?;
            info!(
                "Saved {} ({} marker(s))",
                unit.path().display(),
                unit.pending_markers()
            );
            unit.commit(text, tree, errors);
        }

        Ok(written)
    }
}
