//! Human-readable progress and summary lines.
//!
//! Everything user-facing goes to the wrapped writer (stdout in the binary);
//! diagnostics go through `tracing` to stderr.

use std::io::{self, Write};

use super::walker::UnitReport;
use crate::project::{ProjectOrigin, SourceUnit};

pub struct Reporter<W: Write> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn loading(&mut self, origin: &ProjectOrigin) -> io::Result<()> {
        if origin.is_manifest() {
            writeln!(self.out, "Loading project from: {}", origin.path().display())
        } else {
            writeln!(
                self.out,
                "Loading TypeScript files from: {}",
                origin.path().display()
            )
        }
    }

    pub fn found(&mut self, files: usize) -> io::Result<()> {
        writeln!(self.out, "Found {} source files", files)?;
        writeln!(self.out)
    }

    /// Per repaired declaration: one line per changed parameter, then the
    /// declaration itself.
    pub fn fixes(&mut self, report: &UnitReport) -> io::Result<()> {
        for fix in &report.fixes {
            for param in &fix.params {
                writeln!(self.out, "  Fixed parameter \"{}\" - made optional", param)?;
            }
            writeln!(
                self.out,
                "Fixed {} in {}:{}",
                fix.describe(),
                report.path.display(),
                fix.line
            )?;
        }
        Ok(())
    }

    pub fn preview_header(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Changes that would be made:")
    }

    /// Before/after of every line a unit's pending markers touch.
    pub fn preview(&mut self, unit: &SourceUnit) -> io::Result<()> {
        let changes = unit.changed_lines();
        if changes.is_empty() {
            return Ok(());
        }
        writeln!(self.out, "--- {}", unit.path().display())?;
        let width = changes
            .last()
            .map(|c| c.line.to_string().len())
            .unwrap_or(1);
        for change in changes {
            writeln!(self.out, "{:>width$} - {}", change.line, change.before)?;
            writeln!(self.out, "{:>width$} + {}", change.line, change.after)?;
        }
        writeln!(self.out)
    }

    pub fn saving(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Saving changes...")
    }

    pub fn done(&mut self, fixes: usize, files: usize) -> io::Result<()> {
        writeln!(
            self.out,
            "Done! Fixed {} function(s) in {} file(s).",
            fixes, files
        )
    }

    pub fn dry_run_done(&mut self, fixes: usize, files: usize) -> io::Result<()> {
        writeln!(
            self.out,
            "Dry run: would fix {} function(s) in {} file(s).",
            fixes, files
        )
    }

    pub fn nothing_to_fix(&mut self) -> io::Result<()> {
        writeln!(self.out, "No TS1016 errors found.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::walker::fix_unit;

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Reporter<&mut Vec<u8>>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        let mut reporter = Reporter::new(&mut buf);
        f(&mut reporter).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_loading_line_depends_on_origin() {
        let manifest = ProjectOrigin::Manifest("/p/tsconfig.json".into());
        let dir = ProjectOrigin::Directory("/p/src".into());

        assert_eq!(
            render(|r| r.loading(&manifest)),
            "Loading project from: /p/tsconfig.json\n"
        );
        assert_eq!(
            render(|r| r.loading(&dir)),
            "Loading TypeScript files from: /p/src\n"
        );
    }

    #[test]
    fn test_fix_lines() {
        let mut unit = SourceUnit::parse(
            "a.ts",
            "class A {\n  m(x?: number, y: number, z: number) {}\n}\n",
        )
        .unwrap();
        let report = fix_unit(&mut unit);

        assert_eq!(
            render(|r| r.fixes(&report)),
            "  Fixed parameter \"y\" - made optional\n  Fixed parameter \"z\" - made optional\nFixed method: A.m in a.ts:2\n"
        );
    }

    #[test]
    fn test_preview_shows_before_and_after() {
        let mut unit = SourceUnit::parse("a.ts", "function f(a?: string, b: number) {}\n").unwrap();
        fix_unit(&mut unit);

        assert_eq!(
            render(|r| r.preview(&unit)),
            "--- a.ts\n1 - function f(a?: string, b: number) {}\n1 + function f(a?: string, b?: number) {}\n\n"
        );
    }

    #[test]
    fn test_summaries() {
        assert_eq!(
            render(|r| r.done(3, 2)),
            "Done! Fixed 3 function(s) in 2 file(s).\n"
        );
        assert_eq!(
            render(|r| r.dry_run_done(1, 1)),
            "Dry run: would fix 1 function(s) in 1 file(s).\n"
        );
        assert_eq!(render(|r| r.nothing_to_fix()), "No TS1016 errors found.\n");
        assert_eq!(render(|r| r.found(4)), "Found 4 source files\n\n");
    }
}
