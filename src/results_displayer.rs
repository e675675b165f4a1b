// results_displayer.rs — Display formatting for icon runs
//
// One line per directory, then a summary.  List mode shows the directory's
// read-only/hidden/system column and its icon state; the other modes show
// what happened to each directory.

use std::io::{self, Write};
use std::path::Path;

use crate::directory_node::IconState;
use crate::ehm::AppError;
use crate::file_attributes::format_attributes;
use crate::tree_synchronizer::SyncReport;





/// Counts for the list-mode summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StateTotals {
    pub assigned:   usize,
    pub pending:    usize,
    pub stale:      usize,
    pub unassigned: usize,
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl StateTotals
//
//  Tally one state.
//
////////////////////////////////////////////////////////////////////////////////

impl StateTotals {
    pub fn add(&mut self, state: IconState) {
        match state {
            IconState::Assigned   => self.assigned   += 1,
            IconState::Pending    => self.pending    += 1,
            IconState::Stale      => self.stale      += 1,
            IconState::Unassigned => self.unassigned += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.assigned + self.pending + self.stale + self.unassigned
    }
}





/// Trait for displaying per-directory results and run summaries.
pub trait ResultsDisplayer {
    fn display_state(&mut self, path: &Path, attributes: u32, state: IconState) -> io::Result<()>;
    fn display_outcome(&mut self, path: &Path, outcome: &Result<bool, AppError>) -> io::Result<()>;
    fn display_error(&mut self, path: &Path, error: &AppError) -> io::Result<()>;
    fn display_list_summary(&mut self, totals: &StateTotals) -> io::Result<()>;
    fn display_sync_summary(&mut self, report: &SyncReport) -> io::Result<()>;
}





/// Plain-text displayer over any writer.
pub struct TextDisplayer<W: Write> {
    out:   W,
    quiet: bool,
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl TextDisplayer
//
//  Construction and writer access.
//
////////////////////////////////////////////////////////////////////////////////

impl<W: Write> TextDisplayer<W> {
    pub fn new(out: W, quiet: bool) -> Self {
        TextDisplayer { out, quiet }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl ResultsDisplayer for TextDisplayer
//
//  Quiet mode keeps errors and summaries and drops the per-directory
//  success lines.
//
////////////////////////////////////////////////////////////////////////////////

impl<W: Write> ResultsDisplayer for TextDisplayer<W> {
    fn display_state(&mut self, path: &Path, attributes: u32, state: IconState) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        writeln!(self.out, "{}  {:<10}  {}", format_attributes(attributes), state.name(), path.display())
    }





    fn display_outcome(&mut self, path: &Path, outcome: &Result<bool, AppError>) -> io::Result<()> {
        match outcome {
            Ok(assigned) if !self.quiet => {
                let label = if *assigned { "icon set" } else { "no icon" };
                writeln!(self.out, "{:<10}  {}", label, path.display())
            }
            Ok(_)      => Ok(()),
            Err(error) => self.display_error(path, error),
        }
    }





    fn display_error(&mut self, path: &Path, error: &AppError) -> io::Result<()> {
        // Most errors already name their path
        if error.path().is_some() {
            writeln!(self.out, "{error}")
        } else {
            writeln!(self.out, "{error} ({})", path.display())
        }
    }





    fn display_list_summary(&mut self, totals: &StateTotals) -> io::Result<()> {
        writeln!(
            self.out,
            "{} directories: {} assigned, {} pending, {} stale, {} unassigned",
            totals.total(),
            totals.assigned,
            totals.pending,
            totals.stale,
            totals.unassigned,
        )
    }





    fn display_sync_summary(&mut self, report: &SyncReport) -> io::Result<()> {
        writeln!(
            self.out,
            "{} directories: {} with icon, {} without, {} failed",
            report.directory_count(),
            report.assigned.len(),
            report.unchanged.len(),
            report.failures.len(),
        )
    }
}
