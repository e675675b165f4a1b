// tree_synchronizer.rs — Synchronize a list of directory trees
//
// Holds the working list of directories (every root plus everything
// discovered beneath it) and runs set_icon_if_has over it in order.
//
// FailurePolicy::FailFast stops at the first error, exactly like
// DirectoryNode::recursively_set.  FailurePolicy::BestEffort records the
// error and moves on to the next directory.  Neither undoes anything.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::directory_node::DirectoryNode;
use crate::ehm::AppError;
use crate::file_attributes::AttributeProvider;





#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    FailFast,
    BestEffort,
}





/// One directory that could not be synchronized.
#[derive(Debug)]
pub struct SyncFailure {
    pub path:  PathBuf,
    pub error: AppError,
}





/// Outcome of a synchronize() run.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub assigned:  Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub failures:  Vec<SyncFailure>,
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl SyncReport
//
//  Counters.
//
////////////////////////////////////////////////////////////////////////////////

impl SyncReport {
    pub fn directory_count(&self) -> usize {
        self.assigned.len() + self.unchanged.len() + self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}





/// Working list of directories.  `listed` mirrors the paths in
/// `directories` for duplicate checks.
pub struct TreeSynchronizer<'a> {
    provider:    &'a dyn AttributeProvider,
    directories: Vec<DirectoryNode<'a>>,
    listed:      HashSet<PathBuf>,
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl TreeSynchronizer
//
//  List management and synchronization.
//
////////////////////////////////////////////////////////////////////////////////

impl<'a> TreeSynchronizer<'a> {
    pub fn new(provider: &'a dyn AttributeProvider) -> Self {
        TreeSynchronizer {
            provider,
            directories: Vec::new(),
            listed:      HashSet::new(),
        }
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  add_root
    //
    //  Discover `path` and everything below it and append the directories
    //  not already in the list.  Returns how many were added.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn add_root(&mut self, path: impl Into<PathBuf>) -> Result<usize, AppError> {
        let root  = DirectoryNode::from_path(path, self.provider)?;
        let found = root.recurse_to_list()?;
        let before = self.directories.len();

        for node in found {
            if self.listed.insert(node.path().to_path_buf()) {
                self.directories.push(node);
            }
        }

        Ok(self.directories.len() - before)
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  add_directory
    //
    //  Append a single directory without looking below it.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn add_directory(&mut self, path: impl Into<PathBuf>) -> Result<bool, AppError> {
        let node = DirectoryNode::from_path(path, self.provider)?;

        if !self.listed.insert(node.path().to_path_buf()) {
            return Ok(false);
        }

        self.directories.push(node);
        Ok(true)
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  remove
    //
    //  Drop one directory from the list (not its descendants).
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn remove(&mut self, path: &Path) -> bool {
        if !self.listed.remove(path) {
            return false;
        }

        self.directories.retain(|node| node.path() != path);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.listed.contains(path)
    }

    pub fn directories(&self) -> &[DirectoryNode<'a>] {
        &self.directories
    }

    pub fn clear(&mut self) {
        self.directories.clear();
        self.listed.clear();
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  synchronize
    //
    //  set_icon_if_has on every listed directory.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn synchronize(&self, policy: FailurePolicy) -> Result<SyncReport, AppError> {
        self.synchronize_with_progress(policy, |_, _| {})
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  synchronize_with_progress
    //
    //  As synchronize, calling `progress` after each directory with its
    //  outcome.  Under FailFast the failing directory is reported to
    //  `progress` and then its error is returned.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn synchronize_with_progress(
        &self,
        policy: FailurePolicy,
        mut progress: impl FnMut(&Path, &Result<bool, AppError>),
    ) -> Result<SyncReport, AppError> {
        let mut report = SyncReport::default();

        for node in &self.directories {
            let outcome = node.set_icon_if_has();
            progress(node.path(), &outcome);

            match outcome {
                Ok(true)  => report.assigned.push(node.path().to_path_buf()),
                Ok(false) => report.unchanged.push(node.path().to_path_buf()),
                Err(error) => {
                    if policy == FailurePolicy::FailFast {
                        return Err(error);
                    }

                    warn!("{}: skipped: {}", node.path().display(), error);
                    report.failures.push(SyncFailure {
                        path: node.path().to_path_buf(),
                        error,
                    });
                }
            }
        }

        info!(
            "{} directories: {} assigned, {} unchanged, {} failed",
            report.directory_count(),
            report.assigned.len(),
            report.unchanged.len(),
            report.failures.len()
        );

        Ok(report)
    }
}
