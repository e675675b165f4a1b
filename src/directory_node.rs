// directory_node.rs — One managed directory
//
// A DirectoryNode is a directory path plus the attribute capability.  It
// owns at most one descriptor (desktop.ini) and at most one conventional
// icon file (icon.ico); both are looked up on disk every time.
//
// The synchronization rule:
//   icon.ico present           → point desktop.ini at it
//   icon.ico gone, ini present → drop the stale reference
//   neither                    → nothing to do

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::descriptor::{Descriptor, DESCRIPTOR_FILE_NAME};
use crate::ehm::AppError;
use crate::file_attributes::{AttributeHandle, AttributeProvider};
use crate::icon_resource::{IconResource, ICON_FILE_NAME};





/// What a directory's icon situation looks like right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconState {
    /// icon.ico present and desktop.ini points at it
    Assigned,

    /// icon.ico present but desktop.ini does not (yet) point at it
    Pending,

    /// desktop.ini has a reference but icon.ico is gone
    Stale,

    /// No icon.ico and no reference
    Unassigned,
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl IconState
//
//  Display names.
//
////////////////////////////////////////////////////////////////////////////////

impl IconState {
    pub fn name(&self) -> &'static str {
        match self {
            IconState::Assigned   => "Assigned",
            IconState::Pending    => "Pending",
            IconState::Stale      => "Stale",
            IconState::Unassigned => "Unassigned",
        }
    }
}





#[derive(Clone)]
pub struct DirectoryNode<'a> {
    path:     PathBuf,
    provider: &'a dyn AttributeProvider,
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl Debug for DirectoryNode
//
//  The provider is not interesting; show the path.
//
////////////////////////////////////////////////////////////////////////////////

impl std::fmt::Debug for DirectoryNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryNode").field("path", &self.path).finish()
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl DirectoryNode
//
//  Icon-state queries, single-directory sync, subtree discovery.
//
////////////////////////////////////////////////////////////////////////////////

impl<'a> DirectoryNode<'a> {
    ////////////////////////////////////////////////////////////////////////////
    //
    //  from_path
    //
    //  Wrap an existing directory.  Fails NotFound otherwise.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn from_path(path: impl Into<PathBuf>, provider: &'a dyn AttributeProvider) -> Result<Self, AppError> {
        let path = path.into();

        if !path.is_dir() {
            return Err(AppError::NotFound(path));
        }

        Ok(DirectoryNode { path, provider })
    }





    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.path.join(DESCRIPTOR_FILE_NAME)
    }

    pub fn icon_file_path(&self) -> PathBuf {
        self.path.join(ICON_FILE_NAME)
    }

    pub fn has_descriptor(&self) -> bool {
        self.descriptor_path().is_file()
    }

    pub fn has_icon_file(&self) -> bool {
        self.icon_file_path().is_file()
    }

    pub fn attributes(&self) -> Result<AttributeHandle<'a>, AppError> {
        AttributeHandle::new(&self.path, self.provider)
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  get_icon_file
    //
    //  The conventional icon.ico in this directory.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn get_icon_file(&self) -> Result<IconResource, AppError> {
        if !self.has_icon_file() {
            return Err(AppError::NotFound(self.icon_file_path()));
        }

        IconResource::from_path(self.icon_file_path())
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  descriptor
    //
    //  Load desktop.ini if present.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn descriptor(&self) -> Result<Option<Descriptor<'a>>, AppError> {
        if !self.has_descriptor() {
            return Ok(None);
        }

        Descriptor::load(&self.path, self.provider).map(Some)
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  set_icon_if_has
    //
    //  Bring desktop.ini in line with icon.ico.  Returns true if this
    //  directory has an icon file (and now uses it).
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn set_icon_if_has(&self) -> Result<bool, AppError> {
        if self.has_icon_file() {
            self.change_icon(&self.get_icon_file()?)?;
            return Ok(true);
        }

        if let Some(descriptor) = self.descriptor()?
            && descriptor.remove_icon_reference()?
        {
            info!("{}: icon file gone, reference removed", self.path.display());
        }

        Ok(false)
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  change_icon
    //
    //  Point this directory's descriptor at `icon`:
    //    1. load desktop.ini, or create it from the default template
    //    2. re-check that the icon still exists
    //    3. clear system + hidden on desktop.ini
    //    4. write the reference
    //    5. set system + hidden again (also when 4 fails)
    //    6. set the directory read-only, which tells Explorer to read
    //       desktop.ini at all
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn change_icon(&self, icon: &IconResource) -> Result<(), AppError> {
        let descriptor = match self.descriptor()? {
            Some(existing) => existing,
            None => Descriptor::create(&self.path, self.provider)?,
        };

        if !icon.exists() {
            return Err(AppError::NotFound(icon.path().to_path_buf()));
        }

        descriptor.edit_unlocked(|d| d.set_icon_reference(icon))?;

        self.attributes()?.set_read_only(true)?;

        info!("{}: icon set to {}", self.path.display(), icon.path().display());
        Ok(())
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  icon_state
    //
    //  Classify without changing anything.  The reference counts as
    //  pointing at icon.ico when its path part names the same file, compared
    //  without regard to case.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn icon_state(&self) -> Result<IconState, AppError> {
        let reference = match self.descriptor()? {
            Some(descriptor) => descriptor.icon_reference()?,
            None => None,
        };

        if !self.has_icon_file() {
            return Ok(match reference {
                Some(_) => IconState::Stale,
                None    => IconState::Unassigned,
            });
        }

        let expected = self.get_icon_file()?.absolute_path()?;
        let points_at_icon = reference
            .as_deref()
            .map(reference_path)
            .map(|p| p.eq_ignore_ascii_case(&expected.to_string_lossy()))
            .unwrap_or(false);

        Ok(if points_at_icon { IconState::Assigned } else { IconState::Pending })
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  recurse_to_list
    //
    //  This directory followed by every directory below it, depth first in
    //  whatever order read_dir yields.  Symbolic links to directories are
    //  not followed, so link cycles cannot loop.  Recomputed on every call.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn recurse_to_list(&self) -> Result<Vec<DirectoryNode<'a>>, AppError> {
        let mut nodes = vec![self.clone()];
        self.collect_subdirectories(&self.path, &mut nodes)?;

        debug!("{}: {} directories", self.path.display(), nodes.len());
        Ok(nodes)
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  recursively_set
    //
    //  set_icon_if_has on every directory of recurse_to_list, in order.
    //  Stops at the first failure; earlier changes stay as they are.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn recursively_set(&self) -> Result<(), AppError> {
        for node in self.recurse_to_list()? {
            node.set_icon_if_has()?;
        }

        Ok(())
    }





    fn collect_subdirectories(&self, dir: &Path, nodes: &mut Vec<DirectoryNode<'a>>) -> Result<(), AppError> {
        let entries = fs::read_dir(dir).map_err(|e| AppError::io(dir, e))?;

        for entry in entries {
            let entry     = entry.map_err(|e| AppError::io(dir, e))?;
            let file_type = entry.file_type().map_err(|e| AppError::io(&entry.path(), e))?;

            if !file_type.is_dir() {
                continue;
            }

            let child = entry.path();
            nodes.push(DirectoryNode { path: child.clone(), provider: self.provider });
            self.collect_subdirectories(&child, nodes)?;
        }

        Ok(())
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  reference_path
//
//  Path part of an icon reference: "C:\x\icon.ico,0" → "C:\x\icon.ico".
//  A value without an index is returned whole.
//
////////////////////////////////////////////////////////////////////////////////

pub fn reference_path(reference: &str) -> &str {
    match reference.rsplit_once(',') {
        Some((path, index)) if index.trim().parse::<i32>().is_ok() => path.trim(),
        _ => reference.trim(),
    }
}





#[cfg(test)]
mod tests {
    use super::*;
    use crate::ehm::ErrorKind;
    use crate::file_attributes::NativeAttributeProvider;

    ////////////////////////////////////////////////////////////////////////////
    //
    //  reference_path_strips_index
    //
    //  Trailing ",N" is removed; commas inside the path are kept.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn reference_path_strips_index() {
        assert_eq!(reference_path(r"C:\x\icon.ico,0"), r"C:\x\icon.ico");
        assert_eq!(reference_path(r"C:\a,b\icon.ico,0"), r"C:\a,b\icon.ico");
        assert_eq!(reference_path(r"C:\x\SHELL32.dll,-5"), r"C:\x\SHELL32.dll");
        assert_eq!(reference_path(r"C:\a,b\icon.ico"), r"C:\a,b\icon.ico");
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  from_path_rejects_files_and_missing
    //
    //  Only existing directories make nodes.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn from_path_rejects_files_and_missing() {
        let provider = NativeAttributeProvider::default();
        let dir  = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        assert_eq!(DirectoryNode::from_path(&file, &provider).err().unwrap().kind(), ErrorKind::NotFound);
        assert_eq!(
            DirectoryNode::from_path(dir.path().join("gone"), &provider).err().unwrap().kind(),
            ErrorKind::NotFound
        );
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  get_icon_file_missing
    //
    //  No icon.ico: NotFound naming the expected path.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn get_icon_file_missing() {
        let provider = NativeAttributeProvider::default();
        let dir  = tempfile::tempdir().unwrap();
        let node = DirectoryNode::from_path(dir.path(), &provider).unwrap();

        let err = node.get_icon_file().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.path(), Some(node.icon_file_path().as_path()));
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  empty_directory_is_untouched
    //
    //  Neither file present: false, and no descriptor appears.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn empty_directory_is_untouched() {
        let provider = NativeAttributeProvider::default();
        let dir  = tempfile::tempdir().unwrap();
        let node = DirectoryNode::from_path(dir.path(), &provider).unwrap();

        assert!(!node.set_icon_if_has().unwrap());
        assert!(!node.has_descriptor());
        assert_eq!(node.icon_state().unwrap(), IconState::Unassigned);
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  change_icon_rejects_vanished_icon
    //
    //  An icon deleted after validation is caught before any attribute
    //  change.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn change_icon_rejects_vanished_icon() {
        let provider = NativeAttributeProvider::default();
        let dir  = tempfile::tempdir().unwrap();
        let node = DirectoryNode::from_path(dir.path(), &provider).unwrap();

        fs::write(node.icon_file_path(), b"ico").unwrap();
        let icon = node.get_icon_file().unwrap();
        fs::remove_file(icon.path()).unwrap();

        let err = node.change_icon(&icon).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!node.attributes().unwrap().is_read_only().unwrap());
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  icon_state_tracks_sync
    //
    //  Pending before sync, Assigned after, Stale once icon.ico is deleted.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn icon_state_tracks_sync() {
        let provider = NativeAttributeProvider::default();
        let dir  = tempfile::tempdir().unwrap();
        let node = DirectoryNode::from_path(dir.path(), &provider).unwrap();

        fs::write(node.icon_file_path(), b"ico").unwrap();
        assert_eq!(node.icon_state().unwrap(), IconState::Pending);

        assert!(node.set_icon_if_has().unwrap());
        assert_eq!(node.icon_state().unwrap(), IconState::Assigned);

        fs::remove_file(node.icon_file_path()).unwrap();
        assert_eq!(node.icon_state().unwrap(), IconState::Stale);

        assert!(!node.set_icon_if_has().unwrap());
        assert_eq!(node.icon_state().unwrap(), IconState::Unassigned);
    }






    ////////////////////////////////////////////////////////////////////////////
    //
    //  ansi_descriptor_is_updated_in_place
    //
    //  A code page desktop.ini has its stale reference removed, then gets
    //  the new one, with the non-UTF-8 bytes around it untouched.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn ansi_descriptor_is_updated_in_place() {
        let provider = NativeAttributeProvider::default();
        let dir  = tempfile::tempdir().unwrap();
        let node = DirectoryNode::from_path(dir.path(), &provider).unwrap();
        let info_tip: &[u8] = b"[.ShellClassInfo]\r\nInfoTip=Caf\xE9\r\n";

        fs::write(node.descriptor_path(), [info_tip, &b"IconResource=gone.ico,0\r\n"[..]].concat()).unwrap();

        assert!(!node.set_icon_if_has().unwrap());
        assert_eq!(fs::read(node.descriptor_path()).unwrap(), info_tip);

        fs::write(node.icon_file_path(), b"ico").unwrap();
        assert!(node.set_icon_if_has().unwrap());

        let reference = node.get_icon_file().unwrap().reference_value().unwrap();
        let expected  = [info_tip, format!("IconResource={reference}\r\n").as_bytes()].concat();
        assert_eq!(fs::read(node.descriptor_path()).unwrap(), expected);
        assert_eq!(node.icon_state().unwrap(), IconState::Assigned);
    }
}
