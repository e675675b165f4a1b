// file_attributes.rs — Hidden / system / read-only attribute access
//
// AttributeHandle wraps one path and reads or flips a single attribute bit
// per call.  The OS primitives sit behind the AttributeProvider trait so the
// rest of the crate never touches Win32 directly:
//
//   Win32AttributeProvider  — GetFileAttributesW / SetFileAttributesW
//   PosixAttributeProvider  — permission bits for file read-only, in-process
//                             table for the bits POSIX has no home for

use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::ehm::AppError;

// ── File attribute constants (Win32 values) ───────────────────────────────────

pub const FILE_ATTRIBUTE_READONLY:  u32 = 0x0000_0001;
pub const FILE_ATTRIBUTE_HIDDEN:    u32 = 0x0000_0002;
pub const FILE_ATTRIBUTE_SYSTEM:    u32 = 0x0000_0004;
pub const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x0000_0010;
pub const FILE_ATTRIBUTE_ARCHIVE:   u32 = 0x0000_0020;
pub const FILE_ATTRIBUTE_NORMAL:    u32 = 0x0000_0080;

// ── File attribute map ────────────────────────────────────────────────────────

/// Maps the attribute flags RCIcon manages to their single-char display keys,
/// in display column order.
pub const FILE_ATTRIBUTE_MAP: [(u32, char); 3] = [
    (FILE_ATTRIBUTE_READONLY, 'R'),
    (FILE_ATTRIBUTE_HIDDEN,   'H'),
    (FILE_ATTRIBUTE_SYSTEM,   'S'),
];





////////////////////////////////////////////////////////////////////////////////
//
//  format_attributes
//
//  Render the managed attribute bits as a fixed-width column, e.g. "-HS".
//
////////////////////////////////////////////////////////////////////////////////

pub fn format_attributes(attributes: u32) -> String {
    FILE_ATTRIBUTE_MAP
        .iter()
        .map(|&(flag, ch)| if (attributes & flag) != 0 { ch } else { '-' })
        .collect()
}





/// Capability for reading and writing the raw attribute word of a path.
pub trait AttributeProvider {

    ////////////////////////////////////////////////////////////////////////////
    //
    //  get_attributes
    //
    //  Returns the current attribute word (FILE_ATTRIBUTE_* bits) of `path`.
    //
    ////////////////////////////////////////////////////////////////////////////

    fn get_attributes(&self, path: &Path) -> io::Result<u32>;

    ////////////////////////////////////////////////////////////////////////////
    //
    //  set_attributes
    //
    //  Replaces the attribute word of `path`.  Bits the platform cannot set
    //  (DIRECTORY and friends) are ignored.
    //
    ////////////////////////////////////////////////////////////////////////////

    fn set_attributes(&self, path: &Path, attributes: u32) -> io::Result<()>;
}





#[cfg(windows)]
pub type NativeAttributeProvider = Win32AttributeProvider;

#[cfg(not(windows))]
pub type NativeAttributeProvider = PosixAttributeProvider;





/// Attribute provider backed by the Win32 file attribute APIs.
#[cfg(windows)]
#[derive(Debug, Default)]
pub struct Win32AttributeProvider;





////////////////////////////////////////////////////////////////////////////////
//
//  to_wide
//
//  Convert a path into a NUL-terminated UTF-16 string for Win32.
//
////////////////////////////////////////////////////////////////////////////////

#[cfg(windows)]
fn to_wide(path: &Path) -> io::Result<widestring::U16CString> {
    widestring::U16CString::from_os_str(path.as_os_str())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains an interior NUL"))
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl AttributeProvider for Win32AttributeProvider
//
//  Thin wrappers over GetFileAttributesW / SetFileAttributesW.
//
////////////////////////////////////////////////////////////////////////////////

#[cfg(windows)]
impl AttributeProvider for Win32AttributeProvider {
    fn get_attributes(&self, path: &Path) -> io::Result<u32> {
        use windows::Win32::Storage::FileSystem::{GetFileAttributesW, INVALID_FILE_ATTRIBUTES};

        let wide  = to_wide(path)?;
        let attrs = unsafe { GetFileAttributesW(windows::core::PCWSTR(wide.as_ptr())) };

        if attrs == INVALID_FILE_ATTRIBUTES {
            return Err(io::Error::last_os_error());
        }

        Ok(attrs)
    }

    fn set_attributes(&self, path: &Path, attributes: u32) -> io::Result<()> {
        use windows::Win32::Storage::FileSystem::{SetFileAttributesW, FILE_FLAGS_AND_ATTRIBUTES};

        // SetFileAttributesW only accepts these; an empty set must be spelled NORMAL
        const SETTABLE: u32 = FILE_ATTRIBUTE_READONLY
            | FILE_ATTRIBUTE_HIDDEN
            | FILE_ATTRIBUTE_SYSTEM
            | FILE_ATTRIBUTE_ARCHIVE
            | 0x0000_0100   // TEMPORARY
            | 0x0000_1000   // OFFLINE
            | 0x0000_2000;  // NOT_CONTENT_INDEXED

        let mut settable = attributes & SETTABLE;
        if settable == 0 {
            settable = FILE_ATTRIBUTE_NORMAL;
        }

        let wide = to_wide(path)?;
        unsafe {
            SetFileAttributesW(windows::core::PCWSTR(wide.as_ptr()), FILE_FLAGS_AND_ATTRIBUTES(settable))
        }
        .map_err(io::Error::from)
    }
}





/// Attribute provider for platforms without DOS attributes.
///
/// Read-only on regular files maps onto the permission bits.  Hidden,
/// system, and read-only on directories have no POSIX counterpart (a
/// non-writable directory means something else entirely), so those bits
/// live in this provider instance, keyed by device and inode so they stay
/// with the file rather than its name.  They last as long as the provider
/// does.
#[cfg(not(windows))]
#[derive(Debug, Default)]
pub struct PosixAttributeProvider {
    emulated: std::cell::RefCell<std::collections::HashMap<FileIdentity, EmulatedBits>>,
}





/// (st_dev, st_ino)
#[cfg(not(windows))]
type FileIdentity = (u64, u64);





/// Bits held for one file.  `created` tells a recreated file apart when
/// the filesystem hands out the same inode again.
#[cfg(not(windows))]
#[derive(Debug, Clone, Copy)]
struct EmulatedBits {
    bits:    u32,
    created: Option<std::time::SystemTime>,
}





#[cfg(not(windows))]
fn file_identity(metadata: &std::fs::Metadata) -> FileIdentity {
    use std::os::unix::fs::MetadataExt;

    (metadata.dev(), metadata.ino())
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl AttributeProvider for PosixAttributeProvider
//
//  Merges real permission state with the emulated bits.
//
////////////////////////////////////////////////////////////////////////////////

#[cfg(not(windows))]
impl AttributeProvider for PosixAttributeProvider {
    fn get_attributes(&self, path: &Path) -> io::Result<u32> {
        let metadata = std::fs::metadata(path)?;
        let key      = file_identity(&metadata);
        let created  = metadata.created().ok();

        let mut table = self.emulated.borrow_mut();
        let emulated  = match table.get(&key).copied() {
            Some(entry) if entry.created == created => entry.bits,
            Some(_) => {
                debug!("{}: inode reused, emulated attributes dropped", path.display());
                table.remove(&key);
                0
            }
            None => 0,
        };

        let mut attrs = emulated;
        if metadata.is_dir() {
            attrs |= FILE_ATTRIBUTE_DIRECTORY;
        } else if metadata.permissions().readonly() {
            attrs |= FILE_ATTRIBUTE_READONLY;
        }

        if attrs == 0 {
            attrs = FILE_ATTRIBUTE_NORMAL;
        }

        Ok(attrs)
    }

    fn set_attributes(&self, path: &Path, attributes: u32) -> io::Result<()> {
        let metadata = std::fs::metadata(path)?;
        let key      = file_identity(&metadata);

        let mut emulated_mask = FILE_ATTRIBUTE_HIDDEN | FILE_ATTRIBUTE_SYSTEM;

        if metadata.is_dir() {
            emulated_mask |= FILE_ATTRIBUTE_READONLY;
        } else {
            let want_readonly   = (attributes & FILE_ATTRIBUTE_READONLY) != 0;
            let mut permissions = metadata.permissions();

            if permissions.readonly() != want_readonly {
                #[allow(clippy::permissions_set_readonly_false)]
                permissions.set_readonly(want_readonly);
                std::fs::set_permissions(path, permissions)?;
            }
        }

        let bits = attributes & emulated_mask;
        let mut table = self.emulated.borrow_mut();
        if bits == 0 {
            table.remove(&key);
        } else {
            table.insert(key, EmulatedBits { bits, created: metadata.created().ok() });
        }

        Ok(())
    }
}





/// Live handle on one filesystem entry's attribute bits.
///
/// Holds no attribute state of its own: every getter asks the provider and
/// every setter writes through immediately.
pub struct AttributeHandle<'a> {
    path:     PathBuf,
    provider: &'a dyn AttributeProvider,
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl AttributeHandle
//
//  Per-bit getters and setters.
//
////////////////////////////////////////////////////////////////////////////////

impl<'a> AttributeHandle<'a> {
    ////////////////////////////////////////////////////////////////////////////
    //
    //  new
    //
    //  Create a handle for an existing file or directory.  Fails NotFound if
    //  nothing exists at `path`.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn new(path: impl Into<PathBuf>, provider: &'a dyn AttributeProvider) -> Result<Self, AppError> {
        let path = path.into();
        if !path.exists() {
            return Err(AppError::NotFound(path));
        }

        Ok(AttributeHandle { path, provider })
    }





    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn is_hidden(&self) -> Result<bool, AppError> {
        self.get_flag(FILE_ATTRIBUTE_HIDDEN)
    }

    pub fn set_hidden(&self, value: bool) -> Result<(), AppError> {
        self.set_flag(FILE_ATTRIBUTE_HIDDEN, value)
    }

    pub fn is_system(&self) -> Result<bool, AppError> {
        self.get_flag(FILE_ATTRIBUTE_SYSTEM)
    }

    pub fn set_system(&self, value: bool) -> Result<(), AppError> {
        self.set_flag(FILE_ATTRIBUTE_SYSTEM, value)
    }

    pub fn is_read_only(&self) -> Result<bool, AppError> {
        self.get_flag(FILE_ATTRIBUTE_READONLY)
    }

    pub fn set_read_only(&self, value: bool) -> Result<(), AppError> {
        self.set_flag(FILE_ATTRIBUTE_READONLY, value)
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  attributes
    //
    //  Returns the full attribute word.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn attributes(&self) -> Result<u32, AppError> {
        if !self.exists() {
            return Err(AppError::NotFound(self.path.clone()));
        }

        self.provider
            .get_attributes(&self.path)
            .map_err(|e| AppError::attribute(&self.path, e))
    }





    fn get_flag(&self, flag: u32) -> Result<bool, AppError> {
        Ok((self.attributes()? & flag) != 0)
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  set_flag
    //
    //  Set or clear exactly one bit, leaving every other bit as it was.
    //  Skips the OS call when the bit already has the requested value.
    //
    ////////////////////////////////////////////////////////////////////////////

    fn set_flag(&self, flag: u32, value: bool) -> Result<(), AppError> {
        let current = self.attributes()?;
        let updated = if value { current | flag } else { current & !flag };

        if updated == current {
            return Ok(());
        }

        debug!("{}: attributes {} -> {}", self.path.display(), format_attributes(current), format_attributes(updated));

        self.provider
            .set_attributes(&self.path, updated)
            .map_err(|e| AppError::attribute(&self.path, e))
    }
}





#[cfg(test)]
mod tests {
    use super::*;
    use crate::ehm::ErrorKind;
    use std::fs;

    fn scratch_file() -> (tempfile::TempDir, PathBuf) {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("desktop.ini");
        fs::write(&path, "[ViewState]\r\n").unwrap();
        (dir, path)
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  format_attributes_column
    //
    //  Present bits show their letter, absent bits show a dash.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn format_attributes_column() {
        assert_eq!(format_attributes(0), "---");
        assert_eq!(format_attributes(FILE_ATTRIBUTE_HIDDEN | FILE_ATTRIBUTE_SYSTEM), "-HS");
        assert_eq!(format_attributes(FILE_ATTRIBUTE_READONLY | FILE_ATTRIBUTE_DIRECTORY), "R--");
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  new_fails_for_missing_path
    //
    //  A handle cannot be built for a path that does not exist.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn new_fails_for_missing_path() {
        let provider = NativeAttributeProvider::default();
        let dir = tempfile::tempdir().unwrap();
        let err = AttributeHandle::new(dir.path().join("nope"), &provider).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  hidden_and_system_round_trip
    //
    //  Setters are visible through the getters.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn hidden_and_system_round_trip() {
        let provider = NativeAttributeProvider::default();
        let (_dir, path) = scratch_file();
        let handle = AttributeHandle::new(&path, &provider).unwrap();

        assert!(!handle.is_hidden().unwrap());
        assert!(!handle.is_system().unwrap());

        handle.set_hidden(true).unwrap();
        handle.set_system(true).unwrap();

        assert!(handle.is_hidden().unwrap());
        assert!(handle.is_system().unwrap());
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  clearing_one_bit_keeps_the_others
    //
    //  Clearing hidden must leave system set, and vice versa.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn clearing_one_bit_keeps_the_others() {
        let provider = NativeAttributeProvider::default();
        let (_dir, path) = scratch_file();
        let handle = AttributeHandle::new(&path, &provider).unwrap();

        handle.set_hidden(true).unwrap();
        handle.set_system(true).unwrap();

        handle.set_hidden(false).unwrap();
        assert!(!handle.is_hidden().unwrap());
        assert!(handle.is_system().unwrap());

        handle.set_hidden(true).unwrap();
        handle.set_system(false).unwrap();
        assert!(handle.is_hidden().unwrap());
        assert!(!handle.is_system().unwrap());
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  setting_current_value_is_idempotent
    //
    //  Setting a bit twice leaves the same attribute word.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn setting_current_value_is_idempotent() {
        let provider = NativeAttributeProvider::default();
        let (_dir, path) = scratch_file();
        let handle = AttributeHandle::new(&path, &provider).unwrap();

        handle.set_hidden(true).unwrap();
        let once = handle.attributes().unwrap();
        handle.set_hidden(true).unwrap();
        assert_eq!(handle.attributes().unwrap(), once);
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  directory_read_only
    //
    //  The read-only bit can be set on a directory and the directory stays
    //  usable for creating files.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn directory_read_only() {
        let provider = NativeAttributeProvider::default();
        let dir = tempfile::tempdir().unwrap();
        let handle = AttributeHandle::new(dir.path(), &provider).unwrap();

        handle.set_read_only(true).unwrap();
        assert!(handle.is_read_only().unwrap());

        fs::write(dir.path().join("inside.txt"), "x").unwrap();

        handle.set_read_only(false).unwrap();
        assert!(!handle.is_read_only().unwrap());
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  deleted_path_reports_not_found
    //
    //  Existence is re-checked on every call.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[test]
    fn deleted_path_reports_not_found() {
        let provider = NativeAttributeProvider::default();
        let (_dir, path) = scratch_file();
        let handle = AttributeHandle::new(&path, &provider).unwrap();

        fs::remove_file(&path).unwrap();

        assert!(!handle.exists());
        assert_eq!(handle.is_hidden().err().unwrap().kind(), ErrorKind::NotFound);
        assert_eq!(handle.set_system(true).err().unwrap().kind(), ErrorKind::NotFound);
    }






    ////////////////////////////////////////////////////////////////////////////
    //
    //  replaced_file_starts_clean
    //
    //  Emulated bits belong to the file, not the name: a new file moved
    //  into place is not hidden, and the old bits follow a rename.
    //
    ////////////////////////////////////////////////////////////////////////////

    #[cfg(not(windows))]
    #[test]
    fn replaced_file_starts_clean() {
        let provider    = PosixAttributeProvider::default();
        let (dir, path) = scratch_file();
        let moved       = dir.path().join("old.ini");
        let fresh       = dir.path().join("desktop.ini.new");

        provider.set_attributes(&path, FILE_ATTRIBUTE_HIDDEN | FILE_ATTRIBUTE_SYSTEM).unwrap();
        assert_eq!(provider.get_attributes(&path).unwrap(), FILE_ATTRIBUTE_HIDDEN | FILE_ATTRIBUTE_SYSTEM);

        fs::write(&fresh, "[ViewState]\r\n").unwrap();
        fs::rename(&path, &moved).unwrap();
        fs::rename(&fresh, &path).unwrap();

        assert_eq!(provider.get_attributes(&path).unwrap(), FILE_ATTRIBUTE_NORMAL);
        assert_eq!(provider.get_attributes(&moved).unwrap(), FILE_ATTRIBUTE_HIDDEN | FILE_ATTRIBUTE_SYSTEM);

        fs::remove_file(&moved).unwrap();
        let handle = AttributeHandle::new(&path, &provider).unwrap();
        assert!(!handle.is_hidden().unwrap());
        assert!(!handle.is_system().unwrap());
    }
}
