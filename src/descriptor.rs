// descriptor.rs — desktop.ini descriptor handling
//
// A Descriptor is a path to a directory's desktop.ini plus the attribute
// capability needed to hide it.  Content is re-read from disk on every
// operation; nothing is cached between calls.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::ehm::AppError;
use crate::file_attributes::{AttributeHandle, AttributeProvider};
use crate::icon_resource::IconResource;
use crate::ini_file::IniDocument;

pub const DESCRIPTOR_FILE_NAME: &str = "desktop.ini";

/// Section holding the icon reference.
pub const SHELL_CLASS_INFO_SECTION: &str = ".ShellClassInfo";

/// Key of the icon reference inside SHELL_CLASS_INFO_SECTION.
pub const ICON_RESOURCE_KEY: &str = "IconResource";

/// Written verbatim when a directory gets its first descriptor.
pub const DEFAULT_TEMPLATE: &str = "[.ShellClassInfo]\r\n\
                                    iconresource =C:\\Windows\\System32\\SHELL32.dll,5\r\n\
                                    \r\n\
                                    [ViewState]\r\n\
                                    mode =\r\n\
                                    vid =\r\n\
                                    foldertype =Generic\r\n";





pub struct Descriptor<'a> {
    path:     PathBuf,
    provider: &'a dyn AttributeProvider,
}





/// Scoped clear of a descriptor's hidden and system bits.
///
/// Both bits are cleared when the guard is taken and set again when it is
/// released, either explicitly through restore() or on drop.  Drop cannot
/// report failure, so it logs instead.
pub struct AttributeUnlock<'d, 'a> {
    descriptor: &'d Descriptor<'a>,
    restored:   bool,
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl Descriptor
//
//  Create / load, icon reference edits, attribute scoping.
//
////////////////////////////////////////////////////////////////////////////////

impl<'a> Descriptor<'a> {
    ////////////////////////////////////////////////////////////////////////////
    //
    //  create
    //
    //  Write DEFAULT_TEMPLATE to desktop.ini inside `directory`, replacing
    //  any file already there.  Callers check has_descriptor first.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn create(directory: &Path, provider: &'a dyn AttributeProvider) -> Result<Self, AppError> {
        if !directory.is_dir() {
            return Err(AppError::NotFound(directory.to_path_buf()));
        }

        let path = directory.join(DESCRIPTOR_FILE_NAME);
        fs::write(&path, DEFAULT_TEMPLATE).map_err(|e| AppError::io(&path, e))?;

        debug!("{}: created from default template", path.display());

        Ok(Descriptor { path, provider })
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  load
    //
    //  Open the existing desktop.ini inside `directory`.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn load(directory: &Path, provider: &'a dyn AttributeProvider) -> Result<Self, AppError> {
        let path = directory.join(DESCRIPTOR_FILE_NAME);

        if !path.is_file() {
            return Err(AppError::NotFound(path));
        }

        Ok(Descriptor { path, provider })
    }





    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn attributes(&self) -> Result<AttributeHandle<'a>, AppError> {
        AttributeHandle::new(&self.path, self.provider)
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  icon_reference
    //
    //  Current IconResource value, if any.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn icon_reference(&self) -> Result<Option<String>, AppError> {
        let doc = self.read()?;
        Ok(doc.get(SHELL_CLASS_INFO_SECTION, ICON_RESOURCE_KEY).map(str::to_string))
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  set_icon_reference
    //
    //  Upsert IconResource = "<absolute icon path>,0".  The file is only
    //  rewritten when the value actually changes.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn set_icon_reference(&self, icon: &IconResource) -> Result<(), AppError> {
        let value   = icon.reference_value()?;
        let mut doc = self.read()?;

        if doc.set(SHELL_CLASS_INFO_SECTION, ICON_RESOURCE_KEY, &value) {
            self.write(&doc)?;
            info!("{}: {} = {}", self.path.display(), ICON_RESOURCE_KEY, value);
        }

        Ok(())
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  remove_icon_reference
    //
    //  Delete IconResource and, if that empties .ShellClassInfo, the section
    //  too.  Returns false (and leaves the file untouched) if there was no
    //  reference.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn remove_icon_reference(&self) -> Result<bool, AppError> {
        let mut doc = self.read()?;

        if !doc.remove_key(SHELL_CLASS_INFO_SECTION, ICON_RESOURCE_KEY) {
            return Ok(false);
        }

        if !doc.section_has_entries(SHELL_CLASS_INFO_SECTION) {
            doc.remove_section(SHELL_CLASS_INFO_SECTION);
        }

        self.write(&doc)?;
        info!("{}: removed {}", self.path.display(), ICON_RESOURCE_KEY);

        Ok(true)
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  unlock
    //
    //  Clear system then hidden, returning a guard that sets them again.
    //  If clearing hidden fails, system is put back before returning.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn unlock(&self) -> Result<AttributeUnlock<'_, 'a>, AppError> {
        let attrs = self.attributes()?;

        attrs.set_system(false)?;
        let guard = AttributeUnlock { descriptor: self, restored: false };
        attrs.set_hidden(false)?;

        Ok(guard)
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  edit_unlocked
    //
    //  Run `edit` with hidden and system cleared, restoring both on every
    //  exit path.  An edit error takes precedence over a restore error.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn edit_unlocked<T>(&self, edit: impl FnOnce(&Self) -> Result<T, AppError>) -> Result<T, AppError> {
        let guard  = self.unlock()?;
        let result = edit(self);

        match result {
            Ok(value) => {
                guard.restore()?;
                Ok(value)
            }
            Err(e) => {
                drop(guard);
                Err(e)
            }
        }
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  hide
    //
    //  Mark the descriptor hidden + system.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn hide(&self) -> Result<(), AppError> {
        let attrs = self.attributes()?;
        attrs.set_system(true)?;
        attrs.set_hidden(true)
    }





    fn read(&self) -> Result<IniDocument, AppError> {
        IniDocument::load(&self.path).map_err(|e| AppError::io(&self.path, e))
    }

    fn write(&self, doc: &IniDocument) -> Result<(), AppError> {
        doc.save(&self.path).map_err(|e| AppError::io(&self.path, e))
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl AttributeUnlock
//
//  Explicit release.
//
////////////////////////////////////////////////////////////////////////////////

impl AttributeUnlock<'_, '_> {
    pub fn restore(mut self) -> Result<(), AppError> {
        self.restored = true;
        self.descriptor.hide()
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl Drop for AttributeUnlock
//
//  Release on an error or panic path.
//
////////////////////////////////////////////////////////////////////////////////

impl Drop for AttributeUnlock<'_, '_> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }

        if let Err(e) = self.descriptor.hide() {
            warn!("{}: unable to restore hidden/system attributes: {}", self.descriptor.path.display(), e);
        }
    }
}
