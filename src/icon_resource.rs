// icon_resource.rs — Validated .ico file
//
// An IconResource is only ever built through from_path (extension and
// existence checked once) or create_from_image (produced by an
// IconConverter).  It holds nothing but the path; exists() asks the disk.

use std::path::{Path, PathBuf};

use log::info;

use crate::ehm::AppError;
use crate::icon_converter::IconConverter;

/// Extension a file must carry to be accepted as an icon resource.
pub const ICON_EXTENSION: &str = "ico";

/// Conventional icon file name; its presence in a directory means
/// "use me as this folder's icon".
pub const ICON_FILE_NAME: &str = "icon.ico";

/// Index of the image inside the resource that descriptors point at.
pub const ICON_INDEX: u32 = 0;





#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconResource {
    path: PathBuf,
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl IconResource
//
//  Validating constructors and accessors.
//
////////////////////////////////////////////////////////////////////////////////

impl IconResource {
    ////////////////////////////////////////////////////////////////////////////
    //
    //  from_path
    //
    //  Accept an existing .ico file.  The extension is checked first, so a
    //  non-.ico path is a Format error whether or not it exists.  The check
    //  ignores case since Windows file names do.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();

        if !has_icon_extension(&path) {
            return Err(AppError::Format(path));
        }

        if !path.is_file() {
            return Err(AppError::NotFound(path));
        }

        Ok(IconResource { path })
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  create_from_image
    //
    //  Convert `source` into icon.ico in the same directory and return it.
    //  Converter failures propagate as-is; nothing is retried.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn create_from_image(source: &Path, converter: &dyn IconConverter) -> Result<Self, AppError> {
        if !source.is_file() {
            return Err(AppError::NotFound(source.to_path_buf()));
        }

        let destination = source
            .parent()
            .map(|dir| dir.join(ICON_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(ICON_FILE_NAME));

        converter.convert(source, &destination)?;

        info!("{}: created {}", source.display(), destination.display());

        Ok(IconResource { path: destination })
    }





    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  absolute_path
    //
    //  The icon's path made absolute against the current directory, without
    //  resolving links (canonicalize would add a \\?\ prefix on Windows that
    //  Explorer does not understand).
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn absolute_path(&self) -> Result<PathBuf, AppError> {
        std::path::absolute(&self.path).map_err(|e| AppError::io(&self.path, e))
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  reference_value
    //
    //  Descriptor value pointing at this icon: "<absolute path>,0".
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn reference_value(&self) -> Result<String, AppError> {
        Ok(format!("{},{}", self.absolute_path()?.display(), ICON_INDEX))
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  has_icon_extension
//
//  True if `path` ends in .ico (any case).
//
////////////////////////////////////////////////////////////////////////////////

pub fn has_icon_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(ICON_EXTENSION))
        .unwrap_or(false)
}
