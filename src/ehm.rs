// ehm.rs — Error handling module
//
// One error type for the whole crate.  Every core operation returns
// Result<T, AppError>; callers branch on AppError::kind() and report the
// offending path from AppError::path().

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;





/// Coarse classification of an AppError, for callers that only need to
/// branch on what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Format,
    Conversion,
    Attribute,
    Io,
    InvalidArg,
    Partial,
}





/// Unified error type for RCIcon.
#[derive(Debug, Error)]
pub enum AppError {
    /// Referenced file or directory is missing at the time of use
    #[error("Error:   {} does not exist", .0.display())]
    NotFound(PathBuf),

    /// File is not an icon resource (wrong extension)
    #[error("Error:   {} is not an .ico file", .0.display())]
    Format(PathBuf),

    /// Image could not be decoded, scaled or encoded as an icon
    #[error("Error:   unable to convert {} to an icon: {source}", .path.display())]
    Conversion {
        path:   PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// OS declined an attribute read or mutation
    #[error("Error:   unable to change attributes of {}: {source}", .path.display())]
    Attribute {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading or writing file content failed
    #[error("Error:   {}: {source}", .path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing to the console failed
    #[error("Error:   unable to write output: {0}")]
    Output(#[from] io::Error),

    /// Invalid command-line argument (triggers usage display + exit 1)
    #[error("{0}")]
    InvalidArg(String),

    /// A best-effort run finished but some directories failed
    #[error("Error:   {failed} of {total} directories could not be updated")]
    Partial {
        failed: usize,
        total:  usize,
    },
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl AppError
//
//  Kind and path accessors, plus constructors that pick NotFound over the
//  generic variants when the OS reports a missing path.
//
////////////////////////////////////////////////////////////////////////////////

impl AppError {
    ////////////////////////////////////////////////////////////////////////////
    //
    //  kind
    //
    //  Returns the coarse classification of this error.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_)           => ErrorKind::NotFound,
            AppError::Format(_)             => ErrorKind::Format,
            AppError::Conversion { .. }     => ErrorKind::Conversion,
            AppError::Attribute { .. }      => ErrorKind::Attribute,
            AppError::Io { .. }             => ErrorKind::Io,
            AppError::Output(_)             => ErrorKind::Io,
            AppError::InvalidArg(_)         => ErrorKind::InvalidArg,
            AppError::Partial { .. }        => ErrorKind::Partial,
        }
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  path
    //
    //  Returns the path the error is about, if it has one.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn path(&self) -> Option<&Path> {
        match self {
            AppError::NotFound(path) | AppError::Format(path) => Some(path),
            AppError::Conversion { path, .. }
            | AppError::Attribute { path, .. }
            | AppError::Io { path, .. } => Some(path),
            AppError::Output(_) | AppError::InvalidArg(_) | AppError::Partial { .. } => None,
        }
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  io
    //
    //  Wraps an I/O failure on `path`.  io::ErrorKind::NotFound becomes
    //  AppError::NotFound so callers see one kind for a missing path.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            AppError::NotFound(path.to_path_buf())
        } else {
            AppError::Io { path: path.to_path_buf(), source }
        }
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  attribute
    //
    //  Wraps an attribute get/set failure on `path`, with the same
    //  NotFound folding as io().
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn attribute(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            AppError::NotFound(path.to_path_buf())
        } else {
            AppError::Attribute { path: path.to_path_buf(), source }
        }
    }
}
