//! Error types for rssync-engine.

use std::path::{Path, PathBuf};

use thiserror::Error;

use rssync_core::ClientError;

/// Fatal errors that abort a sync run.
///
/// Recoverable remote failures never surface here; they are recorded as
/// [`ItemFailure`](crate::ItemFailure)s in the run report.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The descriptor file could not be opened or read.
    #[error("cannot read descriptor {path}: {source}")]
    DescriptorIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The descriptor is not well-formed XML.
    #[error("XML error: {message} at line {line}")]
    Xml { line: u64, message: String },

    /// A required attribute is absent from an element.
    #[error("<{element}> at line {line} is missing required attribute {attribute}")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
        line: u64,
    },

    /// A referenced definition file could not be read.
    #[error("file not found: {path}: {source}")]
    DefinitionIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A referenced definition file could not be rewritten.
    #[error("invalid definition {path}: {message}")]
    Definition { path: PathBuf, message: String },

    #[error("invalid credential retrieval: {0}")]
    InvalidCredentialRetrieval(String),

    /// A remote failure outside the recoverable set (root bootstrap, folders).
    #[error("{operation} failed for {target}: {source}")]
    Remote {
        operation: &'static str,
        target: String,
        #[source]
        source: ClientError,
    },

    /// A close event, or a nested element, found nothing to act on.
    #[error("<{element}> at line {line} has no enclosing {expected} in progress")]
    StackUnderflow {
        element: String,
        expected: &'static str,
        line: u64,
    },

    /// The pending item on top of the stack is not the kind this element needs.
    #[error("<{element}> at line {line} expected a {expected} in progress, found a {found}")]
    UnexpectedPending {
        element: String,
        expected: &'static str,
        found: &'static str,
        line: u64,
    },
}

pub(crate) fn descriptor_io_err(path: &Path, source: std::io::Error) -> SyncError {
    SyncError::DescriptorIo {
        path: path.to_path_buf(),
        source,
    }
}

pub(crate) fn definition_io_err(path: &Path, source: std::io::Error) -> SyncError {
    SyncError::DefinitionIo {
        path: path.to_path_buf(),
        source,
    }
}
