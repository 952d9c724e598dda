use std::path::PathBuf;

use strum_macros::{AsRefStr, Display};
use thiserror::Error;

use crate::types::{DestinationKind, SourceKind};

/// Broad classification of an [`AclError`], independent of the context it was wrapped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum ErrorKind {
    /// A named membership source could not be read.
    SourceFetch,
    /// Malformed ACL text or configuration.
    Parse,
    /// Post-convergence verification found a mismatch.
    Consistency,
    /// An element required by a strict operation was absent.
    NotFound,
    /// An external command could not be started or exited unsuccessfully.
    Command,
    /// Filesystem error.
    Io,
    /// Invalid configuration.
    Config,
    /// Directory service lookup failed.
    Directory,
}

#[derive(Debug, Error)]
pub enum AclError {
    #[error("error while expanding {kind} '{name}': {source}")]
    Source {
        kind: SourceKind,
        name: String,
        #[source]
        source: Box<AclError>,
    },

    #[error("error while writing {kind} '{name}': {source}")]
    Destination {
        kind: DestinationKind,
        name: String,
        #[source]
        source: Box<AclError>,
    },

    #[error("list '{list}': {source}")]
    List {
        list: String,
        #[source]
        source: Box<AclError>,
    },

    #[error("failed to parse SGE ACL: {0}")]
    AclParse(String),

    #[error("contents of {destination} after set do not match intended contents (missing: [{missing}], extra: [{extra}])")]
    Consistency {
        destination: String,
        missing: String,
        extra: String,
    },

    #[error("'{0}' is not in the set")]
    NotFound(String),

    #[error("command `{command}` failed: {message}")]
    Command {
        command: String,
        message: String,
        stderr: String,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),

    #[error("directory lookup failed: {0}")]
    Directory(String),
}

impl AclError {
    /// The taxonomy bucket this error belongs to.
    ///
    /// A failing source is always a `SourceFetch`; the other context wrappers
    /// report the kind of the error they wrap.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AclError::Source { .. } => ErrorKind::SourceFetch,
            AclError::Destination { source, .. } | AclError::List { source, .. } => source.kind(),
            AclError::AclParse(_) | AclError::ConfigParse(_) => ErrorKind::Parse,
            AclError::Consistency { .. } => ErrorKind::Consistency,
            AclError::NotFound(_) => ErrorKind::NotFound,
            AclError::Command { .. } => ErrorKind::Command,
            AclError::Io { .. } => ErrorKind::Io,
            AclError::Config(_) => ErrorKind::Config,
            AclError::Directory(_) => ErrorKind::Directory,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AclError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn in_source(self, kind: SourceKind, name: impl Into<String>) -> Self {
        AclError::Source {
            kind,
            name: name.into(),
            source: Box::new(self),
        }
    }

    pub(crate) fn in_destination(self, kind: DestinationKind, name: impl Into<String>) -> Self {
        AclError::Destination {
            kind,
            name: name.into(),
            source: Box::new(self),
        }
    }

    pub(crate) fn in_list(self, list: impl Into<String>) -> Self {
        AclError::List {
            list: list.into(),
            source: Box::new(self),
        }
    }
}

impl From<toml::de::Error> for AclError {
    fn from(err: toml::de::Error) -> Self {
        AclError::ConfigParse(err.to_string())
    }
}
