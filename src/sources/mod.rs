//! Membership sources: anything that maps a source name to a list of account names.
//!
//! Each [`SourceKind`] is served by one [`MemberSource`] registered in a
//! [`SourceRegistry`]. The registry is what the expansion engine talks to; it
//! attaches the kind and name to every failure so errors read as
//! `error while expanding AD group 'physics': ...`.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::AclError;
use crate::types::{SourceKind, SourceRef};

mod directory;
mod gold;
mod sge;
mod text_list;
mod unix_group;

pub use directory::{AdGroupSource, DepartmentSource};
pub use gold::GoldProjectClient;
pub use sge::SgeAclClient;
pub use text_list::TextListFile;
pub use unix_group::{DEFAULT_GROUP_FILE, UnixGroupSource};

/// A provider of `name -> members`.
pub trait MemberSource: Send + Sync {
    fn fetch_members(&self, name: &str) -> Result<Vec<String>, AclError>;
}

impl<F> MemberSource for F
where
    F: Fn(&str) -> Result<Vec<String>, AclError> + Send + Sync,
{
    fn fetch_members(&self, name: &str) -> Result<Vec<String>, AclError> {
        self(name)
    }
}

/// Dispatches source references to the adapter registered for their kind.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<SourceKind, Arc<dyn MemberSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the adapter for `kind`.
    pub fn with_source(mut self, kind: SourceKind, source: Arc<dyn MemberSource>) -> Self {
        self.sources.insert(kind, source);
        self
    }

    pub fn supports(&self, kind: SourceKind) -> bool {
        self.sources.contains_key(&kind)
    }

    /// Fetch the members of one source. Failures come back wrapped with the
    /// source's kind and name.
    pub fn fetch(&self, source: &SourceRef) -> Result<Vec<String>, AclError> {
        let Some(adapter) = self.sources.get(&source.kind) else {
            return Err(AclError::Config(format!("no adapter configured for {}", source.kind))
                .in_source(source.kind, &source.name));
        };

        let members = adapter
            .fetch_members(&source.name)
            .map_err(|e| e.in_source(source.kind, &source.name))?;

        debug!(
            event = "Source",
            phase = "Fetch",
            kind = %source.kind,
            name = %source.name,
            members = members.len()
        );
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn registry() -> SourceRegistry {
        SourceRegistry::new().with_source(
            SourceKind::AdGroup,
            Arc::new(|name: &str| match name {
                "staff" => Ok(vec!["alice".to_string(), "bob".to_string()]),
                other => Err(AclError::Directory(format!("no such group: {other}"))),
            }),
        )
    }

    #[test]
    fn test_fetch_dispatches_by_kind() {
        let members = registry()
            .fetch(&SourceRef::new(SourceKind::AdGroup, "staff"))
            .unwrap();
        assert_eq!(members, vec!["alice", "bob"]);
    }

    #[test]
    fn test_fetch_wraps_errors_with_context() {
        let err = registry()
            .fetch(&SourceRef::new(SourceKind::AdGroup, "ghosts"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceFetch);
        assert_eq!(
            err.to_string(),
            "error while expanding AD group 'ghosts': directory lookup failed: no such group: ghosts"
        );
    }

    #[test]
    fn test_fetch_unregistered_kind() {
        let registry = registry();
        assert!(!registry.supports(SourceKind::GoldProject));
        let err = registry
            .fetch(&SourceRef::new(SourceKind::GoldProject, "p1"))
            .unwrap_err();
        assert!(err.to_string().contains("no adapter configured for Gold project"));
    }
}
