//! Writing built lists to their destinations.
//!
//! Text lists are simply overwritten. Stores with their own membership state
//! (SGE ACLs, Gold projects) are converged: missing members are added, extras
//! removed, and the result re-read and compared with the intended set. A
//! destination is only reported as written once that comparison holds.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::AclError;
use crate::sources::TextListFile;
use crate::stringset::StringSet;
use crate::types::{DestinationKind, ExpandedList};

/// External membership state that can be read and changed in batches.
pub trait MembershipStore: Send + Sync {
    /// Whether `name` exists yet. A store whose add call creates missing
    /// entries (as `qconf -au` does) should answer this; reads of a missing
    /// entry usually fail.
    fn exists(&self, _name: &str) -> Result<bool, AclError> {
        Ok(true)
    }

    fn current_members(&self, name: &str) -> Result<Vec<String>, AclError>;

    /// Add members. An empty batch must be a no-op.
    fn add_members(&self, name: &str, members: &[String]) -> Result<(), AclError>;

    /// Remove members. An empty batch must be a no-op.
    fn remove_members(&self, name: &str, members: &[String]) -> Result<(), AclError>;
}

/// What a successful converge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvergeReport {
    pub added: StringSet,
    pub removed: StringSet,
}

impl ConvergeReport {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Bring `store`'s membership of `name` in line with `intended`.
///
/// `label` names the destination in a consistency error, e.g. `SGE ACL Open`.
/// A destination that does not exist yet starts out empty and is created by
/// the first add; with nothing to add it is left alone.
pub fn converge(
    store: &dyn MembershipStore,
    label: &str,
    name: &str,
    intended: &StringSet,
) -> Result<ConvergeReport, AclError> {
    let before = if store.exists(name)? {
        StringSet::from_slice(store.current_members(name)?)
    } else if intended.is_empty() {
        debug!(event = "Converge", phase = "Skip", destination = %label, "absent and nothing to add");
        return Ok(ConvergeReport::default());
    } else {
        debug!(event = "Converge", phase = "Create", destination = %label);
        StringSet::new()
    };

    let missing = intended.difference(&before);
    store.add_members(name, &missing.sorted())?;

    let after_add = StringSet::from_slice(store.current_members(name)?);
    let extra = after_add.difference(intended);
    store.remove_members(name, &extra.sorted())?;

    let after_remove = StringSet::from_slice(store.current_members(name)?);
    if !after_remove.equals(intended) {
        return Err(AclError::Consistency {
            destination: label.to_string(),
            missing: intended.difference(&after_remove).to_string(),
            extra: after_remove.difference(intended).to_string(),
        });
    }

    Ok(ConvergeReport {
        added: missing,
        removed: extra,
    })
}

/// Something a built list can be written to.
pub trait DestinationWriter: Send + Sync {
    fn write_members(&self, name: &str, members: &StringSet) -> Result<(), AclError>;
}

impl DestinationWriter for TextListFile {
    fn write_members(&self, name: &str, members: &StringSet) -> Result<(), AclError> {
        TextListFile::write_members(name, &members.sorted())
    }
}

/// Adapts a [`MembershipStore`] into a [`DestinationWriter`] that converges.
#[derive(Clone)]
pub struct ConvergingWriter {
    kind: DestinationKind,
    store: Arc<dyn MembershipStore>,
}

impl ConvergingWriter {
    pub fn new(kind: DestinationKind, store: Arc<dyn MembershipStore>) -> Self {
        Self { kind, store }
    }
}

impl DestinationWriter for ConvergingWriter {
    fn write_members(&self, name: &str, members: &StringSet) -> Result<(), AclError> {
        let label = format!("{} {name}", self.kind);
        let report = converge(self.store.as_ref(), &label, name, members)?;
        info!(
            event = "Converge",
            phase = "Done",
            destination = %label,
            added = %report.added,
            removed = %report.removed
        );
        Ok(())
    }
}

/// Routes each destination of a built list to the writer for its kind.
#[derive(Clone, Default)]
pub struct Writer {
    writers: HashMap<DestinationKind, Arc<dyn DestinationWriter>>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_writer(mut self, kind: DestinationKind, writer: Arc<dyn DestinationWriter>) -> Self {
        self.writers.insert(kind, writer);
        self
    }

    /// Write one list to every destination it names. Every destination is
    /// attempted; failures are collected and returned tagged with the list name.
    pub fn write_list(&self, list: &ExpandedList) -> Vec<AclError> {
        let Some(spec) = &list.destinations else {
            debug!(event = "Write", phase = "Skip", list = %list.name, "list has no destinations");
            return Vec::new();
        };

        let mut errors = Vec::new();
        for destination in &spec.destinations {
            let result = match self.writers.get(&destination.kind) {
                Some(writer) => writer.write_members(&destination.name, &list.members),
                None => Err(AclError::Config(format!(
                    "no writer configured for {}",
                    destination.kind
                ))),
            };

            match result {
                Ok(()) => info!(
                    event = "Write",
                    phase = "Destination",
                    list = %list.name,
                    destination = %destination,
                    members = list.members.len()
                ),
                Err(e) => {
                    warn!(
                        event = "Write",
                        phase = "Destination",
                        list = %list.name,
                        destination = %destination,
                        error = %e
                    );
                    errors.push(
                        e.in_destination(destination.kind, &destination.name)
                            .in_list(&list.name),
                    );
                }
            }
        }
        errors
    }

    /// Write every list, collecting all failures.
    pub fn write_all(&self, lists: &[ExpandedList]) -> Vec<AclError> {
        lists.iter().flat_map(|list| self.write_list(list)).collect()
    }
}
