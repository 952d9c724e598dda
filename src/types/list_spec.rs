//! Source and destination specifications.
//!
//! On disk a specification is a table of per-kind name arrays
//! (`ad_groups = [...]`, `sge_acls = [...]`, ...). In memory it is a flat
//! list of `{kind, name}` references so every kind is handled uniformly.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use super::source_kind::{DestinationKind, SourceKind};

/// One named membership source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub kind: SourceKind,
    pub name: String,
}

impl SourceRef {
    pub fn new(kind: SourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl Display for SourceRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

/// One named write destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DestinationRef {
    pub kind: DestinationKind,
    pub name: String,
}

impl DestinationRef {
    pub fn new(kind: DestinationKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl Display for DestinationRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

/// The union of plain user names and every listed source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawListSpec", into = "RawListSpec")]
pub struct ListSpec {
    pub users: Vec<String>,
    pub sources: Vec<SourceRef>,
}

impl ListSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.users.extend(users.into_iter().map(Into::into));
        self
    }

    pub fn with_source(mut self, kind: SourceKind, name: impl Into<String>) -> Self {
        self.sources.push(SourceRef::new(kind, name));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.sources.is_empty()
    }

    /// Source references of one kind, in configuration order.
    pub fn of_kind(&self, kind: SourceKind) -> impl Iterator<Item = &SourceRef> {
        self.sources.iter().filter(move |s| s.kind == kind)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawListSpec {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    users: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    text_list_files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ad_groups: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unix_groups: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    departments: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sge_acls: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    gold_projects: Vec<String>,
}

impl RawListSpec {
    fn names_mut(&mut self, kind: SourceKind) -> &mut Vec<String> {
        match kind {
            SourceKind::TextList => &mut self.text_list_files,
            SourceKind::AdGroup => &mut self.ad_groups,
            SourceKind::UnixGroup => &mut self.unix_groups,
            SourceKind::Department => &mut self.departments,
            SourceKind::SgeAcl => &mut self.sge_acls,
            SourceKind::GoldProject => &mut self.gold_projects,
        }
    }
}

impl From<RawListSpec> for ListSpec {
    fn from(mut raw: RawListSpec) -> Self {
        let mut sources = Vec::new();
        for kind in SourceKind::iter() {
            sources.extend(
                std::mem::take(raw.names_mut(kind))
                    .into_iter()
                    .map(|name| SourceRef::new(kind, name)),
            );
        }
        ListSpec {
            users: raw.users,
            sources,
        }
    }
}

impl From<ListSpec> for RawListSpec {
    fn from(spec: ListSpec) -> Self {
        let mut raw = RawListSpec {
            users: spec.users,
            ..Default::default()
        };
        for source in spec.sources {
            raw.names_mut(source.kind).push(source.name);
        }
        raw
    }
}

/// Places a built list is written to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDestinationSpec", into = "RawDestinationSpec")]
pub struct DestinationSpec {
    pub destinations: Vec<DestinationRef>,
}

impl DestinationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_destination(mut self, kind: DestinationKind, name: impl Into<String>) -> Self {
        self.destinations.push(DestinationRef::new(kind, name));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawDestinationSpec {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    text_list_files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sge_acls: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    gold_projects: Vec<String>,
}

impl RawDestinationSpec {
    fn names_mut(&mut self, kind: DestinationKind) -> &mut Vec<String> {
        match kind {
            DestinationKind::TextList => &mut self.text_list_files,
            DestinationKind::SgeAcl => &mut self.sge_acls,
            DestinationKind::GoldProject => &mut self.gold_projects,
        }
    }
}

impl From<RawDestinationSpec> for DestinationSpec {
    fn from(mut raw: RawDestinationSpec) -> Self {
        let mut destinations = Vec::new();
        for kind in DestinationKind::iter() {
            destinations.extend(
                std::mem::take(raw.names_mut(kind))
                    .into_iter()
                    .map(|name| DestinationRef::new(kind, name)),
            );
        }
        DestinationSpec { destinations }
    }
}

impl From<DestinationSpec> for RawDestinationSpec {
    fn from(spec: DestinationSpec) -> Self {
        let mut raw = RawDestinationSpec::default();
        for destination in spec.destinations {
            raw.names_mut(destination.kind).push(destination.name);
        }
        raw
    }
}
