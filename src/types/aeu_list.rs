//! Configured user lists and their expanded form.

use serde::{Deserialize, Serialize};

use super::list_spec::{DestinationSpec, ListSpec};
use crate::stringset::StringSet;

/// An all-encompassing user list as declared in configuration.
///
/// Members are `include`, minus `exclude`, intersected with `filter` when
/// one is given. A list without `include` always expands to nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AeuList {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub include: Option<ListSpec>,
    #[serde(default)]
    pub exclude: Option<ListSpec>,
    #[serde(default)]
    pub filter: Option<ListSpec>,
    #[serde(default)]
    pub destinations: Option<DestinationSpec>,
}

impl AeuList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_include(mut self, spec: ListSpec) -> Self {
        self.include = Some(spec);
        self
    }

    pub fn with_exclude(mut self, spec: ListSpec) -> Self {
        self.exclude = Some(spec);
        self
    }

    pub fn with_filter(mut self, spec: ListSpec) -> Self {
        self.filter = Some(spec);
        self
    }

    pub fn with_destinations(mut self, spec: DestinationSpec) -> Self {
        self.destinations = Some(spec);
        self
    }

    /// All specifications this list reads from.
    pub fn specs(&self) -> impl Iterator<Item = &ListSpec> {
        [&self.include, &self.exclude, &self.filter]
            .into_iter()
            .flatten()
    }
}

/// The result of expanding one [`AeuList`]. Lives for a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpandedList {
    pub name: String,
    pub description: String,
    pub members: StringSet,
    #[serde(skip)]
    pub destinations: Option<DestinationSpec>,
}

impl ExpandedList {
    pub fn new(list: &AeuList, members: StringSet) -> Self {
        Self {
            name: list.name.clone(),
            description: list.description.clone(),
            members,
            destinations: list.destinations.clone(),
        }
    }

    /// Members in lexical order.
    pub fn built_list(&self) -> Vec<String> {
        self.members.sorted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceKind;

    #[test]
    fn test_aeu_list_from_toml() {
        let list: AeuList = toml::from_str(
            r#"
            name = "all"
            description = "Everyone"
            [include]
            users = ["alice", "bob"]
            [exclude]
            users = ["bob"]
            [destinations]
            sge_acls = ["Open"]
            "#,
        )
        .unwrap();

        assert_eq!(list.name, "all");
        assert_eq!(list.description, "Everyone");
        assert!(list.include.is_some());
        assert!(list.exclude.is_some());
        assert!(list.filter.is_none());
        assert_eq!(list.destinations.unwrap().destinations.len(), 1);
    }

    #[test]
    fn test_aeu_list_minimal() {
        let list: AeuList = toml::from_str(r#"name = "empty""#).unwrap();
        assert_eq!(list, AeuList::new("empty"));
        assert_eq!(list.specs().count(), 0);
    }

    #[test]
    fn test_specs_iterates_all_present() {
        let list = AeuList::new("x")
            .with_include(ListSpec::new().with_source(SourceKind::AdGroup, "g"))
            .with_filter(ListSpec::new().with_source(SourceKind::Department, "d"));
        assert_eq!(list.specs().count(), 2);
    }

    #[test]
    fn test_expanded_list_serialization() {
        let list = AeuList::new("staff").with_description("All staff");
        let expanded = ExpandedList::new(&list, StringSet::from_slice(["carol", "alice"]));
        insta::assert_json_snapshot!(expanded, @r#"
        {
          "name": "staff",
          "description": "All staff",
          "members": [
            "alice",
            "carol"
          ]
        }
        "#);
        assert_eq!(expanded.built_list(), vec!["alice", "carol"]);
    }
}
