//! Turning configured lists into concrete member sets.
//!
//! Expansion never stops at the first failure: every source of every list is
//! attempted, and the failures are handed back next to whatever could be
//! built. The caller decides whether a partial result is good enough to act on.

use tracing::{debug, info, warn};

use crate::error::AclError;
use crate::sources::SourceRegistry;
use crate::stringset::StringSet;
use crate::types::{AeuList, ExpandedList, ListSpec};

/// Resolves list specifications against a [`SourceRegistry`].
#[derive(Clone)]
pub struct Expander {
    registry: SourceRegistry,
}

impl Expander {
    pub fn new(registry: SourceRegistry) -> Self {
        Self { registry }
    }

    /// The union of the literal users and the members of every source.
    ///
    /// A failing source contributes nothing; its error is returned alongside
    /// the union of the sources that did succeed.
    pub fn expand_list_spec(&self, spec: &ListSpec) -> (StringSet, Vec<AclError>) {
        let mut members = StringSet::from_slice(spec.users.iter().map(String::as_str));
        let mut errors = Vec::new();

        for source in &spec.sources {
            match self.registry.fetch(source) {
                Ok(found) => members.add_slice(found),
                Err(e) => {
                    warn!(event = "Expand", phase = "Source", source = %source, error = %e);
                    errors.push(e);
                }
            }
        }

        (members, errors)
    }

    /// `include - exclude`, intersected with `filter` when the list has one.
    /// A list without `include` is empty and none of its other sources are
    /// read. Errors are tagged with the list name.
    pub fn expand_list(&self, list: &AeuList) -> (ExpandedList, Vec<AclError>) {
        let Some(include) = &list.include else {
            debug!(event = "Expand", phase = "List", list = %list.name, "list has no include");
            return (ExpandedList::new(list, StringSet::new()), Vec::new());
        };

        let mut errors = Vec::new();
        let mut expand = |spec: &ListSpec| {
            let (members, spec_errors) = self.expand_list_spec(spec);
            errors.extend(spec_errors.into_iter().map(|e| e.in_list(&list.name)));
            members
        };

        let mut members = expand(include);
        if let Some(exclude) = &list.exclude {
            members.difference_update(&expand(exclude));
        }
        if let Some(filter) = &list.filter {
            members.intersection_update(&expand(filter));
        }

        info!(
            event = "Expand",
            phase = "List",
            list = %list.name,
            members = members.len(),
            errors = errors.len()
        );
        (ExpandedList::new(list, members), errors)
    }

    /// Expand every list in order. Every list is returned, including ones
    /// whose expansion failed in part.
    pub fn expand_all(&self, lists: &[AeuList]) -> (Vec<ExpandedList>, Vec<AclError>) {
        let mut expanded = Vec::with_capacity(lists.len());
        let mut errors = Vec::new();
        for list in lists {
            let (built, list_errors) = self.expand_list(list);
            expanded.push(built);
            errors.extend(list_errors);
        }
        (expanded, errors)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::ErrorKind;
    use crate::types::SourceKind;

    fn registry() -> SourceRegistry {
        SourceRegistry::new()
            .with_source(
                SourceKind::AdGroup,
                Arc::new(|name: &str| match name {
                    "G1" => Ok(vec!["a".to_string(), "b".to_string()]),
                    "G3" => Ok(vec!["z".to_string()]),
                    _ => Err(AclError::Directory(format!("no such group: {name}"))),
                }),
            )
            .with_source(
                SourceKind::SgeAcl,
                Arc::new(|_: &str| Ok(vec!["a".to_string(), "c".to_string()])),
            )
            .with_source(
                SourceKind::Department,
                Arc::new(|_: &str| Ok(vec!["a".to_string(), "z".to_string()])),
            )
    }

    fn expander() -> Expander {
        Expander::new(registry())
    }

    fn sorted(set: &StringSet) -> Vec<String> {
        set.sorted()
    }

    #[test]
    fn test_include_minus_exclude() {
        let list = AeuList::new("L")
            .with_include(
                ListSpec::new()
                    .with_users(["x"])
                    .with_source(SourceKind::AdGroup, "G1"),
            )
            .with_exclude(ListSpec::new().with_source(SourceKind::SgeAcl, "S1"));

        let (built, errors) = expander().expand_list(&list);
        assert!(errors.is_empty());
        assert_eq!(sorted(&built.members), vec!["b", "x"]);
    }

    #[test]
    fn test_partial_failure_keeps_successful_sources() {
        let spec = ListSpec::new()
            .with_source(SourceKind::AdGroup, "G1")
            .with_source(SourceKind::AdGroup, "G2");

        let (members, errors) = expander().expand_list_spec(&spec);
        assert_eq!(sorted(&members), vec!["a", "b"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::SourceFetch);
        assert!(errors[0].to_string().contains("AD group 'G2'"));
    }

    #[test]
    fn test_list_errors_are_tagged_with_list_name() {
        let list = AeuList::new("L").with_include(
            ListSpec::new()
                .with_source(SourceKind::AdGroup, "G1")
                .with_source(SourceKind::GoldProject, "p"),
        );
        let (built, errors) = expander().expand_list(&list);
        assert_eq!(sorted(&built.members), vec!["a", "b"]);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().starts_with("list 'L': error while expanding Gold project 'p'"));
    }

    #[test]
    fn test_filter_applies_after_exclude() {
        let list = AeuList::new("L")
            .with_include(
                ListSpec::new()
                    .with_users(["z"])
                    .with_source(SourceKind::AdGroup, "G1"),
            )
            .with_exclude(ListSpec::new().with_users(["b"]))
            .with_filter(ListSpec::new().with_source(SourceKind::Department, "Physics"));

        let (built, _) = expander().expand_list(&list);
        assert_eq!(sorted(&built.members), vec!["a", "z"]);
    }

    #[test]
    fn test_no_include_expands_to_empty() {
        let list = AeuList::new("L")
            .with_exclude(ListSpec::new().with_source(SourceKind::AdGroup, "missing"));
        let (built, errors) = expander().expand_list(&list);
        assert!(errors.is_empty());
        assert!(built.members.is_empty());
        assert_eq!(built.name, "L");
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let list = AeuList::new("L")
            .with_include(ListSpec::new().with_source(SourceKind::AdGroup, "G1"))
            .with_exclude(ListSpec::new().with_users(["a"]));
        let expander = expander();
        let (first, _) = expander.expand_list(&list);
        let (second, _) = expander.expand_list(&list);
        assert_eq!(first, second);
    }

    #[test]
    fn test_expand_all_returns_every_list() {
        let lists = vec![
            AeuList::new("one").with_include(ListSpec::new().with_source(SourceKind::AdGroup, "G3")),
            AeuList::new("two").with_include(ListSpec::new().with_source(SourceKind::AdGroup, "missing")),
            AeuList::new("three"),
        ];
        let (built, errors) = expander().expand_all(&lists);
        let names: Vec<&str> = built.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(sorted(&built[0].members), vec!["z"]);
    }
}
