//! Data model for list configuration and expansion results.
//!
//! Canonical configuration forms:
//! - Source specification: `{ users = [..], ad_groups = [..], sge_acls = [..], ... }`
//! - Destination specification: `{ text_list_files = [..], sge_acls = [..], gold_projects = [..] }`
//!
//! Both are flattened into `{kind, name}` references after parsing.

mod aeu_list;
mod list_spec;
mod source_kind;

pub use aeu_list::{AeuList, ExpandedList};
pub use list_spec::{DestinationRef, DestinationSpec, ListSpec, SourceRef};
pub use source_kind::{DestinationKind, SourceKind};
