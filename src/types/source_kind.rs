//! Kinds of membership sources and write destinations.
//!
//! This module centralizes the kind names so the configuration keys, log
//! fields and error messages all come from one place.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Where a list of members can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A flat file, one identifier per line
    #[strum(to_string = "text list")]
    TextList,
    /// Members of an Active Directory group
    #[strum(to_string = "AD group")]
    AdGroup,
    /// Members of a local UNIX group
    #[strum(to_string = "UNIX group")]
    UnixGroup,
    /// Every directory identity tagged with a department
    #[strum(to_string = "AD department")]
    Department,
    /// Entries of a Grid Engine user ACL
    #[strum(to_string = "SGE ACL")]
    SgeAcl,
    /// Users of a Gold accounting project
    #[strum(to_string = "Gold project")]
    GoldProject,
}

impl SourceKind {
    /// The configuration key listing sources of this kind.
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::TextList => "text_list_files",
            Self::AdGroup => "ad_groups",
            Self::UnixGroup => "unix_groups",
            Self::Department => "departments",
            Self::SgeAcl => "sge_acls",
            Self::GoldProject => "gold_projects",
        }
    }

    /// True for kinds that are resolved against the directory service.
    pub fn needs_directory(&self) -> bool {
        matches!(self, Self::AdGroup | Self::Department)
    }
}

/// Where a built list can be written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationKind {
    #[strum(to_string = "text list")]
    TextList,
    #[strum(to_string = "SGE ACL")]
    SgeAcl,
    #[strum(to_string = "Gold project")]
    GoldProject,
}

impl DestinationKind {
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::TextList => "text_list_files",
            Self::SgeAcl => "sge_acls",
            Self::GoldProject => "gold_projects",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_source_kind_display() {
        assert_eq!(SourceKind::TextList.to_string(), "text list");
        assert_eq!(SourceKind::AdGroup.to_string(), "AD group");
        assert_eq!(SourceKind::UnixGroup.to_string(), "UNIX group");
        assert_eq!(SourceKind::Department.to_string(), "AD department");
        assert_eq!(SourceKind::SgeAcl.to_string(), "SGE ACL");
        assert_eq!(SourceKind::GoldProject.to_string(), "Gold project");
    }

    #[test]
    fn test_config_keys_are_unique() {
        let keys: std::collections::HashSet<_> =
            SourceKind::iter().map(|k| k.config_key()).collect();
        assert_eq!(keys.len(), SourceKind::iter().count());
    }

    #[test]
    fn test_directory_kinds() {
        let directory: Vec<_> = SourceKind::iter().filter(|k| k.needs_directory()).collect();
        assert_eq!(directory, vec![SourceKind::AdGroup, SourceKind::Department]);
    }

    #[test]
    fn test_destination_kind_display() {
        assert_eq!(DestinationKind::TextList.to_string(), "text list");
        assert_eq!(DestinationKind::SgeAcl.config_key(), "sge_acls");
        assert_eq!(DestinationKind::GoldProject.to_string(), "Gold project");
    }
}
