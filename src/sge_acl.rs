//! Parser for Grid Engine user-set records as printed by `qconf -su <name>`.
//!
//! Only the single-line layout (`SGE_SINGLE_LINE=1`) is accepted:
//!
//! ```text
//! name    Open
//! type    ACL
//! fshare  0
//! oticket 0
//! entries alice,bob,carol
//! ```
//!
//! followed by a trailing newline. Fields may appear in any order but each
//! exactly once. `entries NONE` means the set is empty.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::AclError;

/// Lines in a single-line record: five fields plus the empty line after the final newline.
const EXPECTED_LINES: usize = 6;

/// The token SGE prints for an empty entry list.
const NO_ENTRIES: &str = "NONE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
pub enum AclType {
    #[strum(serialize = "ACL")]
    Acl,
    #[strum(serialize = "DEPT")]
    Dept,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
enum AclField {
    Name,
    Type,
    Fshare,
    Oticket,
    Entries,
}

// Object names per sge_types(5): printable ASCII except SPACE / : ´ \ [ ] { } | ( ) @ % , and ".
static FIELD_PATTERNS: Lazy<Vec<(AclField, Regex)>> = Lazy::new(|| {
    let table = [
        (AclField::Name, r"^name\s+([A-Za-z0-9._+<>?^=-]+)\s*$"),
        (AclField::Type, r"^type\s+(ACL|DEPT|ACL,DEPT|DEPT,ACL)\s*$"),
        (AclField::Fshare, r"^fshare\s+([0-9]+)\s*$"),
        (AclField::Oticket, r"^oticket\s+([0-9]+)\s*$"),
        (
            AclField::Entries,
            r"^entries\s+((?:@?[A-Za-z0-9._-]+,)*@?[A-Za-z0-9._-]+)\s*$",
        ),
    ];
    table
        .into_iter()
        .map(|(field, pattern)| (field, Regex::new(pattern).expect("static pattern")))
        .collect()
});

/// A parsed user set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SgeAcl {
    pub name: String,
    pub acl_types: Vec<AclType>,
    pub override_tickets: u64,
    pub functional_share: u64,
    /// Empty when SGE reports `NONE`.
    pub entries: Vec<String>,
}

#[derive(Default)]
struct PartialAcl {
    name: Option<String>,
    acl_types: Option<Vec<AclType>>,
    functional_share: Option<u64>,
    override_tickets: Option<u64>,
    entries: Option<Vec<String>>,
}

impl PartialAcl {
    fn has(&self, field: AclField) -> bool {
        match field {
            AclField::Name => self.name.is_some(),
            AclField::Type => self.acl_types.is_some(),
            AclField::Fshare => self.functional_share.is_some(),
            AclField::Oticket => self.override_tickets.is_some(),
            AclField::Entries => self.entries.is_some(),
        }
    }

    fn set(&mut self, field: AclField, value: &str) -> Result<(), AclError> {
        if self.has(field) {
            return Err(AclError::AclParse(format!("found duplicate field ({field})")));
        }
        match field {
            AclField::Name => self.name = Some(value.to_string()),
            AclField::Type => {
                let types = value
                    .split(',')
                    .map(|t| {
                        AclType::from_str(t).map_err(|_| {
                            AclError::AclParse(format!("invalid value for field ({field}): {t}"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                self.acl_types = Some(types);
            }
            AclField::Fshare => self.functional_share = Some(parse_count(field, value)?),
            AclField::Oticket => self.override_tickets = Some(parse_count(field, value)?),
            AclField::Entries => {
                let entries = if value == NO_ENTRIES {
                    Vec::new()
                } else {
                    value.split(',').map(str::to_string).collect()
                };
                self.entries = Some(entries);
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<SgeAcl, AclError> {
        let missing: Vec<String> = AclField::iter()
            .filter(|f| !self.has(*f))
            .map(|f| f.to_string())
            .collect();
        match self {
            PartialAcl {
                name: Some(name),
                acl_types: Some(acl_types),
                functional_share: Some(functional_share),
                override_tickets: Some(override_tickets),
                entries: Some(entries),
            } => Ok(SgeAcl {
                name,
                acl_types,
                override_tickets,
                functional_share,
                entries,
            }),
            _ => Err(AclError::AclParse(format!(
                "missing required field(s): {}",
                missing.join(", ")
            ))),
        }
    }
}

fn parse_count(field: AclField, value: &str) -> Result<u64, AclError> {
    value
        .parse()
        .map_err(|_| AclError::AclParse(format!("invalid value for field ({field}): {value}")))
}

/// True if the text uses the wrapped `entries` layout (`a,b, \` plus indented
/// continuation lines) that SGE prints without `SGE_SINGLE_LINE`.
fn is_multi_line(lines: &[&str]) -> bool {
    lines.iter().any(|line| {
        line.trim_end().ends_with('\\')
            || (line.starts_with(char::is_whitespace) && !line.trim().is_empty())
    })
}

/// Parse the output of `qconf -su <name>`.
pub fn parse_acl(text: &str) -> Result<SgeAcl, AclError> {
    let lines: Vec<&str> = text.split('\n').collect();

    if is_multi_line(&lines) {
        return Err(AclError::AclParse(
            "multi-line entries format is not supported (query with SGE_SINGLE_LINE=1)"
                .to_string(),
        ));
    }

    if lines.len() != EXPECTED_LINES {
        return Err(AclError::AclParse(format!(
            "wrong number of lines (expected {EXPECTED_LINES}, got {})",
            lines.len()
        )));
    }

    let mut acl = PartialAcl::default();
    for (idx, line) in lines.iter().enumerate() {
        let matched = FIELD_PATTERNS
            .iter()
            .find_map(|(field, re)| re.captures(line).map(|caps| (*field, caps)));
        match matched {
            Some((field, caps)) => acl.set(field, &caps[1])?,
            None if line.trim().is_empty() => {}
            None => {
                return Err(AclError::AclParse(format!(
                    "unmatchable data on line {}: '{line}'",
                    idx + 1
                )));
            }
        }
    }

    acl.finish()
}

impl FromStr for SgeAcl {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_acl(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_json_snapshot;
    use yare::parameterized;

    const GOOD_ACL: &str = "name   anacl \ntype    ACL\nfshare  0\noticket 0\nentries usera1,userb2,userc3\n";

    #[test]
    fn test_parse_good_acl() {
        let acl = parse_acl(GOOD_ACL).unwrap();
        assert_json_snapshot!(acl, @r#"
        {
          "name": "anacl",
          "acl_types": [
            "Acl"
          ],
          "override_tickets": 0,
          "functional_share": 0,
          "entries": [
            "usera1",
            "userb2",
            "userc3"
          ]
        }
        "#);
    }

    #[parameterized(
        canonical = { ["name Open", "type ACL", "fshare 0", "oticket 0", "entries a,b"] },
        reversed = { ["entries a,b", "oticket 0", "fshare 0", "type ACL", "name Open"] },
        shuffled = { ["fshare 0", "name Open", "entries a,b", "type ACL", "oticket 0"] },
    )]
    fn test_field_order_is_irrelevant(fields: [&str; 5]) {
        let text = format!("{}\n", fields.join("\n"));
        let acl = parse_acl(&text).unwrap();
        assert_eq!(acl.name, "Open");
        assert_eq!(acl.acl_types, vec![AclType::Acl]);
        assert_eq!(acl.entries, vec!["a", "b"]);
    }

    #[test]
    fn test_entries_none_is_empty() {
        let acl = parse_acl("name x\ntype ACL\nfshare 0\noticket 0\nentries NONE\n").unwrap();
        assert!(acl.entries.is_empty());
    }

    #[test]
    fn test_numbers_and_dual_type() {
        let acl =
            parse_acl("name dept1\ntype DEPT,ACL\nfshare 250\noticket 17\nentries bob\n").unwrap();
        assert_eq!(acl.acl_types, vec![AclType::Dept, AclType::Acl]);
        assert_eq!(acl.functional_share, 250);
        assert_eq!(acl.override_tickets, 17);
        assert_eq!(acl.entries, vec!["bob"]);
    }

    #[test]
    fn test_group_entries() {
        let acl = parse_acl("name x\ntype ACL\nfshare 0\noticket 0\nentries @staff,alice\n").unwrap();
        assert_eq!(acl.entries, vec!["@staff", "alice"]);
    }

    #[parameterized(
        empty = { "", "wrong number of lines" },
        missing_trailing_newline = { "name x\ntype ACL\nfshare 0\noticket 0\nentries a", "wrong number of lines" },
        duplicate_name = { "name  anacl\nname secondname\nfshare 0\noticket 0\nentries a,b\n", "duplicate field (name)" },
        duplicate_entries = { "name x\nentries a\nfshare 0\noticket 0\nentries b\n", "duplicate field (entries)" },
        missing_type = { "name x\nfshare 0\noticket 0\nentries a\n\n", "missing required field(s): type" },
        extra_line = { "name x\ntype ACL\nfshare 0\noticket 0\nentries a\nbogus\n", "wrong number of lines" },
        garbage_field = { "name x\ntype ACL\nfshare 0\nowner me\nentries a\n", "unmatchable data on line 4" },
        bad_type = { "name x\ntype USER\nfshare 0\noticket 0\nentries a\n", "unmatchable data on line 2" },
        negative_share = { "name x\ntype ACL\nfshare -1\noticket 0\nentries a\n", "unmatchable data on line 3" },
        huge_share = { "name x\ntype ACL\nfshare 99999999999999999999999\noticket 0\nentries a\n", "invalid value for field (fshare)" },
    )]
    fn test_parse_failures(text: &str, expected: &str) {
        let err = parse_acl(text).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Parse);
        assert!(
            err.to_string().contains(expected),
            "expected '{expected}' in '{err}'"
        );
    }

    #[test]
    fn test_each_duplicate_field_is_reported() {
        let fields = [
            ("name", "name x"),
            ("type", "type ACL"),
            ("fshare", "fshare 0"),
            ("oticket", "oticket 0"),
            ("entries", "entries a"),
        ];
        for (idx, (field, line)) in fields.iter().enumerate() {
            // Keep six lines by letting the repeat displace the next field.
            let mut lines: Vec<&str> = fields.iter().map(|(_, l)| *l).collect();
            lines[(idx + 1) % fields.len()] = *line;
            let text = format!("{}\n", lines.join("\n"));
            let err = parse_acl(&text).unwrap_err();
            assert!(
                err.to_string().contains(&format!("found duplicate field ({field})")),
                "{err}"
            );
        }
    }

    #[test]
    fn test_each_missing_field_is_reported() {
        let fields = ["name x", "type ACL", "fshare 0", "oticket 0", "entries a"];
        for skip in 0..fields.len() {
            let mut lines: Vec<&str> = fields
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, l)| *l)
                .collect();
            lines.push("");
            let text = format!("{}\n", lines.join("\n"));
            let err = parse_acl(&text).unwrap_err();
            assert!(err.to_string().contains("missing required field"), "{err}");
        }
    }

    #[test]
    fn test_multi_line_format_is_rejected() {
        let text = "name    big\ntype    ACL\nfshare  0\noticket 0\nentries alice,bob, \\\n        carol\n";
        let err = parse_acl(text).unwrap_err();
        assert!(err.to_string().contains("multi-line entries format"), "{err}");
    }

    #[test]
    fn test_from_str() {
        let acl: SgeAcl = GOOD_ACL.parse().unwrap();
        assert_eq!(acl.name, "anacl");
    }
}
