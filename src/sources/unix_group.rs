use std::fs;
use std::path::PathBuf;

use super::MemberSource;
use crate::error::AclError;

pub const DEFAULT_GROUP_FILE: &str = "/etc/group";

/// Supplementary members of a local group, read from a `group(5)` file.
///
/// Only the member field is consulted; accounts whose primary group is the
/// named group are not included.
#[derive(Debug, Clone)]
pub struct UnixGroupSource {
    group_file: PathBuf,
}

impl Default for UnixGroupSource {
    fn default() -> Self {
        Self::new(DEFAULT_GROUP_FILE)
    }
}

impl UnixGroupSource {
    pub fn new(group_file: impl Into<PathBuf>) -> Self {
        Self {
            group_file: group_file.into(),
        }
    }
}

impl MemberSource for UnixGroupSource {
    fn fetch_members(&self, name: &str) -> Result<Vec<String>, AclError> {
        let data = fs::read_to_string(&self.group_file)
            .map_err(|e| AclError::io(&self.group_file, e))?;

        for line in data.lines() {
            let mut fields = line.splitn(4, ':');
            if fields.next() != Some(name) {
                continue;
            }
            let (Some(_password), Some(_gid), Some(members)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(AclError::Config(format!(
                    "malformed entry for group '{name}' in {}",
                    self.group_file.display()
                )));
            };
            return Ok(members
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect());
        }

        Err(AclError::NotFound(format!(
            "group '{name}' in {}",
            self.group_file.display()
        )))
    }
}
