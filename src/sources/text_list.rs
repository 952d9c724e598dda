use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::MemberSource;
use crate::error::AclError;

/// A plain text file with one account name per line.
///
/// Reading trims surrounding whitespace and drops blank lines. Writing replaces
/// the whole file (via a sibling temporary file and a rename) and leaves it
/// readable by the owner only. An empty list leaves a zero-byte file.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextListFile;

impl TextListFile {
    pub fn read_members(path: impl AsRef<Path>) -> Result<Vec<String>, AclError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| AclError::io(path, e))?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn write_members<S: AsRef<str>>(path: impl AsRef<Path>, members: &[S]) -> Result<(), AclError> {
        let path = path.as_ref();
        let mut contents = String::new();
        for member in members {
            contents.push_str(member.as_ref());
            contents.push('\n');
        }

        let tmp = temp_path(path);
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp).map_err(|e| AclError::io(&tmp, e))?;
        file.write_all(contents.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| AclError::io(&tmp, e))?;
        drop(file);

        #[cfg(unix)]
        {
            // `mode` only applies on creation; a stale temp file keeps its old bits.
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))
                .map_err(|e| AclError::io(&tmp, e))?;
        }

        fs::rename(&tmp, path).map_err(|e| AclError::io(path, e))?;
        debug!(
            event = "TextList",
            phase = "Write",
            path = %path.display(),
            members = members.len()
        );
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".update-acls.tmp");
    path.with_file_name(name)
}

impl MemberSource for TextListFile {
    fn fetch_members(&self, name: &str) -> Result<Vec<String>, AclError> {
        Self::read_members(name)
    }
}
