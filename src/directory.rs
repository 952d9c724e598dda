//! Active Directory lookups.
//!
//! The directory is consumed through the [`Directory`] trait. The shipped
//! implementation drives the OpenLDAP `ldapsearch` client and reads its LDIF
//! output; bind credentials and TLS settings come from [`LdapOpts`].

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::command::{CommandRunner, Invocation};
use crate::error::AclError;

/// Connection settings for the directory service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LdapOpts {
    pub server_url: String,
    #[serde(default)]
    pub bind_username: String,
    #[serde(default)]
    pub bind_password: String,
    /// Read the bind password from this file instead of `bind_password`.
    #[serde(default)]
    pub bind_password_file: Option<String>,
    pub base_dn: String,
    /// Skip server certificate verification.
    #[serde(default)]
    pub allow_insecure: bool,
    /// PEM bundle of CA certificates to trust.
    #[serde(default)]
    pub cert_file: Option<String>,
}

pub trait Directory: Send + Sync {
    /// Bare account names of the members of a group.
    fn group_members(&self, group: &str) -> Result<Vec<String>, AclError>;

    /// Bare account names of every identity whose `department` is `department`.
    fn department_members(&self, department: &str) -> Result<Vec<String>, AclError>;
}

// Capture the leading CN of a distinguished name, e.g. `CN=alice,OU=Users,DC=ad,DC=example,DC=com`.
static CN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[Cc][Nn]=([A-Za-z0-9._-]+)(?:,[A-Za-z]+=[^,]*)*$").expect("static pattern")
});

static ACCOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("static pattern"));

/// Reduce a distinguished name to its bare common name.
pub fn de_cn(dn: &str) -> Result<String, AclError> {
    CN_RE
        .captures(dn.trim())
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            AclError::Directory(format!(
                "attempted to deCN something that didn't seem to be a CN: '{dn}'"
            ))
        })
}

/// Escape a value for use inside an LDAP filter (RFC 4515). Configured names
/// are matched literally; `*` is escaped too, so no lookup is a wildcard.
pub fn escape_filter_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str(r"\5c"),
            '(' => out.push_str(r"\28"),
            ')' => out.push_str(r"\29"),
            '*' => out.push_str(r"\2a"),
            '\0' => out.push_str(r"\00"),
            _ => out.push(c),
        }
    }
    out
}

/// One entry of LDIF output: its DN and attribute/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LdifEntry {
    pub dn: String,
    pub attributes: Vec<(String, String)>,
}

impl LdifEntry {
    /// All values of an attribute, compared case-insensitively.
    pub fn values<'a>(&'a self, attribute: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.attributes
            .iter()
            .filter(move |(name, _)| name.eq_ignore_ascii_case(attribute))
            .map(|(_, value)| value.as_str())
    }
}

/// Parse `ldapsearch -LLL` output, unfolding continuation lines and decoding
/// base64 (`attr:: ...`) values. Comments and search references are skipped.
pub fn parse_ldif(text: &str) -> Result<Vec<LdifEntry>, AclError> {
    let mut logical: Vec<String> = Vec::new();
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix(' ') {
            if let Some(last) = logical.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        logical.push(line.to_string());
    }

    let mut entries = Vec::new();
    let mut current: Option<LdifEntry> = None;
    for line in logical {
        if line.is_empty() {
            entries.extend(current.take());
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        let Some((name, rest)) = line.split_once(':') else {
            return Err(AclError::Directory(format!("malformed LDIF line: '{line}'")));
        };
        let value = if let Some(encoded) = rest.strip_prefix(':') {
            let bytes = BASE64.decode(encoded.trim()).map_err(|e| {
                AclError::Directory(format!("invalid base64 value for attribute {name}: {e}"))
            })?;
            String::from_utf8_lossy(&bytes).into_owned()
        } else {
            rest.trim_start().to_string()
        };

        if name.eq_ignore_ascii_case("dn") {
            entries.extend(current.take());
            current = Some(LdifEntry {
                dn: value,
                attributes: Vec::new(),
            });
        } else if let Some(entry) = current.as_mut() {
            entry.attributes.push((name.to_string(), value));
        }
        // Attribute lines outside an entry (e.g. `ref:`) carry nothing we need.
    }
    entries.extend(current.take());
    Ok(entries)
}

/// [`Directory`] backed by the `ldapsearch` command line client.
pub struct LdapSearchDirectory {
    opts: LdapOpts,
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl LdapSearchDirectory {
    pub fn new(opts: LdapOpts, program: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            opts,
            program: program.into(),
            runner,
        }
    }

    fn search_invocation(&self, filter: &str, attributes: &[&str]) -> Invocation {
        let mut inv = Invocation::new(&self.program)
            .args(["-LLL", "-x", "-o", "ldif-wrap=no", "-E", "pr=1000/noprompt"])
            .args(["-H", self.opts.server_url.as_str()])
            .args(["-b", self.opts.base_dn.as_str()]);

        if !self.opts.bind_username.is_empty() {
            inv = inv.args(["-D", self.opts.bind_username.as_str()]);
            inv = match &self.opts.bind_password_file {
                Some(path) => inv.args(["-y", path.as_str()]),
                None => inv.arg("-w").secret_arg(&self.opts.bind_password),
            };
        }

        if let Some(cert_file) = &self.opts.cert_file {
            inv = inv.env("LDAPTLS_CACERT", cert_file);
        }
        if self.opts.allow_insecure {
            inv = inv.env("LDAPTLS_REQCERT", "never");
        }

        inv.arg(filter).args(attributes.iter().copied())
    }

    /// Run a subtree search below the base DN and return every entry.
    pub fn search(&self, filter: &str, attributes: &[&str]) -> Result<Vec<LdifEntry>, AclError> {
        let inv = self.search_invocation(filter, attributes);
        let output = self.runner.run(&inv)?;
        let entries = parse_ldif(&output.stdout)?;
        debug!(
            event = "Directory",
            phase = "Search",
            filter = filter,
            entries = entries.len()
        );
        Ok(entries)
    }
}

impl Directory for LdapSearchDirectory {
    fn group_members(&self, group: &str) -> Result<Vec<String>, AclError> {
        let filter = format!("(&(objectCategory=Group)(cn={}))", escape_filter_value(group));
        let entries = self.search(&filter, &["member"])?;
        if entries.is_empty() {
            return Err(AclError::Directory(format!("no such group: {group}")));
        }

        entries
            .iter()
            .flat_map(|entry| entry.values("member"))
            .map(de_cn)
            .collect()
    }

    fn department_members(&self, department: &str) -> Result<Vec<String>, AclError> {
        let filter = format!("(department={})", escape_filter_value(department));
        let entries = self.search(&filter, &["cn"])?;
        if entries.is_empty() {
            warn!(
                event = "Directory",
                phase = "Department",
                department = department,
                "department has no members"
            );
        }

        entries
            .iter()
            .flat_map(|entry| entry.values("cn"))
            .map(|cn| {
                if ACCOUNT_RE.is_match(cn) {
                    Ok(cn.to_string())
                } else {
                    de_cn(cn)
                }
            })
            .collect()
    }
}
