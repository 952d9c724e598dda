//! The configuration document and the adapters it wires up.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::CommandRunner;
use crate::converge::{ConvergingWriter, Writer};
use crate::directory::{Directory, LdapOpts, LdapSearchDirectory};
use crate::error::AclError;
use crate::sources::{
    AdGroupSource, DEFAULT_GROUP_FILE, DepartmentSource, GoldProjectClient, SgeAclClient,
    SourceRegistry, TextListFile, UnixGroupSource,
};
use crate::types::{AeuList, DestinationKind, SourceKind};

pub const DEFAULT_CONFIG_PATH: &str = "./update-acls.conf";

/// Paths of the external command line tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Commands {
    pub qconf: String,
    pub glsproject: String,
    pub gchproject: String,
    pub ldapsearch: String,
}

impl Default for Commands {
    fn default() -> Self {
        Self {
            qconf: "qconf".to_string(),
            glsproject: "glsproject".to_string(),
            gchproject: "gchproject".to_string(),
            ldapsearch: "ldapsearch".to_string(),
        }
    }
}

/// Parsed configuration.
///
/// ```rust
/// use update_acls::Config;
///
/// let config: Config = r#"
///     [[lists]]
///     name = "admins"
///     [lists.include]
///     users = ["alice", "bob"]
/// "#
/// .parse()
/// .unwrap();
/// assert_eq!(config.lists.len(), 1);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub group_file: Option<PathBuf>,
    #[serde(default)]
    pub directory: Option<LdapOpts>,
    #[serde(default)]
    pub commands: Commands,
    #[serde(default)]
    pub lists: Vec<AeuList>,
}

impl FromStr for Config {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

impl Config {
    /// Read and validate the configuration at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AclError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| AclError::io(path, e))?;
        let config: Config = text.parse()?;
        config.validate()?;
        debug!(
            event = "Config",
            phase = "Load",
            path = %path.display(),
            lists = config.lists.len()
        );
        Ok(config)
    }

    /// Structural checks that deserialization alone cannot express.
    pub fn validate(&self) -> Result<(), AclError> {
        if self.lists.is_empty() {
            return Err(AclError::Config("no lists defined".to_string()));
        }

        let mut seen = HashSet::new();
        for list in &self.lists {
            if list.name.trim().is_empty() {
                return Err(AclError::Config("list with an empty name".to_string()));
            }
            if !seen.insert(list.name.as_str()) {
                return Err(AclError::Config(format!("duplicate list name '{}'", list.name)));
            }

            for spec in list.specs() {
                for source in &spec.sources {
                    if source.name.trim().is_empty() {
                        return Err(AclError::Config(format!(
                            "list '{}': empty name in {}",
                            list.name,
                            source.kind.config_key()
                        )));
                    }
                    if source.kind.needs_directory() && self.directory.is_none() {
                        return Err(AclError::Config(format!(
                            "list '{}' uses {} but no [directory] is configured",
                            list.name,
                            source.kind.config_key()
                        )));
                    }
                }
            }

            if let Some(destinations) = &list.destinations {
                if let Some(empty) = destinations
                    .destinations
                    .iter()
                    .find(|d| d.name.trim().is_empty())
                {
                    return Err(AclError::Config(format!(
                        "list '{}': empty name in destination {}",
                        list.name,
                        empty.kind.config_key()
                    )));
                }
            }
        }
        Ok(())
    }

    fn sge(&self, runner: &Arc<dyn CommandRunner>) -> Arc<SgeAclClient> {
        Arc::new(SgeAclClient::new(&self.commands.qconf, runner.clone()))
    }

    fn gold(&self, runner: &Arc<dyn CommandRunner>) -> Arc<GoldProjectClient> {
        Arc::new(GoldProjectClient::new(
            &self.commands.glsproject,
            &self.commands.gchproject,
            runner.clone(),
        ))
    }

    /// Every source adapter this configuration can serve. Directory-backed
    /// kinds are only registered when `[directory]` is present.
    pub fn source_registry(&self, runner: Arc<dyn CommandRunner>) -> SourceRegistry {
        let group_file = self
            .group_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GROUP_FILE));

        let mut registry = SourceRegistry::new()
            .with_source(SourceKind::TextList, Arc::new(TextListFile))
            .with_source(SourceKind::UnixGroup, Arc::new(UnixGroupSource::new(group_file)))
            .with_source(SourceKind::SgeAcl, self.sge(&runner))
            .with_source(SourceKind::GoldProject, self.gold(&runner));

        if let Some(opts) = &self.directory {
            let directory: Arc<dyn Directory> = Arc::new(LdapSearchDirectory::new(
                opts.clone(),
                &self.commands.ldapsearch,
                runner,
            ));
            registry = registry
                .with_source(SourceKind::AdGroup, Arc::new(AdGroupSource(directory.clone())))
                .with_source(SourceKind::Department, Arc::new(DepartmentSource(directory)));
        }
        registry
    }

    /// Writers for every destination kind.
    pub fn writer(&self, runner: Arc<dyn CommandRunner>) -> Writer {
        Writer::new()
            .with_writer(DestinationKind::TextList, Arc::new(TextListFile))
            .with_writer(
                DestinationKind::SgeAcl,
                Arc::new(ConvergingWriter::new(DestinationKind::SgeAcl, self.sge(&runner))),
            )
            .with_writer(
                DestinationKind::GoldProject,
                Arc::new(ConvergingWriter::new(
                    DestinationKind::GoldProject,
                    self.gold(&runner),
                )),
            )
    }
}
