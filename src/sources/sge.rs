use std::sync::Arc;

use tracing::debug;

use super::MemberSource;
use crate::command::{CommandRunner, Invocation, output_lines};
use crate::converge::MembershipStore;
use crate::error::AclError;
use crate::sge_acl::{SgeAcl, parse_acl};

/// Grid Engine user sets, driven through `qconf`.
#[derive(Clone)]
pub struct SgeAclClient {
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl SgeAclClient {
    pub fn new(program: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    /// Names of all user sets (`qconf -sul`).
    pub fn list(&self) -> Result<Vec<String>, AclError> {
        let output = self
            .runner
            .run(&Invocation::new(&self.program).arg("-sul"))?;
        Ok(output_lines(&output.stdout))
    }

    pub fn exists(&self, acl: &str) -> Result<bool, AclError> {
        Ok(self.list()?.iter().any(|name| name == acl))
    }

    /// The full record for one user set (`qconf -su`), in single-line layout.
    pub fn show(&self, acl: &str) -> Result<SgeAcl, AclError> {
        let inv = Invocation::new(&self.program)
            .args(["-su", acl])
            .env("SGE_SINGLE_LINE", "1");
        let output = self.runner.run(&inv)?;
        parse_acl(&output.stdout)
    }

    fn modify(&self, flag: &str, acl: &str, members: &[String]) -> Result<(), AclError> {
        if members.is_empty() {
            return Ok(());
        }
        let joined = members.join(",");
        let inv = Invocation::new(&self.program).args([flag, joined.as_str(), acl]);
        let output = self.runner.run(&inv)?;
        debug!(
            event = "SgeAcl",
            phase = "Modify",
            command = %inv,
            output = output.stdout.trim()
        );
        Ok(())
    }
}

impl MemberSource for SgeAclClient {
    fn fetch_members(&self, name: &str) -> Result<Vec<String>, AclError> {
        Ok(self.show(name)?.entries)
    }
}

impl MembershipStore for SgeAclClient {
    /// `qconf -au` creates a user set that does not exist yet.
    fn exists(&self, name: &str) -> Result<bool, AclError> {
        SgeAclClient::exists(self, name)
    }

    fn current_members(&self, name: &str) -> Result<Vec<String>, AclError> {
        self.fetch_members(name)
    }

    fn add_members(&self, name: &str, members: &[String]) -> Result<(), AclError> {
        self.modify("-au", name, members)
    }

    fn remove_members(&self, name: &str, members: &[String]) -> Result<(), AclError> {
        self.modify("-du", name, members)
    }
}
