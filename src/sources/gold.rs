use std::sync::Arc;

use tracing::debug;

use super::MemberSource;
use crate::command::{CommandRunner, Invocation, output_lines};
use crate::converge::MembershipStore;
use crate::error::AclError;

/// Gold accounting projects, driven through `glsproject` and `gchproject`.
#[derive(Clone)]
pub struct GoldProjectClient {
    list_program: String,
    change_program: String,
    runner: Arc<dyn CommandRunner>,
}

impl GoldProjectClient {
    pub fn new(
        list_program: impl Into<String>,
        change_program: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            list_program: list_program.into(),
            change_program: change_program.into(),
            runner,
        }
    }

    /// Names of every project.
    pub fn list(&self) -> Result<Vec<String>, AclError> {
        let inv = Invocation::new(&self.list_program).args(["--quiet", "--show", "Name", "--raw"]);
        let output = self.runner.run(&inv)?;
        Ok(output_lines(&output.stdout))
    }

    pub fn exists(&self, project: &str) -> Result<bool, AclError> {
        Ok(self.list()?.iter().any(|name| name == project))
    }

    fn change(&self, flag: &str, project: &str, members: &[String]) -> Result<(), AclError> {
        if members.is_empty() {
            return Ok(());
        }
        let joined = members.join(",");
        let inv = Invocation::new(&self.change_program).args(["-p", project, flag, joined.as_str()]);
        let output = self.runner.run(&inv)?;
        debug!(
            event = "GoldProject",
            phase = "Change",
            command = %inv,
            output = output.stdout.trim()
        );
        Ok(())
    }
}

impl MemberSource for GoldProjectClient {
    /// The users column may come back one per line or comma separated; both are accepted.
    fn fetch_members(&self, name: &str) -> Result<Vec<String>, AclError> {
        let inv = Invocation::new(&self.list_program)
            .args(["--quiet", "--show", "Users", "--raw", name]);
        let output = self.runner.run(&inv)?;
        Ok(output_lines(&output.stdout)
            .iter()
            .flat_map(|line| line.split(','))
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .map(str::to_string)
            .collect())
    }
}

impl MembershipStore for GoldProjectClient {
    fn current_members(&self, name: &str) -> Result<Vec<String>, AclError> {
        self.fetch_members(name)
    }

    fn add_members(&self, name: &str, members: &[String]) -> Result<(), AclError> {
        self.change("--addUsers", name, members)
    }

    fn remove_members(&self, name: &str, members: &[String]) -> Result<(), AclError> {
        self.change("--delUsers", name, members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::ScriptedRunner;
    use yare::parameterized;

    fn client(runner: ScriptedRunner) -> (Arc<ScriptedRunner>, GoldProjectClient) {
        let runner = Arc::new(runner);
        (
            runner.clone(),
            GoldProjectClient::new("glsproject", "gchproject", runner),
        )
    }

    #[parameterized(
        one_per_line = { "alice\nbob\n", &["alice", "bob"] },
        comma_separated = { "alice,bob\n", &["alice", "bob"] },
        empty = { "\n", &[] },
    )]
    fn test_fetch_members_output_shapes(stdout: &str, expected: &[&str]) {
        let (_runner, client) = client(
            ScriptedRunner::new().on("glsproject --quiet --show Users --raw proj1", stdout),
        );
        assert_eq!(client.fetch_members("proj1").unwrap(), expected);
    }

    #[test]
    fn test_list_and_exists() {
        let (_runner, client) = client(
            ScriptedRunner::new()
                .on("glsproject --quiet --show Name --raw", "proj1\nproj2\n")
                .on("glsproject --quiet --show Name --raw", "proj1\nproj2\n"),
        );
        assert_eq!(client.list().unwrap(), vec!["proj1", "proj2"]);
        assert!(client.exists("proj2").unwrap());
    }

    #[test]
    fn test_add_and_remove() {
        let (runner, client) = client(
            ScriptedRunner::new()
                .on("gchproject -p proj1 --addUsers a,b", "Successfully added 2 users\n")
                .on("gchproject -p proj1 --delUsers c", "Successfully removed 1 user\n"),
        );
        client
            .add_members("proj1", &["a".to_string(), "b".to_string()])
            .unwrap();
        client.remove_members("proj1", &["c".to_string()]).unwrap();
        client.remove_members("proj1", &[]).unwrap();
        assert_eq!(
            runner.command_lines(),
            vec![
                "gchproject -p proj1 --addUsers a,b",
                "gchproject -p proj1 --delUsers c"
            ]
        );
    }

    #[test]
    fn test_command_failure() {
        let (_runner, client) = client(
            ScriptedRunner::new().fail("glsproject --quiet --show Users --raw nope", "no such project"),
        );
        let err = client.fetch_members("nope").unwrap_err();
        assert!(err.to_string().contains("no such project"));
    }
}
