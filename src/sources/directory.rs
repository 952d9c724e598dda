use std::sync::Arc;

use super::MemberSource;
use crate::directory::Directory;
use crate::error::AclError;

/// Members of a directory group.
#[derive(Clone)]
pub struct AdGroupSource(pub Arc<dyn Directory>);

impl MemberSource for AdGroupSource {
    fn fetch_members(&self, name: &str) -> Result<Vec<String>, AclError> {
        self.0.group_members(name)
    }
}

/// Everyone tagged with a department in the directory.
#[derive(Clone)]
pub struct DepartmentSource(pub Arc<dyn Directory>);

impl MemberSource for DepartmentSource {
    fn fetch_members(&self, name: &str) -> Result<Vec<String>, AclError> {
        self.0.department_members(name)
    }
}
