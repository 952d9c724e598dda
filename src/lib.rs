// src/lib.rs
pub use command::{CommandOutput, CommandRunner, Invocation, SystemCommandRunner};
pub use config::{Commands, Config, DEFAULT_CONFIG_PATH};
pub use converge::{
    ConvergeReport, ConvergingWriter, DestinationWriter, MembershipStore, Writer, converge,
};
pub use directory::{Directory, LdapOpts, LdapSearchDirectory};
pub use driver::{Driver, OutputFormat, RunOptions, RunReport, print_lists, run};
pub use error::{AclError, ErrorKind};
pub use expand::Expander;
pub use sge_acl::{AclType, SgeAcl, parse_acl};
pub use sources::{MemberSource, SourceRegistry};
pub use stringset::StringSet;

pub mod command;
pub mod config;
pub mod converge;
pub mod directory;
pub mod driver;
pub mod error;
pub mod expand;
pub mod sge_acl;
pub mod sources;
pub mod stringset;
pub mod types;
