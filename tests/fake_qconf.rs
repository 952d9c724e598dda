//! Drives an SGE ACL destination through a stand-in `qconf` script.
//!
//! Kept as the only test in this binary: it writes an executable and then
//! spawns it, which must not race with other tests forking.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;

use update_acls::{Config, Driver, RunOptions, SgeAcl, SystemCommandRunner, sources::SgeAclClient};

const FAKE_QCONF: &str = r#"#!/bin/sh
state="$(dirname "$0")/acl-state"
case "$1" in
  -sul)
    echo Open
    ;;
  -su)
    entries=$(tr '\n' ',' < "$state" | sed 's/,$//')
    [ -z "$entries" ] && entries=NONE
    printf 'name    %s\ntype    ACL\nfshare  0\noticket 0\nentries %s\n' "$2" "$entries"
    ;;
  -au)
    echo "$2" | tr ',' '\n' >> "$state"
    ;;
  -du)
    for user in $(echo "$2" | tr ',' ' '); do
      grep -vxF "$user" "$state" > "$state.tmp"
      mv "$state.tmp" "$state"
    done
    ;;
  *)
    echo "unexpected arguments: $*" >&2
    exit 1
    ;;
esac
"#;

#[test]
fn test_sge_destination_converges_through_qconf() {
    let dir = tempfile::tempdir().unwrap();
    let qconf = dir.path().join("qconf");
    fs::write(&qconf, FAKE_QCONF).unwrap();
    fs::set_permissions(&qconf, fs::Permissions::from_mode(0o755)).unwrap();
    fs::write(dir.path().join("acl-state"), "alice\nmallory\n").unwrap();

    let config: Config = format!(
        r#"
[commands]
qconf = "{qconf}"

[[lists]]
name = "open"
[lists.include]
users = ["alice", "bob", "carol"]
[lists.destinations]
sge_acls = ["Open"]
"#,
        qconf = qconf.display()
    )
    .parse()
    .unwrap();
    config.validate().unwrap();

    let runner = Arc::new(SystemCommandRunner);
    let report = Driver::from_config(&config, runner.clone())
        .run(&config.lists, &RunOptions::default(), &mut std::io::sink())
        .unwrap();
    assert!(report.is_success(), "{:?}", report.errors().collect::<Vec<_>>());

    let client = SgeAclClient::new(qconf.display().to_string(), runner);
    let acl: SgeAcl = client.show("Open").unwrap();
    let mut entries = acl.entries;
    entries.sort();
    assert_eq!(entries, vec!["alice", "bob", "carol"]);
    assert!(client.exists("Open").unwrap());
}
