#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::assert::Assert;
use serde_json::Value;
use tempfile::TempDir;

/// A scripted stand-in for wp-cli. Records every invocation's argv line to a
/// log file and answers `plugin get` / `plugin list` from fixture state, so
/// tests can assert the exact command sequence a run issued.
pub struct FakeWp {
    temp: TempDir,
    pub bin: PathBuf,
    pub site: PathBuf,
    log: PathBuf,
    state: PathBuf,
}

impl FakeWp {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let site = temp.path().join("site");
        let state = temp.path().join("state");
        let log = temp.path().join("wp.log");
        fs::create_dir_all(site.as_path()).expect("site dir");
        fs::create_dir_all(state.join("facts")).expect("facts dir");
        fs::write(&log, "").expect("log file");

        let bin = temp.path().join("wp");
        let script = format!(
            r#"#!/bin/sh
printf '%s\n' "$*" >> "{log}"
case "$1 $2" in
"plugin get")
  if [ -f "{state}/facts/$3.json" ]; then
    cat "{state}/facts/$3.json"
    exit 0
  fi
  echo "Error: The '$3' plugin could not be found." >&2
  exit 1
  ;;
"plugin list")
  echo "name,status,version"
  if [ -f "{state}/list.csv" ]; then
    cat "{state}/list.csv"
  fi
  exit 0
  ;;
*)
  exit 0
  ;;
esac
"#,
            log = log.display(),
            state = state.display(),
        );
        fs::write(&bin, script).expect("wp script");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&bin).expect("wp metadata").permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&bin, perms).expect("wp chmod");
        }
        Self {
            temp,
            bin,
            site,
            log,
            state,
        }
    }

    /// Registers an installed plugin: served to `plugin get` and listed by
    /// `plugin list`.
    pub fn installed(&self, name: &str, status: &str, version: &str) {
        let fact = serde_json::json!({
            "name": name,
            "status": status,
            "version": version,
        });
        fs::write(
            self.state.join("facts").join(format!("{name}.json")),
            fact.to_string(),
        )
        .expect("fact file");
        self.list_row(&format!("{name},{status},{version}"));
    }

    /// Appends a raw row to the `plugin list` output, well-formed or not.
    pub fn list_row(&self, row: &str) {
        let path = self.state.join("list.csv");
        let mut contents = fs::read_to_string(&path).unwrap_or_default();
        contents.push_str(row);
        contents.push('\n');
        fs::write(&path, contents).expect("list row");
    }

    /// Writes a manifest next to the fixture and returns its path.
    pub fn manifest(&self, yaml: &str) -> PathBuf {
        let path = self.temp.path().join("plugins.yml");
        fs::write(&path, yaml).expect("manifest");
        path
    }

    /// Every argv line wp-cli was invoked with, in order.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// The invocations that would mutate the site (everything but the
    /// read-only queries).
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| !call.starts_with("plugin get ") && !call.starts_with("plugin list "))
            .collect()
    }
}

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}
