use anyhow::Result;
use tracing::debug;

use plugsync_domain::{parse_list_row, InstalledPlugin};

use crate::effects::{CliOptions, PluginCli};

/// Read-only view of the live plugin table; one wp-cli call per question,
/// nothing cached.
pub struct StateQuery<'a> {
    cli: &'a dyn PluginCli,
}

impl<'a> StateQuery<'a> {
    #[must_use]
    pub fn new(cli: &'a dyn PluginCli) -> Self {
        Self { cli }
    }

    /// Fetches the install record for one plugin. `None` is the tool's own
    /// "no such plugin" answer, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only when wp-cli itself cannot be spawned.
    pub fn get_one(&self, name: &str) -> Result<Option<InstalledPlugin>> {
        let args = vec![
            "plugin".to_string(),
            "get".to_string(),
            name.to_string(),
            "--fields=name,status,version".to_string(),
            "--format=json".to_string(),
        ];
        let output = self.cli.run(&args, CliOptions::silent())?;
        if !output.success() {
            return Ok(None);
        }
        match serde_json::from_str::<InstalledPlugin>(output.stdout.trim()) {
            Ok(fact) => Ok(Some(fact)),
            Err(err) => {
                debug!(plugin = name, error = %err, "unreadable plugin get payload");
                Ok(None)
            }
        }
    }

    /// Lists the full installed-plugin table. Rows that do not parse as a
    /// well-formed record are silently skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only when wp-cli itself cannot be spawned.
    pub fn get_all(&self) -> Result<Vec<InstalledPlugin>> {
        let args = vec![
            "plugin".to_string(),
            "list".to_string(),
            "--fields=name,status,version".to_string(),
            "--format=csv".to_string(),
        ];
        let output = self.cli.run(&args, CliOptions::silent())?;
        Ok(output.stdout.lines().filter_map(parse_list_row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::RunOutput;
    use plugsync_domain::PluginStatus;
    use std::cell::RefCell;

    struct ScriptedCli {
        get_response: RunOutput,
        list_stdout: String,
        calls: RefCell<Vec<String>>,
    }

    impl PluginCli for ScriptedCli {
        fn run(&self, args: &[String], _options: CliOptions) -> Result<RunOutput> {
            self.calls.borrow_mut().push(args.join(" "));
            if args[1] == "list" {
                return Ok(RunOutput {
                    code: 0,
                    stdout: self.list_stdout.clone(),
                    stderr: String::new(),
                });
            }
            Ok(self.get_response.clone())
        }
    }

    fn cli(get_response: RunOutput, list_stdout: &str) -> ScriptedCli {
        ScriptedCli {
            get_response,
            list_stdout: list_stdout.to_string(),
            calls: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn get_one_parses_the_json_payload() {
        let cli = cli(
            RunOutput {
                code: 0,
                stdout: r#"{"name":"acme-seo","status":"active","version":"2.1.0"}"#.into(),
                stderr: String::new(),
            },
            "",
        );
        let fact = StateQuery::new(&cli)
            .get_one("acme-seo")
            .expect("query")
            .expect("fact");
        assert_eq!(fact.status, PluginStatus::Active);
        assert_eq!(fact.version.as_deref(), Some("2.1.0"));
        assert!(cli.calls.borrow()[0].starts_with("plugin get acme-seo"));
    }

    #[test]
    fn get_one_maps_tool_not_found_to_absent() {
        let cli = cli(
            RunOutput {
                code: 1,
                stdout: String::new(),
                stderr: "Error: The 'acme-seo' plugin could not be found.".into(),
            },
            "",
        );
        assert_eq!(StateQuery::new(&cli).get_one("acme-seo").expect("query"), None);
    }

    #[test]
    fn get_one_maps_garbage_payload_to_absent() {
        let cli = cli(
            RunOutput {
                code: 0,
                stdout: "Warning: something unrelated".into(),
                stderr: String::new(),
            },
            "",
        );
        assert_eq!(StateQuery::new(&cli).get_one("acme-seo").expect("query"), None);
    }

    #[test]
    fn get_all_skips_header_and_malformed_rows() {
        let cli = cli(
            RunOutput {
                code: 0,
                stdout: String::new(),
                stderr: String::new(),
            },
            "name,status,version\nacme-seo,active,2.1.0\ngarbage\nhello-dolly,inactive,1.7\n",
        );
        let table = StateQuery::new(&cli).get_all().expect("query");
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].name, "acme-seo");
        assert_eq!(table[1].name, "hello-dolly");
    }
}
