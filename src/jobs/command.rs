// src/jobs/command.rs

//! `<var>` substitution for job command templates.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{CiJobsError, Result};

/// Name of the variable carrying the triggering CI event.
pub const EVENT_VAR: &str = "event";

/// Name of the variable carrying the diff base ref.
pub const BASE_REF_VAR: &str = "baseRef";

// `<name>` with no whitespace or nested angle brackets, so `cmd < file`
// redirections are left untouched.
static VAR_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^<>\s]+)>").expect("variable token regex is valid"));

/// Variables available to command templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandVars(BTreeMap<String, String>);

impl CommandVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// The triggering event, if known.
    pub fn event(&self) -> Option<&str> {
        self.get(EVENT_VAR)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CommandVars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Replace every `<var>` token in `command` with its value.
///
/// A token naming a variable that is not in `vars` is an error: a command
/// with an unresolved placeholder must never reach the CI runner.
pub fn substitute(command: &str, vars: &CommandVars) -> Result<String> {
    let mut out = String::with_capacity(command.len());
    let mut last = 0;

    for caps in VAR_TOKEN.captures_iter(command) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = vars
            .get(name.as_str())
            .ok_or_else(|| CiJobsError::MissingCommandVar {
                var: name.as_str().to_string(),
                command: command.to_string(),
            })?;
        out.push_str(&command[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }

    out.push_str(&command[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_vars() {
        let vars = CommandVars::new()
            .with("baseRef", "origin/trunk")
            .with("event", "pull_request");
        let cmd = substitute("pnpm lint --base=<baseRef> --event <event>", &vars).unwrap();
        assert_eq!(cmd, "pnpm lint --base=origin/trunk --event pull_request");
    }

    #[test]
    fn missing_var_is_an_error_naming_the_var() {
        let err = substitute("test --env=<event>", &CommandVars::new()).unwrap_err();
        match &err {
            CiJobsError::MissingCommandVar { var, command } => {
                assert_eq!(var, "event");
                assert_eq!(command, "test --env=<event>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("event"));
    }

    #[test]
    fn commands_without_tokens_pass_through() {
        let vars = CommandVars::new();
        assert_eq!(substitute("lint", &vars).unwrap(), "lint");
        assert_eq!(
            substitute("cat < input.txt > out.txt", &vars).unwrap(),
            "cat < input.txt > out.txt"
        );
    }

    #[test]
    fn event_accessor_reads_event_var() {
        let vars: CommandVars = [("event", "push")].into_iter().collect();
        assert_eq!(vars.event(), Some("push"));
        assert_eq!(vars.get("baseRef"), None);
    }
}
