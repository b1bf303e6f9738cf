//! Configuration loading and management
//!
//! Handles parsing of `.taskdash.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".taskdash.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the task table is read from
    #[serde(default)]
    pub source: SourceConfig,

    /// Header text for each logical column
    #[serde(default)]
    pub columns: ColumnsConfig,

    /// Classification rules
    #[serde(default)]
    pub rules: Rules,
}

/// Task source configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Spreadsheet or CSV file holding the task table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Worksheet name (first sheet when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

/// Header text expected in the source for each logical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnsConfig {
    #[serde(default = "default_name_column")]
    pub name: String,

    #[serde(default = "default_status_column")]
    pub status: String,

    #[serde(default = "default_owner_column")]
    pub owner: String,

    #[serde(default = "default_validated_column")]
    pub validated: String,

    #[serde(default = "default_result_column")]
    pub result: String,

    #[serde(default = "default_notes_column")]
    pub notes: String,

    /// The historical header is misspelled; existing sheets depend on it.
    #[serde(default = "default_assigned_date_column")]
    pub assigned_date: String,

    #[serde(default = "default_completed_date_column")]
    pub completed_date: String,
}

fn default_name_column() -> String {
    "Name".to_string()
}

fn default_status_column() -> String {
    "Status".to_string()
}

fn default_owner_column() -> String {
    "assigned".to_string()
}

fn default_validated_column() -> String {
    "Validate (Y/N)".to_string()
}

fn default_result_column() -> String {
    "Result".to_string()
}

fn default_notes_column() -> String {
    "Notes".to_string()
}

fn default_assigned_date_column() -> String {
    "Assinged Date".to_string()
}

fn default_completed_date_column() -> String {
    "Completed Date".to_string()
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            name: default_name_column(),
            status: default_status_column(),
            owner: default_owner_column(),
            validated: default_validated_column(),
            result: default_result_column(),
            notes: default_notes_column(),
            assigned_date: default_assigned_date_column(),
            completed_date: default_completed_date_column(),
        }
    }
}

impl ColumnsConfig {
    /// Header names in table order.
    pub fn headers(&self) -> [&str; 8] {
        [
            self.name.as_str(),
            self.status.as_str(),
            self.owner.as_str(),
            self.validated.as_str(),
            self.result.as_str(),
            self.notes.as_str(),
            self.assigned_date.as_str(),
            self.completed_date.as_str(),
        ]
    }

    fn validate(&self) -> crate::error::Result<()> {
        let mut seen = HashSet::new();
        for header in self.headers() {
            let trimmed = header.trim();
            if trimmed.is_empty() {
                return Err(crate::error::Error::InvalidConfig(
                    "columns: header names cannot be empty".to_string(),
                ));
            }
            if !seen.insert(trimmed) {
                return Err(crate::error::Error::InvalidConfig(format!(
                    "columns: header '{trimmed}' is mapped more than once"
                )));
            }
        }
        Ok(())
    }
}

/// Rules used to classify tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    /// Status value (compared trimmed and case-insensitively) meaning "done"
    #[serde(default = "default_done_status")]
    pub done_status: String,

    /// Exact `Validate (Y/N)` value meaning "validated"
    #[serde(default = "default_validated_flag")]
    pub validated_flag: String,

    /// Open tasks assigned more than this many days ago are overdue
    #[serde(default = "default_overdue_after_days")]
    pub overdue_after_days: i64,

    /// Substrings of `Result` marking a task at risk
    #[serde(default = "default_risk_keywords")]
    pub risk_keywords: Vec<String>,
}

fn default_done_status() -> String {
    "done".to_string()
}

fn default_validated_flag() -> String {
    "Y".to_string()
}

fn default_overdue_after_days() -> i64 {
    14
}

fn default_risk_keywords() -> Vec<String> {
    vec![
        "fail".to_string(),
        "block".to_string(),
        "risk".to_string(),
        "issue".to_string(),
    ]
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            done_status: default_done_status(),
            validated_flag: default_validated_flag(),
            overdue_after_days: default_overdue_after_days(),
            risk_keywords: default_risk_keywords(),
        }
    }
}

impl Rules {
    /// True when `status` names the done state.
    pub fn is_done(&self, status: &str) -> bool {
        status.trim().to_lowercase() == self.done_status.trim().to_lowercase()
    }

    /// True when the validation flag is exactly the configured value.
    pub fn is_validated(&self, flag: &str) -> bool {
        flag == self.validated_flag
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.done_status.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "rules.done_status cannot be empty".to_string(),
            ));
        }
        if self.validated_flag.is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "rules.validated_flag cannot be empty".to_string(),
            ));
        }
        if self.overdue_after_days < 0 {
            return Err(crate::error::Error::InvalidConfig(
                "rules.overdue_after_days must be >= 0".to_string(),
            ));
        }
        if self.risk_keywords.is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "rules.risk_keywords cannot be empty".to_string(),
            ));
        }
        if self.risk_keywords.iter().any(|kw| kw.trim().is_empty()) {
            return Err(crate::error::Error::InvalidConfig(
                "rules.risk_keywords cannot include empty entries".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a `.taskdash.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.taskdash.toml` from a directory, or return defaults when absent.
    ///
    /// A present but invalid file is an error rather than silently ignored.
    pub fn load_from_dir(dir: &Path) -> crate::error::Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> crate::error::Result<()> {
        self.columns.validate()?;
        self.rules.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert!(cfg.source.path.is_none());
        assert!(cfg.source.sheet.is_none());
        assert_eq!(cfg.columns.owner, "assigned");
        assert_eq!(cfg.columns.assigned_date, "Assinged Date");
        assert_eq!(cfg.columns.validated, "Validate (Y/N)");
        assert_eq!(cfg.rules.done_status, "done");
        assert_eq!(cfg.rules.validated_flag, "Y");
        assert_eq!(cfg.rules.overdue_after_days, 14);
        assert_eq!(
            cfg.rules.risk_keywords,
            vec!["fail", "block", "risk", "issue"]
        );
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        let content = r#"
[source]
path = "tasks.xlsx"
sheet = "Tracker"

[columns]
owner = "Owner"
assigned_date = "Assigned Date"

[rules]
done_status = "Closed"
overdue_after_days = 7
risk_keywords = ["late"]
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.source.path, Some(PathBuf::from("tasks.xlsx")));
        assert_eq!(cfg.source.sheet.as_deref(), Some("Tracker"));
        assert_eq!(cfg.columns.owner, "Owner");
        assert_eq!(cfg.columns.assigned_date, "Assigned Date");
        assert_eq!(cfg.columns.name, "Name");
        assert_eq!(cfg.rules.done_status, "Closed");
        assert_eq!(cfg.rules.validated_flag, "Y");
        assert_eq!(cfg.rules.overdue_after_days, 7);
        assert_eq!(cfg.rules.risk_keywords, vec!["late"]);
    }

    #[test]
    fn duplicate_headers_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[columns]\nowner = \"Status\"\n").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            crate::error::Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_rules_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[rules]\noverdue_after_days = -1\n").expect("write config");
        assert!(matches!(
            Config::load(&path),
            Err(crate::error::Error::InvalidConfig(_))
        ));

        fs::write(&path, "[rules]\nrisk_keywords = []\n").expect("write config");
        assert!(matches!(
            Config::load(&path),
            Err(crate::error::Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn load_from_dir_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path()).expect("defaults");
        assert_eq!(cfg.rules.overdue_after_days, 14);
    }

    #[test]
    fn load_from_dir_reports_broken_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILE_NAME), "[rules\n").expect("write config");
        assert!(matches!(
            Config::load_from_dir(dir.path()),
            Err(crate::error::Error::TomlParse(_))
        ));
    }

    #[test]
    fn done_status_is_trimmed_and_case_folded() {
        let rules = Rules::default();
        assert!(rules.is_done("Done"));
        assert!(rules.is_done("  DONE "));
        assert!(!rules.is_done("Done!"));
        assert!(!rules.is_done(""));
    }

    #[test]
    fn validated_flag_is_exact() {
        let rules = Rules::default();
        assert!(rules.is_validated("Y"));
        assert!(!rules.is_validated("y"));
        assert!(!rules.is_validated("Y "));
        assert!(!rules.is_validated(""));
    }
}
