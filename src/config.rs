// ⚙️ Review Configuration - Paths, policy knobs and the evaluation instant

use crate::checks::{CheckPolicy, IdleThresholds};
use crate::error::{ReviewError, ReviewResult};
use crate::fiscal::FiscalYear;
use anyhow::{Context as AnyhowContext, Result};
use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_fiscal_year_start_month() -> u32 {
    4
}

fn default_grace_hours() -> i64 {
    24
}

fn default_okta_excluded_statuses() -> Vec<String> {
    vec!["DEPROVISIONED".to_string(), "SUSPENDED".to_string()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Folder holding darwinbox/okta/slack/gws exports
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Folder the report directory is created in
    #[serde(default = "default_data_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_fiscal_year_start_month")]
    pub fiscal_year_start_month: u32,

    #[serde(default = "default_grace_hours")]
    pub joiner_grace_hours: i64,

    #[serde(default = "default_grace_hours")]
    pub leaver_grace_hours: i64,

    #[serde(default)]
    pub idle_thresholds: IdleThresholds,

    #[serde(default = "default_okta_excluded_statuses")]
    pub okta_excluded_statuses: Vec<String>,

    /// Fixed evaluation instant; the local clock when absent
    #[serde(default)]
    pub as_of: Option<NaiveDateTime>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        ReviewConfig {
            data_dir: default_data_dir(),
            output_dir: default_data_dir(),
            fiscal_year_start_month: default_fiscal_year_start_month(),
            joiner_grace_hours: default_grace_hours(),
            leaver_grace_hours: default_grace_hours(),
            idle_thresholds: IdleThresholds::default(),
            okta_excluded_statuses: default_okta_excluded_statuses(),
            as_of: None,
        }
    }
}

impl ReviewConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: ReviewConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ReviewResult<()> {
        if !(1..=12).contains(&self.fiscal_year_start_month) {
            return Err(ReviewError::Config(format!(
                "fiscal_year_start_month must be 1..=12, got {}",
                self.fiscal_year_start_month
            )));
        }
        if self.joiner_grace_hours < 0 || self.leaver_grace_hours < 0 {
            return Err(ReviewError::Config(
                "grace periods cannot be negative".to_string(),
            ));
        }
        if !self.idle_thresholds.is_increasing() {
            let t = self.idle_thresholds;
            return Err(ReviewError::Config(format!(
                "idle thresholds must be positive and strictly increasing, got {}/{}/{}",
                t.warn, t.investigate, t.disable
            )));
        }
        Ok(())
    }

    pub fn now(&self) -> NaiveDateTime {
        self.as_of.unwrap_or_else(|| Local::now().naive_local())
    }

    pub fn fiscal_year(&self, now: NaiveDateTime) -> ReviewResult<FiscalYear> {
        FiscalYear::containing(now.date(), self.fiscal_year_start_month).ok_or_else(|| {
            ReviewError::Config(format!(
                "no fiscal year contains {} with start month {}",
                now.date(),
                self.fiscal_year_start_month
            ))
        })
    }

    pub fn policy(&self) -> CheckPolicy {
        CheckPolicy {
            joiner_grace: Duration::hours(self.joiner_grace_hours),
            leaver_grace: Duration::hours(self.leaver_grace_hours),
            idle: self.idle_thresholds,
            okta_excluded_statuses: self.okta_excluded_statuses.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "data_dir": "exports", "as_of": "2024-06-03T00:00:00", "idle_thresholds": {{ "warn": 30 }} }}"#
        )
        .unwrap();

        let config = ReviewConfig::from_file(file.path()).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("exports"));
        assert_eq!(config.output_dir, PathBuf::from("data"));
        assert_eq!(config.fiscal_year_start_month, 4);
        assert_eq!(config.idle_thresholds.warn, 30);
        assert_eq!(config.idle_thresholds.disable, 120);
        assert_eq!(config.now().to_string(), "2024-06-03 00:00:00");
        assert_eq!(config.policy(), CheckPolicy {
            idle: IdleThresholds { warn: 30, investigate: 90, disable: 120 },
            ..CheckPolicy::default()
        });
    }

    #[test]
    fn test_non_increasing_thresholds_are_rejected() {
        let config = ReviewConfig {
            idle_thresholds: IdleThresholds {
                warn: 45,
                investigate: 130,
                disable: 120,
            },
            ..ReviewConfig::default()
        };

        assert!(matches!(config.validate(), Err(ReviewError::Config(_))));
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        let config = ReviewConfig {
            fiscal_year_start_month: 0,
            ..ReviewConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fiscal_year_follows_start_month() {
        let config = ReviewConfig {
            fiscal_year_start_month: 1,
            ..ReviewConfig::default()
        };
        let now = chrono::NaiveDate::from_ymd_opt(2024, 2, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(config.fiscal_year(now).unwrap().start_year(), 2024);
    }
}
