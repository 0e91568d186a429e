// ⚖️ Compliance Checks - Classify HR records against the account systems
//
// Four independent procedures share one evaluation instant and one policy:
//   joiner       access provisioned before the join date
//   leaver       access kept or used after the exit date
//   idle         active employees not signing in
//   system_user  accounts nobody in HR owns
//
// Action items carry a precedence (No Action Required < Investigate < Revoke < Disable);
// every check reduces its candidate actions with `max`, so a stronger action is never downgraded.

pub mod idle;
pub mod joiner;
pub mod leaver;
pub mod system_users;

pub use idle::{IdleFlags, IdleRow, IdleThresholds};
pub use joiner::JoinerRow;
pub use leaver::LeaverRow;
pub use system_users::{is_human_email, SystemUserRow};

use crate::diagnostics::Diagnostics;
use crate::error::ReviewResult;
use crate::fiscal::FiscalYear;
use crate::index::SystemIndexes;
use crate::sources::{SourceSnapshot, System};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// VERDICT VOCABULARY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplianceStatus {
    Compliant,
    #[serde(rename = "Non Compliant")]
    NonCompliant,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "Compliant",
            ComplianceStatus::NonCompliant => "Non Compliant",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered by precedence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionItem {
    #[default]
    #[serde(rename = "No Action Required")]
    NoActionRequired,
    Investigate,
    Revoke,
    Disable,
}

impl ActionItem {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionItem::NoActionRequired => "No Action Required",
            ActionItem::Investigate => "Investigate",
            ActionItem::Revoke => "Revoke",
            ActionItem::Disable => "Disable",
        }
    }

    /// Any action other than "No Action Required" marks the record non-compliant
    pub fn compliance(&self) -> ComplianceStatus {
        match self {
            ActionItem::NoActionRequired => ComplianceStatus::Compliant,
            _ => ComplianceStatus::NonCompliant,
        }
    }

    /// Highest-precedence action among the candidates
    pub fn strongest<I>(candidates: I) -> ActionItem
    where
        I: IntoIterator<Item = ActionItem>,
    {
        candidates.into_iter().max().unwrap_or_default()
    }
}

impl fmt::Display for ActionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CHECK KINDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Joiner,
    Leaver,
    Idle,
    SystemUser,
}

impl CheckKind {
    pub const ALL: [CheckKind; 4] = [
        CheckKind::Joiner,
        CheckKind::Leaver,
        CheckKind::Idle,
        CheckKind::SystemUser,
    ];

    /// Short name used in errors and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::Joiner => "joiner",
            CheckKind::Leaver => "leaver",
            CheckKind::Idle => "idle",
            CheckKind::SystemUser => "system_user",
        }
    }

    /// Row label in the compliance summary
    pub fn title(&self) -> &'static str {
        match self {
            CheckKind::Joiner => "New Joiner Access",
            CheckKind::Leaver => "Leaver Access",
            CheckKind::Idle => "Idle Users",
            CheckKind::SystemUser => "System Users",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CheckKind::Joiner => "whether new joiners have got access prior to date of joining",
            CheckKind::Leaver => {
                "whether exit employees retained access after LWD and / or logged in post LWD"
            }
            CheckKind::Idle => "whether active employees have not logged into IT systems",
            CheckKind::SystemUser => "whether IT system users are tracked accurately in HR records",
        }
    }
}

// ============================================================================
// PER-SYSTEM VALUES
// ============================================================================

/// One value per account system
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerSystem<T> {
    pub okta: T,
    pub slack: T,
    pub gws: T,
}

impl<T> PerSystem<T> {
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(System) -> T,
    {
        PerSystem {
            okta: f(System::Okta),
            slack: f(System::Slack),
            gws: f(System::Gws),
        }
    }

    pub fn get(&self, system: System) -> &T {
        match system {
            System::Okta => &self.okta,
            System::Slack => &self.slack,
            System::Gws => &self.gws,
        }
    }

    /// Values in evaluation order, paired with their system
    pub fn iter(&self) -> impl Iterator<Item = (System, &T)> {
        System::ALL.into_iter().map(move |system| (system, self.get(system)))
    }
}

// ============================================================================
// POLICY & ENGINE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CheckPolicy {
    /// Joiner: access created more than this long before joining is flagged
    pub joiner_grace: Duration,
    /// Leaver: an account still ACTIVE this long after exit is flagged
    pub leaver_grace: Duration,
    pub idle: IdleThresholds,
    /// Identity-provider statuses skipped before the orphan diff
    pub okta_excluded_statuses: Vec<String>,
}

impl Default for CheckPolicy {
    fn default() -> Self {
        CheckPolicy {
            joiner_grace: Duration::hours(24),
            leaver_grace: Duration::hours(24),
            idle: IdleThresholds::default(),
            okta_excluded_statuses: vec!["DEPROVISIONED".to_string(), "SUSPENDED".to_string()],
        }
    }
}

/// Output of one full inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResults {
    pub fiscal_year: FiscalYear,
    pub evaluated_at: NaiveDateTime,
    pub idle_thresholds: IdleThresholds,
    pub joiners: Vec<JoinerRow>,
    pub leavers: Vec<LeaverRow>,
    pub idle_users: Vec<IdleRow>,
    pub system_users: Vec<SystemUserRow>,
}

pub struct ComplianceInspector {
    pub policy: CheckPolicy,
    /// Evaluation instant shared by every time-dependent rule
    pub now: NaiveDateTime,
    pub fiscal_year: FiscalYear,
}

impl ComplianceInspector {
    pub fn new(now: NaiveDateTime, fiscal_year: FiscalYear) -> Self {
        ComplianceInspector::with_policy(CheckPolicy::default(), now, fiscal_year)
    }

    pub fn with_policy(policy: CheckPolicy, now: NaiveDateTime, fiscal_year: FiscalYear) -> Self {
        ComplianceInspector {
            policy,
            now,
            fiscal_year,
        }
    }

    pub fn joiners(
        &self,
        snapshot: &SourceSnapshot,
        indexes: &SystemIndexes<'_>,
    ) -> ReviewResult<Vec<JoinerRow>> {
        let employees = snapshot
            .employees()
            .map_err(|e| e.in_check(CheckKind::Joiner.name(), "select"))?;
        Ok(joiner::check(self, employees, indexes))
    }

    pub fn leavers(
        &self,
        snapshot: &SourceSnapshot,
        indexes: &SystemIndexes<'_>,
    ) -> ReviewResult<Vec<LeaverRow>> {
        let employees = snapshot
            .employees()
            .map_err(|e| e.in_check(CheckKind::Leaver.name(), "select"))?;
        Ok(leaver::check(self, employees, indexes))
    }

    pub fn idle_users(
        &self,
        snapshot: &SourceSnapshot,
        indexes: &SystemIndexes<'_>,
    ) -> ReviewResult<Vec<IdleRow>> {
        let employees = snapshot
            .employees()
            .map_err(|e| e.in_check(CheckKind::Idle.name(), "select"))?;
        Ok(idle::check(self, employees, indexes))
    }

    pub fn system_users(
        &self,
        snapshot: &SourceSnapshot,
        indexes: &SystemIndexes<'_>,
    ) -> ReviewResult<Vec<SystemUserRow>> {
        let employees = snapshot
            .employees()
            .map_err(|e| e.in_check(CheckKind::SystemUser.name(), "orphan diff"))?;
        Ok(system_users::check(self, employees, indexes))
    }

    /// Run all four checks over one snapshot
    pub fn inspect(
        &self,
        snapshot: &SourceSnapshot,
        diagnostics: &dyn Diagnostics,
    ) -> ReviewResult<CheckResults> {
        let indexes = SystemIndexes::from_snapshot(snapshot);
        for index in indexes.iter() {
            if !index.is_loaded() {
                diagnostics.warn(
                    "inspect",
                    format!("{} table missing; treated as having no accounts", index.system()),
                );
            }
        }

        let joiners = self.joiners(snapshot, &indexes)?;
        log_outcome(diagnostics, CheckKind::Joiner, &joiners, |r| r.compliance_status);

        let leavers = self.leavers(snapshot, &indexes)?;
        log_outcome(diagnostics, CheckKind::Leaver, &leavers, |r| r.compliance_status);

        let idle_users = self.idle_users(snapshot, &indexes)?;
        log_outcome(diagnostics, CheckKind::Idle, &idle_users, |r| r.compliance_status);

        let system_users = self.system_users(snapshot, &indexes)?;
        log_outcome(diagnostics, CheckKind::SystemUser, &system_users, |r| {
            r.compliance_status
        });

        Ok(CheckResults {
            fiscal_year: self.fiscal_year,
            evaluated_at: self.now,
            idle_thresholds: self.policy.idle,
            joiners,
            leavers,
            idle_users,
            system_users,
        })
    }
}

fn log_outcome<R>(
    diagnostics: &dyn Diagnostics,
    kind: CheckKind,
    rows: &[R],
    status: impl Fn(&R) -> ComplianceStatus,
) {
    let flagged = rows
        .iter()
        .filter(|row| status(row) == ComplianceStatus::NonCompliant)
        .count();
    diagnostics.info(
        kind.name(),
        format!("{}: {} checked, {} non compliant", kind.title(), rows.len(), flagged),
    );
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::dates::CanonicalDate;
    use crate::fiscal::FiscalYear;
    use crate::sources::{EmployeeRecord, GwsAccount, OktaAccount, SlackAccount};
    use chrono::{NaiveDate, NaiveDateTime};

    pub fn date(y: i32, m: u32, d: u32) -> Option<CanonicalDate> {
        CanonicalDate::from_ymd(y, m, d)
    }

    pub fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    pub fn fy2024() -> FiscalYear {
        FiscalYear::starting(2024, 4).unwrap()
    }

    pub fn employee(
        email: &str,
        joined: Option<CanonicalDate>,
        exited: Option<CanonicalDate>,
    ) -> EmployeeRecord {
        EmployeeRecord {
            email: email.to_string(),
            date_of_joining: joined,
            date_of_exit: exited,
            employee_type: "Full Time".to_string(),
            employment_status: None,
        }
    }

    pub fn okta(
        email: &str,
        status: &str,
        created: Option<CanonicalDate>,
        last_login: Option<CanonicalDate>,
    ) -> OktaAccount {
        OktaAccount {
            email: email.to_string(),
            second_email: None,
            status: Some(status.to_string()),
            status_exported: true,
            created,
            activated: None,
            status_changed: None,
            last_updated: None,
            last_login,
        }
    }

    pub fn slack(
        email: &str,
        created: Option<CanonicalDate>,
        last_active: Option<CanonicalDate>,
        deactivated: Option<CanonicalDate>,
    ) -> SlackAccount {
        SlackAccount {
            email: email.to_string(),
            account_type: Some("Member".to_string()),
            created,
            last_active,
            deactivated,
        }
    }

    pub fn gws(email: &str, status: &str, last_sign_in: Option<CanonicalDate>) -> GwsAccount {
        GwsAccount {
            email: email.to_string(),
            status: Some(status.to_string()),
            last_sign_in,
        }
    }
}
