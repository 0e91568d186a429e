// 👻 System User Check - Accounts with no owner in HR

use super::{ActionItem, ComplianceInspector, ComplianceStatus};
use crate::dates::CanonicalDate;
use crate::index::{HrEmails, SystemIndexes};
use crate::sources::{EmployeeRecord, System, SystemAccount};
use serde::{Deserialize, Serialize};

const UNKNOWN_STATUS: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemUserRow {
    pub email: String,
    pub source_system: System,
    /// Local part looks like firstname.lastname
    pub is_human: bool,
    pub last_login: Option<CanonicalDate>,
    pub status: String,
    /// Always false: rows exist only for accounts HR does not know
    pub tracked_in_darwinbox: bool,
    pub compliance_status: ComplianceStatus,
    pub action_item: ActionItem,
}

/// Exactly two alphabetic segments separated by a single "." before the "@"
pub fn is_human_email(email: &str) -> bool {
    let local = email.split('@').next().unwrap_or_default();
    let segments: Vec<&str> = local.split('.').collect();
    segments.len() == 2
        && segments
            .iter()
            .all(|segment| !segment.is_empty() && segment.chars().all(char::is_alphabetic))
}

pub(crate) fn check(
    inspector: &ComplianceInspector,
    employees: &[EmployeeRecord],
    indexes: &SystemIndexes<'_>,
) -> Vec<SystemUserRow> {
    let hr = HrEmails::from_employees(employees);
    let excluded = &inspector.policy.okta_excluded_statuses;

    indexes
        .iter()
        .flat_map(|index| {
            let system = index.system();
            let orphans = match system {
                System::Okta => index.orphans(&hr, |account| {
                    !account
                        .status()
                        .is_some_and(|status| excluded.contains(&status))
                }),
                // A deactivated first row drops the email even if a later duplicate is live
                System::Slack => index.first_row_orphans(&hr, |account| !account.is_deactivated()),
                System::Gws => index.orphans(&hr, |_| true),
            };
            orphans
                .into_iter()
                .map(move |account| orphan_row(system, account))
        })
        .collect()
}

fn orphan_row(system: System, account: &dyn SystemAccount) -> SystemUserRow {
    let is_human = is_human_email(account.email());
    let action = if is_human {
        ActionItem::Investigate
    } else {
        ActionItem::NoActionRequired
    };

    SystemUserRow {
        email: account.email().to_string(),
        source_system: system,
        is_human,
        last_login: account.last_login(),
        status: account
            .status()
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
        tracked_in_darwinbox: false,
        compliance_status: action.compliance(),
        action_item: action,
    }
}
