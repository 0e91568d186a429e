// 🚪 Leaver Check - Access must be gone, and unused, after the exit date

use super::{ActionItem, ComplianceInspector, ComplianceStatus, PerSystem};
use crate::dates::CanonicalDate;
use crate::index::SystemIndexes;
use crate::sources::{EmployeeRecord, SystemAccount};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Literal status that counts as "still enabled"; the messaging system never reports it
pub const ACTIVE_STATUS: &str = "ACTIVE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaverRow {
    #[serde(flatten)]
    pub employee: EmployeeRecord,
    pub last_login: PerSystem<Option<CanonicalDate>>,
    pub status: PerSystem<Option<String>>,
    pub compliance_status: ComplianceStatus,
    pub action_item: ActionItem,
}

/// Action for one system account of someone who left on `exited`
pub fn account_action(
    account: &dyn SystemAccount,
    exited: CanonicalDate,
    now: NaiveDateTime,
    grace: Duration,
) -> ActionItem {
    let still_active = account.status().as_deref() == Some(ACTIVE_STATUS)
        && now > exited.start_of_day() + grace;
    let used_after_exit = account
        .last_login()
        .is_some_and(|last_login| last_login > exited);

    if used_after_exit {
        ActionItem::Revoke
    } else if still_active {
        ActionItem::Investigate
    } else {
        ActionItem::NoActionRequired
    }
}

pub(crate) fn check(
    inspector: &ComplianceInspector,
    employees: &[EmployeeRecord],
    indexes: &SystemIndexes<'_>,
) -> Vec<LeaverRow> {
    employees
        .iter()
        .filter_map(|employee| {
            let exited = employee.date_of_exit?;
            if !inspector.fiscal_year.contains(exited) {
                return None;
            }

            let accounts = PerSystem::from_fn(|system| indexes.get(system).lookup(&employee.email));

            let action = ActionItem::strongest(accounts.iter().filter_map(|(_, account)| {
                account.map(|account| {
                    account_action(account, exited, inspector.now, inspector.policy.leaver_grace)
                })
            }));

            Some(LeaverRow {
                employee: employee.clone(),
                last_login: PerSystem::from_fn(|system| {
                    accounts.get(system).and_then(|account| account.last_login())
                }),
                status: PerSystem::from_fn(|system| {
                    accounts.get(system).and_then(|account| account.status())
                }),
                compliance_status: action.compliance(),
                action_item: action,
            })
        })
        .collect()
}
