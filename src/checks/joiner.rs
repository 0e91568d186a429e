// 🆕 Joiner Check - Access must not exist before the join date
// Only early provisioning is flagged; late provisioning is not a finding

use super::{ActionItem, ComplianceInspector, ComplianceStatus, PerSystem};
use crate::dates::CanonicalDate;
use crate::index::SystemIndexes;
use crate::sources::{EmployeeRecord, System};
use chrono::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinerRow {
    #[serde(flatten)]
    pub employee: EmployeeRecord,
    /// Account creation per system; `None` when the system has no account
    pub created: PerSystem<Option<CanonicalDate>>,
    pub compliance_status: ComplianceStatus,
    pub action_item: ActionItem,
}

/// True when `created` precedes the join date by more than `grace`
pub fn provisioned_early(created: CanonicalDate, joined: CanonicalDate, grace: Duration) -> bool {
    created.start_of_day() < joined.start_of_day() - grace
}

pub(crate) fn check(
    inspector: &ComplianceInspector,
    employees: &[EmployeeRecord],
    indexes: &SystemIndexes<'_>,
) -> Vec<JoinerRow> {
    employees
        .iter()
        .filter_map(|employee| {
            let joined = employee.date_of_joining?;
            if !inspector.fiscal_year.contains(joined) {
                return None;
            }

            let created = PerSystem::from_fn(|system: System| {
                indexes
                    .get(system)
                    .lookup(&employee.email)
                    .and_then(|account| account.created())
            });

            let grace = inspector.policy.joiner_grace;
            let action = ActionItem::strongest(
                created
                    .iter()
                    .filter_map(|(_, date)| *date)
                    .filter(|date| provisioned_early(*date, joined, grace))
                    .map(|_| ActionItem::Investigate),
            );

            Some(JoinerRow {
                employee: employee.clone(),
                created,
                compliance_status: action.compliance(),
                action_item: action,
            })
        })
        .collect()
}
