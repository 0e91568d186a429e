// 💤 Idle Check - Active employees who stopped signing in

use super::{ActionItem, ComplianceInspector, ComplianceStatus, PerSystem};
use crate::dates::CanonicalDate;
use crate::index::SystemIndexes;
use crate::sources::{EmployeeRecord, System};
use serde::{Deserialize, Serialize};

/// Day counts for the three idle tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleThresholds {
    pub warn: i64,
    pub investigate: i64,
    pub disable: i64,
}

impl Default for IdleThresholds {
    fn default() -> Self {
        IdleThresholds {
            warn: 45,
            investigate: 90,
            disable: 120,
        }
    }
}

impl IdleThresholds {
    pub fn is_increasing(&self) -> bool {
        0 < self.warn && self.warn < self.investigate && self.investigate < self.disable
    }

    pub fn tiers(&self) -> [i64; 3] {
        [self.warn, self.investigate, self.disable]
    }

    /// Action one system contributes after `days` without a sign-in
    pub fn action_for(&self, days: i64) -> ActionItem {
        if days >= self.disable {
            ActionItem::Disable
        } else if days >= self.investigate {
            ActionItem::Investigate
        } else {
            ActionItem::NoActionRequired
        }
    }
}

/// Which tiers a record breached in at least one system; cumulative by construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleFlags {
    pub warn: bool,
    pub investigate: bool,
    pub disable: bool,
}

impl IdleFlags {
    fn record(&mut self, days: i64, thresholds: &IdleThresholds) {
        self.warn |= days >= thresholds.warn;
        self.investigate |= days >= thresholds.investigate;
        self.disable |= days >= thresholds.disable;
    }

    pub fn as_array(&self) -> [bool; 3] {
        [self.warn, self.investigate, self.disable]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdleRow {
    #[serde(flatten)]
    pub employee: EmployeeRecord,
    pub last_login: PerSystem<Option<CanonicalDate>>,
    pub days_idle: PerSystem<Option<i64>>,
    pub flags: IdleFlags,
    /// Systems breaching the lowest tier, in evaluation order
    pub idle_systems: Vec<System>,
    pub compliance_status: ComplianceStatus,
    pub action_item: ActionItem,
}

impl IdleRow {
    /// "Okta, GWS", or "None"
    pub fn idle_systems_label(&self) -> String {
        if self.idle_systems.is_empty() {
            return "None".to_string();
        }
        self.idle_systems
            .iter()
            .map(|system| system.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub(crate) fn check(
    inspector: &ComplianceInspector,
    employees: &[EmployeeRecord],
    indexes: &SystemIndexes<'_>,
) -> Vec<IdleRow> {
    let thresholds = &inspector.policy.idle;

    employees
        .iter()
        .filter(|employee| employee.is_active())
        .map(|employee| {
            let last_login = PerSystem::from_fn(|system| {
                indexes
                    .get(system)
                    .lookup(&employee.email)
                    .and_then(|account| account.last_login())
            });
            let days_idle = PerSystem::from_fn(|system| {
                last_login
                    .get(system)
                    .map(|login| login.days_until(inspector.now))
            });

            let mut flags = IdleFlags::default();
            let mut idle_systems = Vec::new();
            for (system, days) in days_idle.iter() {
                if let Some(days) = *days {
                    flags.record(days, thresholds);
                    if days >= thresholds.warn {
                        idle_systems.push(system);
                    }
                }
            }

            let action = ActionItem::strongest(
                days_idle
                    .iter()
                    .filter_map(|(_, days)| *days)
                    .map(|days| thresholds.action_for(days)),
            );

            IdleRow {
                employee: employee.clone(),
                last_login,
                days_idle,
                flags,
                idle_systems,
                compliance_status: action.compliance(),
                action_item: action,
            }
        })
        .collect()
}
