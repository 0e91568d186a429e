// 📊 Summaries - HR, account-system and compliance aggregates
// Recomputed from the snapshot and check results on every run

use crate::checks::{CheckKind, CheckResults, ComplianceStatus, PerSystem};
use crate::fiscal::FiscalYear;
use crate::index::SystemIndexes;
use crate::sources::{SourceSnapshot, System};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// HR SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HrSummaryRow {
    pub employee_type: String,
    pub new_joiners: usize,
    pub active_employees: usize,
    pub terminated_users: usize,
}

/// One row per employee type, in order of first appearance
pub fn hr_summary(snapshot: &SourceSnapshot, fiscal_year: &FiscalYear) -> Vec<HrSummaryRow> {
    let mut rows: Vec<HrSummaryRow> = Vec::new();

    for employee in snapshot.employees.as_deref().unwrap_or_default() {
        let position = match rows
            .iter()
            .position(|row| row.employee_type == employee.employee_type)
        {
            Some(position) => position,
            None => {
                rows.push(HrSummaryRow {
                    employee_type: employee.employee_type.clone(),
                    new_joiners: 0,
                    active_employees: 0,
                    terminated_users: 0,
                });
                rows.len() - 1
            }
        };

        let row = &mut rows[position];
        if employee
            .date_of_joining
            .is_some_and(|joined| fiscal_year.contains(joined))
        {
            row.new_joiners += 1;
        }
        if employee.is_active() {
            row.active_employees += 1;
        } else {
            row.terminated_users += 1;
        }
    }

    rows
}

// ============================================================================
// SYSTEM SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSummaryRow {
    pub system: System,
    pub total_users: usize,
    pub active_users: usize,
    pub inactive_users: usize,
}

pub fn system_summary(indexes: &SystemIndexes<'_>) -> Vec<SystemSummaryRow> {
    indexes
        .iter()
        .map(|index| {
            let total_users = index.len();
            let active_users = index.accounts().filter(|account| account.is_active()).count();
            SystemSummaryRow {
                system: index.system(),
                total_users,
                active_users,
                inactive_users: total_users - active_users,
            }
        })
        .collect()
}

// ============================================================================
// COMPLIANCE SUMMARY
// ============================================================================

/// Share of compliant records, or unavailable when nothing was checked
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRate(pub Option<f64>);

impl ComplianceRate {
    pub fn from_counts(total: usize, non_compliant: usize) -> Self {
        if total == 0 {
            return ComplianceRate(None);
        }
        let compliant = total.saturating_sub(non_compliant);
        ComplianceRate(Some(compliant as f64 / total as f64 * 100.0))
    }

    pub fn is_available(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Display for ComplianceRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(rate) => write!(f, "{:.1}%", rate),
            None => f.write_str("N/A"),
        }
    }
}

/// Extra columns a check row carries instead of a rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComplianceDetail {
    Rate {
        non_compliant: usize,
        compliance_rate: ComplianceRate,
    },
    Idle {
        /// Records breaching each tier, paired with the tier's day count
        over_threshold: Vec<(i64, usize)>,
        by_system: PerSystem<usize>,
    },
    SystemUsers {
        human_format: usize,
        system_format: usize,
        by_system: PerSystem<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSummaryRow {
    pub check: CheckKind,
    pub total_checked: usize,
    pub detail: ComplianceDetail,
}

impl ComplianceSummaryRow {
    pub fn check_type(&self) -> &'static str {
        self.check.title()
    }

    pub fn description(&self) -> &'static str {
        self.check.description()
    }

    pub fn non_compliant(&self) -> Option<usize> {
        match &self.detail {
            ComplianceDetail::Rate { non_compliant, .. } => Some(*non_compliant),
            _ => None,
        }
    }

    pub fn compliance_rate(&self) -> Option<ComplianceRate> {
        match &self.detail {
            ComplianceDetail::Rate {
                compliance_rate, ..
            } => Some(*compliance_rate),
            _ => None,
        }
    }

    pub fn by_system(&self) -> Option<&PerSystem<usize>> {
        match &self.detail {
            ComplianceDetail::Idle { by_system, .. }
            | ComplianceDetail::SystemUsers { by_system, .. } => Some(by_system),
            ComplianceDetail::Rate { .. } => None,
        }
    }
}

fn rate_row<R>(check: CheckKind, rows: &[R], status: impl Fn(&R) -> ComplianceStatus) -> ComplianceSummaryRow {
    let non_compliant = rows
        .iter()
        .filter(|row| status(row) == ComplianceStatus::NonCompliant)
        .count();
    ComplianceSummaryRow {
        check,
        total_checked: rows.len(),
        detail: ComplianceDetail::Rate {
            non_compliant,
            compliance_rate: ComplianceRate::from_counts(rows.len(), non_compliant),
        },
    }
}

pub fn compliance_summary(results: &CheckResults) -> Vec<ComplianceSummaryRow> {
    let thresholds = results.idle_thresholds;
    let idle = &results.idle_users;
    let system_users = &results.system_users;

    let over_threshold = thresholds
        .tiers()
        .into_iter()
        .enumerate()
        .map(|(tier, days)| {
            let count = idle.iter().filter(|row| row.flags.as_array()[tier]).count();
            (days, count)
        })
        .collect();

    let human_format = system_users.iter().filter(|row| row.is_human).count();

    vec![
        rate_row(CheckKind::Joiner, &results.joiners, |row| row.compliance_status),
        rate_row(CheckKind::Leaver, &results.leavers, |row| row.compliance_status),
        ComplianceSummaryRow {
            check: CheckKind::Idle,
            total_checked: idle.len(),
            detail: ComplianceDetail::Idle {
                over_threshold,
                by_system: PerSystem::from_fn(|system| {
                    idle.iter()
                        .filter(|row| row.idle_systems.contains(&system))
                        .count()
                }),
            },
        },
        ComplianceSummaryRow {
            check: CheckKind::SystemUser,
            total_checked: system_users.len(),
            detail: ComplianceDetail::SystemUsers {
                human_format,
                system_format: system_users.len() - human_format,
                by_system: PerSystem::from_fn(|system| {
                    system_users
                        .iter()
                        .filter(|row| row.source_system == system)
                        .count()
                }),
            },
        },
    ]
}

/// All three aggregates of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summaries {
    pub hr: Vec<HrSummaryRow>,
    pub systems: Vec<SystemSummaryRow>,
    pub compliance: Vec<ComplianceSummaryRow>,
}

impl Summaries {
    pub fn build(snapshot: &SourceSnapshot, results: &CheckResults) -> Self {
        let indexes = SystemIndexes::from_snapshot(snapshot);
        Summaries {
            hr: hr_summary(snapshot, &results.fiscal_year),
            systems: system_summary(&indexes),
            compliance: compliance_summary(results),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::*;
    use crate::checks::ComplianceInspector;
    use crate::diagnostics::CollectingDiagnostics;
    use pretty_assertions::assert_eq;

    fn snapshot() -> SourceSnapshot {
        let mut contractor = employee("raj.rao@x.com", date(2024, 7, 1), None);
        contractor.employee_type = "Contractor".to_string();

        SourceSnapshot {
            employees: Some(vec![
                employee("jane.doe@x.com", date(2024, 6, 1), None),
                contractor,
                employee("old.timer@x.com", date(2019, 1, 1), date(2024, 6, 1)),
            ]),
            okta: Some(vec![
                okta("jane.doe@x.com", "ACTIVE", date(2024, 5, 1), date(2024, 6, 1)),
                okta("old.timer@x.com", "ACTIVE", None, date(2024, 6, 10)),
                okta("svc-ci@x.com", "SUSPENDED", None, None),
            ]),
            slack: Some(vec![
                slack("jane.doe@x.com", None, date(2024, 9, 30), None),
                slack("bot@x.com", None, None, date(2024, 2, 1)),
            ]),
            gws: Some(vec![
                gws("jane.doe@x.com", "ACTIVE", date(2024, 9, 30)),
                gws("room.booking@x.com", "SUSPENDED", None),
            ]),
        }
    }

    fn results(snapshot: &SourceSnapshot) -> CheckResults {
        ComplianceInspector::new(at(2024, 10, 1), fy2024())
            .inspect(snapshot, &CollectingDiagnostics::new())
            .unwrap()
    }

    #[test]
    fn test_hr_summary_groups_by_first_appearance() {
        let snapshot = snapshot();
        let rows = hr_summary(&snapshot, &fy2024());

        assert_eq!(
            rows,
            vec![
                HrSummaryRow {
                    employee_type: "Full Time".to_string(),
                    new_joiners: 1,
                    active_employees: 1,
                    terminated_users: 1,
                },
                HrSummaryRow {
                    employee_type: "Contractor".to_string(),
                    new_joiners: 1,
                    active_employees: 1,
                    terminated_users: 0,
                },
            ]
        );
    }

    #[test]
    fn test_system_summary_uses_per_system_active_rules() {
        let snapshot = snapshot();
        let indexes = SystemIndexes::from_snapshot(&snapshot);
        let rows = system_summary(&indexes);

        let counts: Vec<(System, usize, usize, usize)> = rows
            .iter()
            .map(|r| (r.system, r.total_users, r.active_users, r.inactive_users))
            .collect();
        assert_eq!(
            counts,
            vec![
                (System::Okta, 3, 2, 1),
                (System::Slack, 2, 1, 1),
                (System::Gws, 2, 1, 1),
            ]
        );
    }

    #[test]
    fn test_okta_without_status_column_counts_everyone_active() {
        let mut unstated = okta("a@x.com", "ACTIVE", None, None);
        unstated.status = None;
        unstated.status_exported = false;
        let mut other = unstated.clone();
        other.email = "b@x.com".to_string();
        let snapshot = SourceSnapshot {
            employees: Some(vec![]),
            okta: Some(vec![unstated, other]),
            ..SourceSnapshot::default()
        };

        let rows = system_summary(&SystemIndexes::from_snapshot(&snapshot));

        assert_eq!(
            (rows[0].system, rows[0].total_users, rows[0].active_users, rows[0].inactive_users),
            (System::Okta, 2, 2, 0)
        );
    }

    #[test]
    fn test_missing_system_reports_zero_totals() {
        let snapshot = SourceSnapshot {
            employees: Some(vec![]),
            ..SourceSnapshot::default()
        };
        let rows = system_summary(&SystemIndexes::from_snapshot(&snapshot));
        assert!(rows.iter().all(|row| row.total_users == 0 && row.active_users == 0));
    }

    #[test]
    fn test_compliance_summary_rows() {
        let snapshot = snapshot();
        let summaries = Summaries::build(&snapshot, &results(&snapshot));
        let compliance = &summaries.compliance;

        // jane.doe joined 2024-06-01 with Okta created 2024-05-01
        assert_eq!(compliance[0].check_type(), "New Joiner Access");
        assert_eq!(compliance[0].total_checked, 2);
        assert_eq!(compliance[0].non_compliant(), Some(1));
        assert_eq!(compliance[0].compliance_rate().unwrap().to_string(), "50.0%");

        // old.timer logged in after exit
        assert_eq!(compliance[1].total_checked, 1);
        assert_eq!(compliance[1].compliance_rate().unwrap().to_string(), "0.0%");

        // jane.doe: Okta idle 122 days, the other systems fresh
        assert_eq!(compliance[2].total_checked, 2);
        match &compliance[2].detail {
            ComplianceDetail::Idle {
                over_threshold,
                by_system,
            } => {
                assert_eq!(over_threshold, &vec![(45, 1), (90, 1), (120, 1)]);
                assert_eq!(by_system, &PerSystem { okta: 1, slack: 0, gws: 0 });
            }
            other => panic!("unexpected detail: {other:?}"),
        }

        // svc-ci is suspended, bot is deactivated; only room.booking remains
        assert_eq!(compliance[3].total_checked, 1);
        match &compliance[3].detail {
            ComplianceDetail::SystemUsers {
                human_format,
                system_format,
                by_system,
            } => {
                assert_eq!((*human_format, *system_format), (1, 0));
                assert_eq!(by_system, &PerSystem { okta: 0, slack: 0, gws: 1 });
            }
            other => panic!("unexpected detail: {other:?}"),
        }
    }

    #[test]
    fn test_zero_checked_rate_is_unavailable() {
        let rate = ComplianceRate::from_counts(0, 0);
        assert!(!rate.is_available());
        assert_eq!(rate.to_string(), "N/A");
        assert_eq!(ComplianceRate::from_counts(40, 1).to_string(), "97.5%");
    }
}
