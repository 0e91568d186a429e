// 📝 Report Writer - CSV sheets plus a JSON dump of the whole run

use crate::checks::{IdleRow, JoinerRow, LeaverRow, PerSystem, SystemUserRow};
use crate::dates::CanonicalDate;
use crate::error::{ReviewError, ReviewResult};
use crate::review::ReviewReport;
use crate::sources::{darwinbox, EmployeeRecord, SourceTables, System};
use crate::summary::{ComplianceDetail, ComplianceSummaryRow};
use std::fs;
use std::path::{Path, PathBuf};

pub const REPORT_JSON: &str = "report.json";

/// `<output_dir>/user-inspector-report-DDMM`
pub fn report_dir(output_dir: &Path, report: &ReviewReport) -> PathBuf {
    output_dir.join(format!(
        "user-inspector-report-{}",
        report.evaluated_at.format("%d%m")
    ))
}

/// Write every sheet and the JSON dump; returns the report directory
pub fn write_report(report: &ReviewReport, output_dir: &Path) -> ReviewResult<PathBuf> {
    let dir = report_dir(output_dir, report);
    fs::create_dir_all(&dir).map_err(|e| ReviewError::io(&dir, e))?;

    write_summary_sheets(report, &dir)?;
    write_detail_sheets(report, &dir)?;
    write_parsed_tables(&report.parsed, &dir)?;

    let json_path = dir.join(REPORT_JSON);
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&json_path, json).map_err(|e| ReviewError::io(&json_path, e))?;

    Ok(dir)
}

/// One `parsed_<source>.csv` per loaded source
pub fn write_parsed_tables(tables: &SourceTables, dir: &Path) -> ReviewResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| ReviewError::io(dir, e))?;

    let mut written = Vec::new();
    for (kind, table) in tables.iter() {
        let path = dir.join(format!("parsed_{}.csv", kind.file_stem()));
        write_csv(
            &path,
            &table.columns,
            table
                .rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect()),
        )?;
        written.push(path);
    }
    Ok(written)
}

fn write_csv<H, I>(path: &Path, headers: &[H], records: I) -> ReviewResult<()>
where
    H: AsRef<str>,
    I: IntoIterator<Item = Vec<String>>,
{
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(headers.iter().map(|h| h.as_ref()))?;
    for record in records {
        wtr.write_record(&record)?;
    }
    wtr.flush().map_err(|e| ReviewError::io(path, e))?;
    Ok(())
}

// ============================================================================
// CELL RENDERING
// ============================================================================

fn date(value: Option<CanonicalDate>) -> String {
    value.map(|d| d.to_string()).unwrap_or_default()
}

fn text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn per_system_headers(suffix: &str) -> Vec<String> {
    System::ALL
        .iter()
        .map(|system| format!("{}_{}", system.key(), suffix))
        .collect()
}

fn per_system_dates(values: &PerSystem<Option<CanonicalDate>>) -> Vec<String> {
    values.iter().map(|(_, value)| date(*value)).collect()
}

const EMPLOYEE_HEADERS: [&str; 5] = [
    darwinbox::EMAIL,
    darwinbox::DATE_OF_JOINING,
    darwinbox::DATE_OF_EXIT,
    darwinbox::EMPLOYEE_TYPE,
    darwinbox::EMPLOYMENT_STATUS,
];

fn employee_cells(employee: &EmployeeRecord) -> Vec<String> {
    vec![
        employee.email.clone(),
        date(employee.date_of_joining),
        date(employee.date_of_exit),
        employee.employee_type.clone(),
        text(employee.employment_status.as_deref()),
    ]
}

fn headers(parts: Vec<Vec<String>>) -> Vec<String> {
    parts.into_iter().flatten().collect()
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

// ============================================================================
// DETAIL SHEETS
// ============================================================================

fn joiner_record(row: &JoinerRow) -> Vec<String> {
    let mut cells = employee_cells(&row.employee);
    cells.extend(per_system_dates(&row.created));
    cells.push(row.compliance_status.to_string());
    cells.push(row.action_item.to_string());
    cells
}

fn leaver_record(row: &LeaverRow) -> Vec<String> {
    let mut cells = employee_cells(&row.employee);
    cells.extend(per_system_dates(&row.last_login));
    cells.extend(row.status.iter().map(|(_, status)| text(status.as_deref())));
    cells.push(row.compliance_status.to_string());
    cells.push(row.action_item.to_string());
    cells
}

fn idle_record(row: &IdleRow) -> Vec<String> {
    let mut cells = employee_cells(&row.employee);
    cells.extend(per_system_dates(&row.last_login));
    cells.extend(
        row.days_idle
            .iter()
            .map(|(_, days)| days.map(|d| d.to_string()).unwrap_or_default()),
    );
    cells.extend(row.flags.as_array().iter().map(|flag| flag.to_string()));
    cells.push(row.idle_systems_label());
    cells.push(row.compliance_status.to_string());
    cells.push(row.action_item.to_string());
    cells
}

fn system_user_record(row: &SystemUserRow) -> Vec<String> {
    vec![
        row.email.clone(),
        row.source_system.to_string(),
        row.is_human.to_string(),
        date(row.last_login),
        row.status.clone(),
        row.tracked_in_darwinbox.to_string(),
        row.compliance_status.to_string(),
        row.action_item.to_string(),
    ]
}

fn write_detail_sheets(report: &ReviewReport, dir: &Path) -> ReviewResult<()> {
    let results = &report.results;
    let verdict = owned(&["compliance_status", "action_item"]);

    write_csv(
        &dir.join("joiner_details.csv"),
        &headers(vec![
            owned(&EMPLOYEE_HEADERS),
            per_system_headers("created_date"),
            verdict.clone(),
        ]),
        results.joiners.iter().map(joiner_record),
    )?;

    write_csv(
        &dir.join("leaver_details.csv"),
        &headers(vec![
            owned(&EMPLOYEE_HEADERS),
            per_system_headers("last_login"),
            per_system_headers("status"),
            verdict.clone(),
        ]),
        results.leavers.iter().map(leaver_record),
    )?;

    let idle_flags = results
        .idle_thresholds
        .tiers()
        .iter()
        .map(|days| format!("idle_{}_days", days))
        .collect();
    write_csv(
        &dir.join("idle_user_details.csv"),
        &headers(vec![
            owned(&EMPLOYEE_HEADERS),
            per_system_headers("last_login"),
            per_system_headers("days_idle"),
            idle_flags,
            owned(&["idle_systems"]),
            verdict,
        ]),
        results.idle_users.iter().map(idle_record),
    )?;

    write_csv(
        &dir.join("system_user_details.csv"),
        &[
            "Email",
            "Source System",
            "is_human_user?",
            "Last Login",
            "Status",
            "tracked_in_darwinbox",
            "compliance_status",
            "Action Item",
        ],
        results.system_users.iter().map(system_user_record),
    )?;

    Ok(())
}

// ============================================================================
// SUMMARY SHEETS
// ============================================================================

fn compliance_record(row: &ComplianceSummaryRow) -> Vec<String> {
    let count = |n: usize| n.to_string();
    let blank = String::new;

    let (non_compliant, rate) = match &row.detail {
        ComplianceDetail::Rate {
            non_compliant,
            compliance_rate,
        } => (count(*non_compliant), compliance_rate.to_string()),
        _ => (blank(), blank()),
    };
    let tiers: Vec<String> = match &row.detail {
        ComplianceDetail::Idle { over_threshold, .. } => {
            over_threshold.iter().map(|(_, n)| count(*n)).collect()
        }
        _ => vec![blank(), blank(), blank()],
    };
    let (human, system) = match &row.detail {
        ComplianceDetail::SystemUsers {
            human_format,
            system_format,
            ..
        } => (count(*human_format), count(*system_format)),
        _ => (blank(), blank()),
    };
    let by_system: Vec<String> = match row.by_system() {
        Some(by_system) => by_system.iter().map(|(_, n)| count(*n)).collect(),
        None => vec![blank(), blank(), blank()],
    };

    let mut cells = vec![
        row.check_type().to_string(),
        row.description().to_string(),
        count(row.total_checked),
        non_compliant,
        rate,
    ];
    cells.extend(tiers);
    cells.push(human);
    cells.push(system);
    cells.extend(by_system);
    cells
}

fn write_summary_sheets(report: &ReviewReport, dir: &Path) -> ReviewResult<()> {
    let summaries = &report.summaries;

    write_csv(
        &dir.join("summary_hr.csv"),
        &["Employee Type", "New Joiners", "Active Employees", "Terminated Users"],
        summaries.hr.iter().map(|row| {
            vec![
                row.employee_type.clone(),
                row.new_joiners.to_string(),
                row.active_employees.to_string(),
                row.terminated_users.to_string(),
            ]
        }),
    )?;

    write_csv(
        &dir.join("summary_systems.csv"),
        &["System", "Total Users", "Active Users", "Inactive Users"],
        summaries.systems.iter().map(|row| {
            vec![
                row.system.to_string(),
                row.total_users.to_string(),
                row.active_users.to_string(),
                row.inactive_users.to_string(),
            ]
        }),
    )?;

    let mut compliance_headers = owned(&[
        "Check Type",
        "description",
        "Total Checked",
        "Non Compliant",
        "Compliance Rate",
    ]);
    compliance_headers.extend(
        report
            .results
            .idle_thresholds
            .tiers()
            .iter()
            .map(|days| format!("Idle >{} Days", days)),
    );
    compliance_headers.extend(owned(&["Human Format", "System Format"]));
    compliance_headers.extend(System::ALL.iter().map(|system| system.name().to_string()));

    write_csv(
        &dir.join("summary_compliance.csv"),
        &compliance_headers,
        summaries.compliance.iter().map(compliance_record),
    )?;

    Ok(())
}
