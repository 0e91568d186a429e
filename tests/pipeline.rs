use access_review::{
    write_report, AccessReview, ActionItem, CollectingDiagnostics, ComplianceDetail,
    ComplianceStatus, Level, PerSystem, ReviewConfig, ReviewError, SourceKind, System,
};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const DARWINBOX: &str = "\
Employee Name,Official Email ID,Employee Type,Date Of Joining,Date Of Exit,Employment Status
Jane Doe,jane.doe@acme.io,Full Time,2024-06-01,,Active
Raj Rao,raj.rao@acme.io,Contractor,15/07/2024,NA,Active
Old Timer,old.timer@acme.io,Full Time,10-01-2019,01-06-2024,Exited
Sam Lee,sam.lee@acme.io,Full Time,2022-02-01,,Active
";

const OKTA: &str = "\
user.email,user.status,user.created,user.lastLogin
jane.doe@acme.io,ACTIVE,2024-05-01T10:00:00.000Z,2024-09-30T08:00:00.000Z
old.timer@acme.io,ACTIVE,2019-01-10T00:00:00.000Z,2024-06-10T08:00:00.000Z
sam.lee@acme.io,ACTIVE,2022-02-01T00:00:00.000Z,2024-05-20T08:00:00.000Z
svc-ci@acme.io,ACTIVE,2023-01-01T00:00:00.000Z,Never logged in
ghost.user@acme.io,SUSPENDED,2023-01-01T00:00:00.000Z,
";

const SLACK: &str = "\
Email,Account type,Account created (UTC),Last active (UTC),Deactivated date (UTC)
jane.doe@acme.io,Member,2024-06-01 09:00:00,2024-09-30 10:00:00,
former.bot@acme.io,Bot,2023-01-01 00:00:00,2023-05-01 00:00:00,2023-06-01 00:00:00
";

const GWS: &str = "\
Email Address [Required],Status [READ ONLY],Last Sign In [READ ONLY]
jane.doe@acme.io,Active,2024/09/30 10:15:00
room.booking@acme.io,Suspended,Never logged in
";

fn write_exports(dir: &Path, with_hr: bool) {
    if with_hr {
        fs::write(dir.join("darwinbox.csv"), DARWINBOX).unwrap();
    }
    fs::write(dir.join("okta.csv"), OKTA).unwrap();
    fs::write(dir.join("slack.csv"), SLACK).unwrap();
    fs::write(dir.join("gws.csv"), GWS).unwrap();
}

fn config(data: &TempDir, output: &TempDir) -> ReviewConfig {
    ReviewConfig {
        data_dir: data.path().to_path_buf(),
        output_dir: output.path().to_path_buf(),
        as_of: NaiveDate::from_ymd_opt(2024, 10, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0),
        ..ReviewConfig::default()
    }
}

#[test]
fn test_full_review_from_csv_exports() {
    let data = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_exports(data.path(), true);

    let report = AccessReview::run(
        config(&data, &output),
        Arc::new(CollectingDiagnostics::new()),
    )
    .unwrap();

    // Joiners: jane was provisioned a month early, raj has no accounts yet
    let joiners = &report.results.joiners;
    assert_eq!(joiners.len(), 2);
    assert_eq!(joiners[0].employee.email, "jane.doe@acme.io");
    assert_eq!(joiners[0].action_item, ActionItem::Investigate);
    assert_eq!(joiners[1].compliance_status, ComplianceStatus::Compliant);

    // Leaver: still ACTIVE in Okta and used it after exit
    let leavers = &report.results.leavers;
    assert_eq!(leavers.len(), 1);
    assert_eq!(leavers[0].action_item, ActionItem::Revoke);

    // Idle: sam has not signed in to Okta since May
    let idle = &report.results.idle_users;
    assert_eq!(idle.len(), 3);
    let sam = idle
        .iter()
        .find(|row| row.employee.email == "sam.lee@acme.io")
        .unwrap();
    assert_eq!(sam.action_item, ActionItem::Disable);
    assert_eq!(sam.days_idle.okta, Some(134));

    // Orphans: the CI account and the shared mailbox; the deactivated bot is dropped
    let orphans: Vec<(&str, System, ActionItem)> = report
        .results
        .system_users
        .iter()
        .map(|row| (row.email.as_str(), row.source_system, row.action_item))
        .collect();
    assert_eq!(
        orphans,
        vec![
            ("svc-ci@acme.io", System::Okta, ActionItem::NoActionRequired),
            ("room.booking@acme.io", System::Gws, ActionItem::Investigate),
        ]
    );
    assert_eq!(report.results.system_users[1].status, "SUSPENDED");

    let systems: Vec<(System, usize, usize)> = report
        .summaries
        .systems
        .iter()
        .map(|row| (row.system, row.total_users, row.active_users))
        .collect();
    assert_eq!(
        systems,
        vec![(System::Okta, 5, 4), (System::Slack, 2, 1), (System::Gws, 2, 1)]
    );

    let compliance = &report.summaries.compliance;
    assert_eq!(compliance[0].compliance_rate().unwrap().to_string(), "50.0%");
    assert_eq!(compliance[1].compliance_rate().unwrap().to_string(), "0.0%");
    match &compliance[3].detail {
        ComplianceDetail::SystemUsers {
            human_format,
            system_format,
            by_system,
        } => {
            assert_eq!((*human_format, *system_format), (1, 1));
            assert_eq!(by_system, &PerSystem { okta: 1, slack: 0, gws: 1 });
        }
        other => panic!("unexpected detail: {other:?}"),
    }

    // Parsed passthrough keeps canonical dates
    let parsed_hr = report.parsed.get(SourceKind::Darwinbox).unwrap();
    let raj = parsed_hr.row(1).unwrap();
    assert_eq!(raj.text("Date Of Joining"), Some("15-07-2024".to_string()));
    assert_eq!(parsed_hr.columns[0], "Source System");
}

#[test]
fn test_report_directory_contents() {
    let data = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_exports(data.path(), true);

    let report = AccessReview::run(
        config(&data, &output),
        Arc::new(CollectingDiagnostics::new()),
    )
    .unwrap();
    let dir = write_report(&report, output.path()).unwrap();

    assert_eq!(dir, output.path().join("user-inspector-report-0110"));
    for name in [
        "summary_hr.csv",
        "summary_systems.csv",
        "summary_compliance.csv",
        "joiner_details.csv",
        "leaver_details.csv",
        "idle_user_details.csv",
        "system_user_details.csv",
        "parsed_darwinbox.csv",
        "parsed_okta.csv",
        "parsed_slack.csv",
        "parsed_gws.csv",
        "report.json",
    ] {
        assert!(dir.join(name).is_file(), "missing {name}");
    }

    let mut rdr = csv::Reader::from_path(dir.join("summary_compliance.csv")).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[0], "Check Type");
    assert!(headers.iter().any(|h| h == "Idle >45 Days"));
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(&rows[0][0], "New Joiner Access");
    assert_eq!(
        &rows[0][1],
        "whether new joiners have got access prior to date of joining"
    );
    assert_eq!(&rows[0][4], "50.0%");

    let mut rdr = csv::Reader::from_path(dir.join("joiner_details.csv")).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert!(headers.iter().any(|h| h == "okta_created_date"));
    let first = rdr.records().next().unwrap().unwrap();
    assert_eq!(&first[0], "jane.doe@acme.io");

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("report.json")).unwrap()).unwrap();
    assert!(json["run_id"].is_string());
    assert_eq!(json["fiscal_year"]["start"], "2024-04-01");
}

#[test]
fn test_missing_hr_export_fails_the_run() {
    let data = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_exports(data.path(), false);
    let sink = Arc::new(CollectingDiagnostics::new());

    let err = AccessReview::run(config(&data, &output), sink.clone()).unwrap_err();

    assert!(matches!(err, ReviewError::CheckFailed { check: "joiner", .. }));
    assert!(err.is_structural());
    assert!(sink
        .at_least(Level::Warning)
        .iter()
        .any(|d| d.message.contains("No file found for darwinbox")));
}

#[test]
fn test_unparseable_dates_are_reported_not_fatal() {
    let data = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_exports(data.path(), false);
    fs::write(
        data.path().join("darwinbox.csv"),
        "Official Email ID,Employee Type,Date Of Joining,Date Of Exit\n\
         jane.doe@acme.io,Full Time,someday soon,\n",
    )
    .unwrap();

    let report = AccessReview::run(
        config(&data, &output),
        Arc::new(CollectingDiagnostics::new()),
    )
    .unwrap();

    assert!(report.results.joiners.is_empty());
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.level == Level::Warning && d.message.contains("someday soon")));
}
