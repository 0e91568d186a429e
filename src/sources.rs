// 🗂️ Source Schemas - Typed records for the four exports
// Column names are checked once at the load boundary; classification only sees typed fields

use crate::dates::{CanonicalDate, DateNormalizer, DateOutcome};
use crate::diagnostics::Diagnostics;
use crate::error::{ReviewError, ReviewResult};
use crate::table::{RawTable, RawValue, RowView};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// SOURCE KINDS
// ============================================================================

/// The four fixed inputs: the HR system of record plus three account systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Darwinbox,
    Gws,
    Okta,
    Slack,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Darwinbox,
        SourceKind::Gws,
        SourceKind::Okta,
        SourceKind::Slack,
    ];

    /// File stem the loader looks for ("okta" → okta.xlsx / okta.csv)
    pub fn file_stem(&self) -> &'static str {
        match self {
            SourceKind::Darwinbox => "darwinbox",
            SourceKind::Gws => "gws",
            SourceKind::Okta => "okta",
            SourceKind::Slack => "slack",
        }
    }

    pub fn system(&self) -> Option<System> {
        match self {
            SourceKind::Darwinbox => None,
            SourceKind::Gws => Some(System::Gws),
            SourceKind::Okta => Some(System::Okta),
            SourceKind::Slack => Some(System::Slack),
        }
    }

    pub fn schema(&self) -> &'static SourceSchema {
        match self {
            SourceKind::Darwinbox => &DARWINBOX_SCHEMA,
            SourceKind::Gws => &GWS_SCHEMA,
            SourceKind::Okta => &OKTA_SCHEMA,
            SourceKind::Slack => &SLACK_SCHEMA,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// External account systems, in the fixed evaluation order of every check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum System {
    Okta,
    Slack,
    #[serde(rename = "GWS")]
    Gws,
}

impl System {
    pub const ALL: [System; 3] = [System::Okta, System::Slack, System::Gws];

    /// Display name used in reports and idle-system lists
    pub fn name(&self) -> &'static str {
        match self {
            System::Okta => "Okta",
            System::Slack => "Slack",
            System::Gws => "GWS",
        }
    }

    /// Lower-case prefix for per-system report columns ("okta_last_login")
    pub fn key(&self) -> &'static str {
        match self {
            System::Okta => "okta",
            System::Slack => "slack",
            System::Gws => "gws",
        }
    }

    pub fn source(&self) -> SourceKind {
        match self {
            System::Okta => SourceKind::Okta,
            System::Slack => SourceKind::Slack,
            System::Gws => SourceKind::Gws,
        }
    }
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// COLUMN MAPS
// ============================================================================

/// Added to every parsed table
pub const SOURCE_SYSTEM_COLUMN: &str = "Source System";

pub mod darwinbox {
    pub const EMAIL: &str = "Official Email ID";
    pub const DATE_OF_JOINING: &str = "Date Of Joining";
    pub const DATE_OF_EXIT: &str = "Date Of Exit";
    pub const EMPLOYEE_TYPE: &str = "Employee Type";
    pub const EMPLOYMENT_STATUS: &str = "Employment Status";
}

pub mod gws {
    pub const EMAIL: &str = "Email Address [Required]";
    /// The console export has no creation date; this column also fills the creation role
    pub const LAST_SIGN_IN: &str = "Last Sign In [READ ONLY]";
    pub const STATUS: &str = "Status [READ ONLY]";
}

pub mod okta {
    pub const EMAIL: &str = "user.email";
    pub const SECOND_EMAIL: &str = "user.secondEmail";
    pub const LAST_UPDATE: &str = "user.lastUpdate";
    pub const CREATED: &str = "user.created";
    pub const ACTIVATION: &str = "user.activation";
    pub const STATUS_CHANGE: &str = "user.statusChange";
    pub const LAST_LOGIN: &str = "user.lastLogin";
    pub const STATUS: &str = "user.status";
}

pub mod slack {
    pub const EMAIL: &str = "Email";
    pub const CREATED: &str = "Account created (UTC)";
    pub const LAST_ACTIVE: &str = "Last active (UTC)";
    pub const DEACTIVATED: &str = "Deactivated date (UTC)";
    pub const ACCOUNT_TYPE: &str = "Account type";
}

#[derive(Debug)]
pub struct SourceSchema {
    pub kind: SourceKind,
    pub email_columns: &'static [&'static str],
    pub date_columns: &'static [&'static str],
    pub status_columns: &'static [&'static str],
    /// Columns whose absence is a structural error
    pub required_columns: &'static [&'static str],
}

pub static DARWINBOX_SCHEMA: SourceSchema = SourceSchema {
    kind: SourceKind::Darwinbox,
    email_columns: &[darwinbox::EMAIL],
    date_columns: &[darwinbox::DATE_OF_JOINING, darwinbox::DATE_OF_EXIT],
    status_columns: &[darwinbox::EMPLOYEE_TYPE, darwinbox::EMPLOYMENT_STATUS],
    required_columns: &[
        darwinbox::EMAIL,
        darwinbox::DATE_OF_JOINING,
        darwinbox::DATE_OF_EXIT,
        darwinbox::EMPLOYEE_TYPE,
    ],
};

pub static GWS_SCHEMA: SourceSchema = SourceSchema {
    kind: SourceKind::Gws,
    email_columns: &[gws::EMAIL],
    date_columns: &[gws::LAST_SIGN_IN],
    status_columns: &[gws::STATUS],
    required_columns: &[gws::EMAIL, gws::LAST_SIGN_IN],
};

pub static OKTA_SCHEMA: SourceSchema = SourceSchema {
    kind: SourceKind::Okta,
    email_columns: &[okta::EMAIL, okta::SECOND_EMAIL],
    date_columns: &[
        okta::LAST_UPDATE,
        okta::CREATED,
        okta::ACTIVATION,
        okta::STATUS_CHANGE,
        okta::LAST_LOGIN,
    ],
    status_columns: &[okta::STATUS],
    required_columns: &[okta::EMAIL, okta::CREATED, okta::LAST_LOGIN],
};

pub static SLACK_SCHEMA: SourceSchema = SourceSchema {
    kind: SourceKind::Slack,
    email_columns: &[slack::EMAIL],
    date_columns: &[slack::CREATED, slack::LAST_ACTIVE, slack::DEACTIVATED],
    status_columns: &[slack::ACCOUNT_TYPE],
    required_columns: &[slack::EMAIL, slack::CREATED, slack::LAST_ACTIVE, slack::DEACTIVATED],
};

impl SourceSchema {
    pub fn validate(&self, table: &RawTable) -> ReviewResult<()> {
        match self
            .required_columns
            .iter()
            .copied()
            .find(|column| !table.has_column(column))
        {
            Some(column) => Err(ReviewError::MissingColumn {
                table: self.kind,
                column,
            }),
            None => Ok(()),
        }
    }

    /// Source System, emails, dates, statuses; the rest keep their order
    pub fn priority_columns(&self) -> Vec<&'static str> {
        let mut columns = vec![SOURCE_SYSTEM_COLUMN];
        columns.extend_from_slice(self.email_columns);
        columns.extend_from_slice(self.date_columns);
        columns.extend_from_slice(self.status_columns);
        columns
    }

    /// Rewrite one raw export into its parsed form: canonical dates, source column, column order
    pub fn normalize_table(
        &self,
        mut table: RawTable,
        normalizer: &DateNormalizer,
        diagnostics: &dyn Diagnostics,
    ) -> RawTable {
        table.add_constant_column(
            SOURCE_SYSTEM_COLUMN,
            RawValue::Text(self.kind.file_stem().to_string()),
        );

        if self.kind == SourceKind::Gws {
            table.map_column(gws::STATUS, |value| match value.text() {
                Some(status) => RawValue::Text(status.to_uppercase()),
                None => RawValue::Empty,
            });
        }

        for column in self.date_columns {
            if !table.has_column(column) {
                continue;
            }
            diagnostics.info(
                "normalize",
                format!("Parsing dates for column: {} in {}", column, self.kind),
            );

            let mut unparsed: Vec<String> = Vec::new();
            table.map_column(column, |value| match normalizer.outcome(value) {
                DateOutcome::Parsed(date) => RawValue::Text(date.to_string()),
                DateOutcome::Blank => RawValue::Empty,
                DateOutcome::Unparseable => {
                    let text = value.to_string();
                    if !unparsed.contains(&text) {
                        unparsed.push(text);
                    }
                    RawValue::Empty
                }
            });

            if !unparsed.is_empty() {
                diagnostics.warn(
                    "normalize",
                    format!("Unparsed dates in {}.{}: {:?}", self.kind, column, unparsed),
                );
            }
        }

        table.reorder_columns(&self.priority_columns());
        table
    }
}

// ============================================================================
// TYPED RECORDS
// ============================================================================

fn date_cell(row: &RowView<'_>, column: &str) -> Option<CanonicalDate> {
    row.text(column).and_then(|text| text.parse().ok())
}

/// Emails are kept exactly as exported; only blank cells collapse to ""
fn email_cell(row: &RowView<'_>, column: &str) -> String {
    let value = row.get(column);
    if value.is_empty() {
        String::new()
    } else {
        value.to_string()
    }
}

/// One row of the HR export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub email: String,
    pub date_of_joining: Option<CanonicalDate>,
    pub date_of_exit: Option<CanonicalDate>,
    pub employee_type: String,
    pub employment_status: Option<String>,
}

impl EmployeeRecord {
    pub fn from_row(row: &RowView<'_>) -> Self {
        EmployeeRecord {
            email: email_cell(row, darwinbox::EMAIL),
            date_of_joining: date_cell(row, darwinbox::DATE_OF_JOINING),
            date_of_exit: date_cell(row, darwinbox::DATE_OF_EXIT),
            employee_type: row
                .text(darwinbox::EMPLOYEE_TYPE)
                .unwrap_or_else(|| "Unknown".to_string()),
            employment_status: row.text(darwinbox::EMPLOYMENT_STATUS),
        }
    }

    /// No exit date on record
    pub fn is_active(&self) -> bool {
        self.date_of_exit.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OktaAccount {
    pub email: String,
    pub second_email: Option<String>,
    pub status: Option<String>,
    /// False when the export has no status column at all
    #[serde(default = "status_exported_default")]
    pub status_exported: bool,
    pub created: Option<CanonicalDate>,
    pub activated: Option<CanonicalDate>,
    pub status_changed: Option<CanonicalDate>,
    pub last_updated: Option<CanonicalDate>,
    pub last_login: Option<CanonicalDate>,
}

fn status_exported_default() -> bool {
    true
}

impl OktaAccount {
    pub fn from_row(row: &RowView<'_>) -> Self {
        OktaAccount {
            email: email_cell(row, okta::EMAIL),
            second_email: row.text(okta::SECOND_EMAIL),
            status: row.text(okta::STATUS),
            status_exported: row.has_column(okta::STATUS),
            created: date_cell(row, okta::CREATED),
            activated: date_cell(row, okta::ACTIVATION),
            status_changed: date_cell(row, okta::STATUS_CHANGE),
            last_updated: date_cell(row, okta::LAST_UPDATE),
            last_login: date_cell(row, okta::LAST_LOGIN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackAccount {
    pub email: String,
    pub account_type: Option<String>,
    pub created: Option<CanonicalDate>,
    pub last_active: Option<CanonicalDate>,
    pub deactivated: Option<CanonicalDate>,
}

impl SlackAccount {
    pub fn from_row(row: &RowView<'_>) -> Self {
        SlackAccount {
            email: email_cell(row, slack::EMAIL),
            account_type: row.text(slack::ACCOUNT_TYPE),
            created: date_cell(row, slack::CREATED),
            last_active: date_cell(row, slack::LAST_ACTIVE),
            deactivated: date_cell(row, slack::DEACTIVATED),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GwsAccount {
    pub email: String,
    /// Upper-cased at load
    pub status: Option<String>,
    pub last_sign_in: Option<CanonicalDate>,
}

impl GwsAccount {
    pub fn from_row(row: &RowView<'_>) -> Self {
        GwsAccount {
            email: email_cell(row, gws::EMAIL),
            status: row.text(gws::STATUS),
            last_sign_in: date_cell(row, gws::LAST_SIGN_IN),
        }
    }
}

/// Uniform view of an account in any external system
pub trait SystemAccount {
    fn system(&self) -> System;
    fn email(&self) -> &str;
    fn created(&self) -> Option<CanonicalDate>;
    fn last_login(&self) -> Option<CanonicalDate>;
    /// Status as reported per system; `None` when the export left it blank
    fn status(&self) -> Option<String>;
    /// System-specific "counts as an active account" predicate
    fn is_active(&self) -> bool;
    /// Only the messaging system records deactivation separately from status
    fn is_deactivated(&self) -> bool {
        false
    }
}

impl SystemAccount for OktaAccount {
    fn system(&self) -> System {
        System::Okta
    }
    fn email(&self) -> &str {
        &self.email
    }
    fn created(&self) -> Option<CanonicalDate> {
        self.created
    }
    fn last_login(&self) -> Option<CanonicalDate> {
        self.last_login
    }
    fn status(&self) -> Option<String> {
        self.status.clone()
    }
    /// An export without a status column counts every account as active
    fn is_active(&self) -> bool {
        !self.status_exported || self.status.as_deref() == Some("ACTIVE")
    }
}

impl SystemAccount for SlackAccount {
    fn system(&self) -> System {
        System::Slack
    }
    fn email(&self) -> &str {
        &self.email
    }
    fn created(&self) -> Option<CanonicalDate> {
        self.created
    }
    fn last_login(&self) -> Option<CanonicalDate> {
        self.last_active
    }
    fn status(&self) -> Option<String> {
        let status = if self.is_deactivated() {
            "Deactivated"
        } else {
            "Active"
        };
        Some(status.to_string())
    }
    fn is_active(&self) -> bool {
        !self.is_deactivated()
    }
    fn is_deactivated(&self) -> bool {
        self.deactivated.is_some()
    }
}

impl SystemAccount for GwsAccount {
    fn system(&self) -> System {
        System::Gws
    }
    fn email(&self) -> &str {
        &self.email
    }
    fn created(&self) -> Option<CanonicalDate> {
        self.last_sign_in
    }
    fn last_login(&self) -> Option<CanonicalDate> {
        self.last_sign_in
    }
    fn status(&self) -> Option<String> {
        self.status.clone()
    }
    fn is_active(&self) -> bool {
        self.status
            .as_deref()
            .map_or(true, |status| !status.eq_ignore_ascii_case("SUSPENDED"))
    }
}

// ============================================================================
// TABLE SETS & SNAPSHOT
// ============================================================================

/// Tables keyed by source; absent sources are simply not present
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceTables {
    tables: BTreeMap<SourceKind, RawTable>,
}

impl SourceTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: SourceKind, table: RawTable) {
        self.tables.insert(kind, table);
    }

    pub fn get(&self, kind: SourceKind) -> Option<&RawTable> {
        self.tables.get(&kind)
    }

    pub fn contains(&self, kind: SourceKind) -> bool {
        self.tables.contains_key(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceKind, &RawTable)> {
        self.tables.iter().map(|(kind, table)| (*kind, table))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Normalize every table through its schema
    pub fn normalized(self, normalizer: &DateNormalizer, diagnostics: &dyn Diagnostics) -> Self {
        let tables = self
            .tables
            .into_iter()
            .map(|(kind, table)| {
                let table = kind.schema().normalize_table(table, normalizer, diagnostics);
                (kind, table)
            })
            .collect();
        SourceTables { tables }
    }
}

/// Typed, validated view of one run's inputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceSnapshot {
    pub employees: Option<Vec<EmployeeRecord>>,
    pub okta: Option<Vec<OktaAccount>>,
    pub slack: Option<Vec<SlackAccount>>,
    pub gws: Option<Vec<GwsAccount>>,
}

fn typed_rows<T>(
    tables: &SourceTables,
    kind: SourceKind,
    build: fn(&RowView<'_>) -> T,
) -> ReviewResult<Option<Vec<T>>> {
    match tables.get(kind) {
        Some(table) => {
            kind.schema().validate(table)?;
            Ok(Some(table.iter_rows().map(|row| build(&row)).collect()))
        }
        None => Ok(None),
    }
}

impl SourceSnapshot {
    /// Validate required columns and build typed records from normalized tables
    pub fn from_tables(tables: &SourceTables) -> ReviewResult<Self> {
        Ok(SourceSnapshot {
            employees: typed_rows(tables, SourceKind::Darwinbox, EmployeeRecord::from_row)?,
            okta: typed_rows(tables, SourceKind::Okta, OktaAccount::from_row)?,
            slack: typed_rows(tables, SourceKind::Slack, SlackAccount::from_row)?,
            gws: typed_rows(tables, SourceKind::Gws, GwsAccount::from_row)?,
        })
    }

    /// The HR table every check depends on
    pub fn employees(&self) -> ReviewResult<&[EmployeeRecord]> {
        self.employees
            .as_deref()
            .ok_or(ReviewError::MissingSource {
                table: SourceKind::Darwinbox,
            })
    }
}
