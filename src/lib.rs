// Access Review - Core Library
// Reconciles HR lifecycle records against Okta, Slack and Google Workspace exports

pub mod checks;
pub mod config;
pub mod dates;
pub mod diagnostics;
pub mod error;
pub mod fiscal;
pub mod index;
pub mod loader;
pub mod report;
pub mod review;
pub mod sources;
pub mod summary;
pub mod table;

// Re-export commonly used types
pub use checks::{
    ActionItem, CheckKind, CheckPolicy, CheckResults, ComplianceInspector, ComplianceStatus,
    IdleFlags, IdleRow, IdleThresholds, JoinerRow, LeaverRow, PerSystem, SystemUserRow,
    is_human_email,
};
pub use config::ReviewConfig;
pub use dates::{CanonicalDate, DateNormalizer, DateOutcome, DateStrategy, DEFAULT_STRATEGIES};
pub use diagnostics::{
    CollectingDiagnostics, Diagnostic, Diagnostics, FanoutDiagnostics, Level, TracingDiagnostics,
};
pub use error::{ReviewError, ReviewResult};
pub use fiscal::FiscalYear;
pub use index::{HrEmails, IdentityIndex, SystemIndexes};
pub use loader::{CsvReader, SourceLoader, TableReader, XlsxReader};
pub use report::{write_parsed_tables, write_report};
pub use review::{AccessReview, ReviewReport};
pub use sources::{
    EmployeeRecord, GwsAccount, OktaAccount, SlackAccount, SourceKind, SourceSnapshot,
    SourceTables, System, SystemAccount,
};
pub use summary::{
    ComplianceDetail, ComplianceRate, ComplianceSummaryRow, HrSummaryRow, Summaries,
    SystemSummaryRow,
};
pub use table::{RawTable, RawValue};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
