// 🔎 Identity Index - Email lookups across the account systems
// Keys are exact strings: no case folding, first record wins on duplicates

use crate::sources::{EmployeeRecord, SourceSnapshot, System, SystemAccount};
use std::collections::{HashMap, HashSet};

// ============================================================================
// PER-SYSTEM INDEX
// ============================================================================

pub struct IdentityIndex<'a> {
    system: System,
    /// Every account in export order, including shadowed duplicates
    accounts: Vec<&'a dyn SystemAccount>,
    by_email: HashMap<&'a str, &'a dyn SystemAccount>,
    loaded: bool,
}

impl<'a> IdentityIndex<'a> {
    /// Index a system's accounts; `None` means the source was not loaded
    pub fn build<T: SystemAccount>(system: System, accounts: Option<&'a [T]>) -> Self {
        let mut index = IdentityIndex {
            system,
            accounts: Vec::new(),
            by_email: HashMap::new(),
            loaded: accounts.is_some(),
        };

        for account in accounts.unwrap_or_default() {
            let account: &'a dyn SystemAccount = account;
            index.accounts.push(account);
            if account.email().is_empty() {
                continue;
            }
            index.by_email.entry(account.email()).or_insert(account);
        }

        index
    }

    pub fn system(&self) -> System {
        self.system
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn lookup(&self, email: &str) -> Option<&'a dyn SystemAccount> {
        self.by_email.get(email).copied()
    }

    pub fn contains(&self, email: &str) -> bool {
        self.by_email.contains_key(email)
    }

    /// Rows in the export, duplicates included
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn accounts(&self) -> impl Iterator<Item = &'a dyn SystemAccount> + '_ {
        self.accounts.iter().copied()
    }

    /// Accounts whose email is absent from HR, one per email, in export order.
    ///
    /// `keep` filters accounts before the diff; an email whose first surviving
    /// row is filtered out can still be represented by a later row.
    pub fn orphans<F>(&self, hr: &HrEmails<'_>, keep: F) -> Vec<&'a dyn SystemAccount>
    where
        F: Fn(&dyn SystemAccount) -> bool,
    {
        let mut seen: HashSet<&str> = HashSet::new();
        self.accounts
            .iter()
            .copied()
            .filter(|account| !account.email().is_empty())
            .filter(|account| keep(*account))
            .filter(|account| !hr.contains(account.email()))
            .filter(|account| seen.insert(account.email()))
            .collect()
    }

    /// Like [`orphans`](Self::orphans), but `keep` judges only the first row of
    /// each email, so a filtered-out first row also hides its later duplicates.
    pub fn first_row_orphans<F>(&self, hr: &HrEmails<'_>, keep: F) -> Vec<&'a dyn SystemAccount>
    where
        F: Fn(&dyn SystemAccount) -> bool,
    {
        let mut seen: HashSet<&str> = HashSet::new();
        self.accounts
            .iter()
            .copied()
            .filter(|account| !account.email().is_empty())
            .filter(|account| !hr.contains(account.email()))
            .filter(|account| seen.insert(account.email()))
            .filter(|account| keep(*account))
            .collect()
    }
}

// ============================================================================
// HR EMAIL SET
// ============================================================================

pub struct HrEmails<'a> {
    emails: HashSet<&'a str>,
}

impl<'a> HrEmails<'a> {
    pub fn from_employees(employees: &'a [EmployeeRecord]) -> Self {
        HrEmails {
            emails: employees
                .iter()
                .map(|employee| employee.email.as_str())
                .filter(|email| !email.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(email)
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

// ============================================================================
// ALL SYSTEMS
// ============================================================================

pub struct SystemIndexes<'a> {
    okta: IdentityIndex<'a>,
    slack: IdentityIndex<'a>,
    gws: IdentityIndex<'a>,
}

impl<'a> SystemIndexes<'a> {
    pub fn from_snapshot(snapshot: &'a SourceSnapshot) -> Self {
        SystemIndexes {
            okta: IdentityIndex::build(System::Okta, snapshot.okta.as_deref()),
            slack: IdentityIndex::build(System::Slack, snapshot.slack.as_deref()),
            gws: IdentityIndex::build(System::Gws, snapshot.gws.as_deref()),
        }
    }

    pub fn get(&self, system: System) -> &IdentityIndex<'a> {
        match system {
            System::Okta => &self.okta,
            System::Slack => &self.slack,
            System::Gws => &self.gws,
        }
    }

    /// Indexes in evaluation order: Okta, Slack, GWS
    pub fn iter(&self) -> impl Iterator<Item = &IdentityIndex<'a>> {
        System::ALL.into_iter().map(move |system| self.get(system))
    }
}
