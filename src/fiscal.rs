// 📅 Fiscal Year - Which joiners and leavers belong to the current review window

use crate::dates::CanonicalDate;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open window `[start, end)`, named by its starting calendar year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYear {
    start: NaiveDate,
    end: NaiveDate,
}

impl FiscalYear {
    /// The fiscal year starting on the 1st of `start_month` in `year`
    pub fn starting(year: i32, start_month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, start_month, 1)?;
        let end = NaiveDate::from_ymd_opt(year + 1, start_month, 1)?;
        Some(FiscalYear { start, end })
    }

    /// The fiscal year `today` falls in
    pub fn containing(today: NaiveDate, start_month: u32) -> Option<Self> {
        let year = if today.month() < start_month {
            today.year() - 1
        } else {
            today.year()
        };
        FiscalYear::starting(year, start_month)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// First day of the next fiscal year
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn start_year(&self) -> i32 {
        self.start.year()
    }

    pub fn contains(&self, date: CanonicalDate) -> bool {
        let date = date.date();
        self.start <= date && date < self.end
    }
}

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FY{}", self.start_year())
    }
}
