// 🔁 Access Review Pipeline - load → normalize → validate → inspect → summarize

use crate::checks::{CheckResults, ComplianceInspector};
use crate::config::ReviewConfig;
use crate::dates::DateNormalizer;
use crate::diagnostics::{CollectingDiagnostics, Diagnostic, Diagnostics, FanoutDiagnostics};
use crate::error::ReviewResult;
use crate::fiscal::FiscalYear;
use crate::loader::SourceLoader;
use crate::sources::{SourceSnapshot, SourceTables};
use crate::summary::Summaries;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Everything one run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Instant every time-dependent rule was evaluated against
    pub evaluated_at: NaiveDateTime,
    pub fiscal_year: FiscalYear,
    pub summaries: Summaries,
    pub results: CheckResults,
    /// Source tables after date normalization
    pub parsed: SourceTables,
    pub diagnostics: Vec<Diagnostic>,
}

impl ReviewReport {
    pub fn summary(&self) -> String {
        format!(
            "Access review {} for {}: {} joiners, {} leavers, {} idle checks, {} system users",
            self.run_id,
            self.fiscal_year,
            self.results.joiners.len(),
            self.results.leavers.len(),
            self.results.idle_users.len(),
            self.results.system_users.len()
        )
    }
}

pub struct AccessReview {
    config: ReviewConfig,
    diagnostics: Arc<dyn Diagnostics>,
}

impl AccessReview {
    pub fn new(config: ReviewConfig, diagnostics: Arc<dyn Diagnostics>) -> Self {
        AccessReview {
            config,
            diagnostics,
        }
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Full pipeline from the configured data folder
    pub fn run(config: ReviewConfig, diagnostics: Arc<dyn Diagnostics>) -> ReviewResult<ReviewReport> {
        AccessReview::new(config, diagnostics).execute()
    }

    /// Load and normalize only
    pub fn parse(&self) -> ReviewResult<SourceTables> {
        self.parse_with(self.diagnostics.clone())
    }

    pub fn execute(&self) -> ReviewResult<ReviewReport> {
        self.config.validate()?;

        let collected = Arc::new(CollectingDiagnostics::new());
        let sink = self.fanout(&collected);

        let tables = self.parse_with(sink.clone())?;
        self.review_tables(tables, sink, collected)
    }

    /// Run the checks over tables already in memory (already normalized)
    pub fn review(&self, tables: SourceTables) -> ReviewResult<ReviewReport> {
        let collected = Arc::new(CollectingDiagnostics::new());
        let sink = self.fanout(&collected);
        self.review_tables(tables, sink, collected)
    }

    /// Forward to the caller's sink and keep a copy for the report
    fn fanout(&self, collected: &Arc<CollectingDiagnostics>) -> Arc<dyn Diagnostics> {
        let collected: Arc<dyn Diagnostics> = collected.clone();
        Arc::new(FanoutDiagnostics::new(vec![self.diagnostics.clone(), collected]))
    }

    fn parse_with(&self, sink: Arc<dyn Diagnostics>) -> ReviewResult<SourceTables> {
        let loader = SourceLoader::new(&self.config.data_dir, sink.clone());
        let tables = loader.load_all()?;
        let normalizer = DateNormalizer::new(sink.clone());
        Ok(tables.normalized(&normalizer, sink.as_ref()))
    }

    fn review_tables(
        &self,
        tables: SourceTables,
        sink: Arc<dyn Diagnostics>,
        collected: Arc<CollectingDiagnostics>,
    ) -> ReviewResult<ReviewReport> {
        let now = self.config.now();
        let fiscal_year = self.config.fiscal_year(now)?;
        sink.info(
            "inspect",
            format!("Evaluating at {} within {}", now, fiscal_year),
        );

        let snapshot = SourceSnapshot::from_tables(&tables)?;
        let inspector = ComplianceInspector::with_policy(self.config.policy(), now, fiscal_year);
        let results = inspector.inspect(&snapshot, sink.as_ref())?;
        let summaries = Summaries::build(&snapshot, &results);

        Ok(ReviewReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            evaluated_at: now,
            fiscal_year,
            summaries,
            results,
            parsed: tables,
            diagnostics: collected.events(),
        })
    }
}
