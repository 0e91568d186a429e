// 📣 Diagnostics - Injected sink for non-fatal findings
// Components receive an Arc<dyn Diagnostics> instead of reaching for a global logger

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

// ============================================================================
// DIAGNOSTIC EVENT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: Level,
    /// Pipeline stage that emitted the event ("load", "normalize", "joiner", ...)
    pub stage: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(level: Level, stage: &str, message: impl Into<String>) -> Self {
        Diagnostic {
            level,
            stage: stage.to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// SINKS
// ============================================================================

pub trait Diagnostics: Send + Sync {
    fn record(&self, diagnostic: Diagnostic);

    fn info(&self, stage: &str, message: String) {
        self.record(Diagnostic::new(Level::Info, stage, message));
    }

    fn warn(&self, stage: &str, message: String) {
        self.record(Diagnostic::new(Level::Warning, stage, message));
    }

    fn error(&self, stage: &str, message: String) {
        self.record(Diagnostic::new(Level::Error, stage, message));
    }
}

/// Forwards every event to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, diagnostic: Diagnostic) {
        let stage = diagnostic.stage.as_str();
        match diagnostic.level {
            Level::Info => tracing::info!(stage, "{}", diagnostic.message),
            Level::Warning => tracing::warn!(stage, "{}", diagnostic.message),
            Level::Error => tracing::error!(stage, "{}", diagnostic.message),
        }
    }
}

/// Buffers events in memory
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    events: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Events at or above `level`
    pub fn at_least(&self, level: Level) -> Vec<Diagnostic> {
        self.events()
            .into_iter()
            .filter(|d| d.level >= level)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn record(&self, diagnostic: Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push(diagnostic);
        }
    }
}

/// Sends each event to every inner sink, in order
pub struct FanoutDiagnostics {
    sinks: Vec<Arc<dyn Diagnostics>>,
}

impl FanoutDiagnostics {
    pub fn new(sinks: Vec<Arc<dyn Diagnostics>>) -> Self {
        FanoutDiagnostics { sinks }
    }
}

impl Diagnostics for FanoutDiagnostics {
    fn record(&self, diagnostic: Diagnostic) {
        for sink in &self.sinks {
            sink.record(diagnostic.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_diagnostics_filters_by_level() {
        let sink = CollectingDiagnostics::new();
        sink.info("load", "loaded okta".to_string());
        sink.warn("normalize", "Could not parse date: soon".to_string());
        sink.error("joiner", "boom".to_string());

        assert_eq!(sink.len(), 3);
        let warnings = sink.at_least(Level::Warning);
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].stage, "normalize");
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let a = Arc::new(CollectingDiagnostics::new());
        let b = Arc::new(CollectingDiagnostics::new());
        let sinks: Vec<Arc<dyn Diagnostics>> = vec![a.clone(), b.clone(), Arc::new(TracingDiagnostics)];
        let fanout = FanoutDiagnostics::new(sinks);

        fanout.warn("idle", "okta table missing".to_string());

        assert_eq!(a.len(), 1);
        assert_eq!(b.events(), a.events());
    }
}
