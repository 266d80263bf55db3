//! Backend used by `--dry-run`: logs what would happen and touches nothing.
use serde_json::json;

use super::{Backend, ExecutionResult, TxControl};
use crate::directive::Directive;
use crate::logging::Log;

/// [`Backend`] that reports every call through the dry-run log channel.
pub struct DryRunBackend<'a> {
    log: &'a dyn Log,
    calls: usize,
}

impl std::fmt::Debug for DryRunBackend<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DryRunBackend")
            .field("calls", &self.calls)
            .finish_non_exhaustive()
    }
}

impl<'a> DryRunBackend<'a> {
    /// Create a backend logging through `log`.
    #[must_use]
    pub fn new(log: &'a dyn Log) -> Self {
        Self { log, calls: 0 }
    }

    /// Number of calls that would have been sent.
    #[must_use]
    pub const fn calls(&self) -> usize {
        self.calls
    }
}

impl Backend for DryRunBackend<'_> {
    fn execute(&mut self, directive: &Directive) -> ExecutionResult {
        self.calls += 1;
        let origin = directive
            .source
            .as_ref()
            .map(|p| format!(" (from {})", p.display()))
            .unwrap_or_default();
        self.log.dry_run(&format!(
            "would send {} directive{origin}",
            directive.kind
        ));
        ExecutionResult::ok(json!({"dry_run": true}))
    }

    fn transaction(&mut self, control: TxControl) -> ExecutionResult {
        self.calls += 1;
        self.log.dry_run(&format!("would issue {control}"));
        ExecutionResult::ok(json!({"dry_run": true}))
    }
}
