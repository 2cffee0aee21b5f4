//! Optional per-Step-kind performance counters.
//!
//! Enabled through `EvaluatorBuilder::counters`. When disabled, recording is
//! a no-op.

use crate::step::StepKind;

#[derive(Clone, Debug)]
pub struct StepCounters {
    invoked: [u64; StepKind::COUNT],
    nested_runs: u64,
}

impl Default for StepCounters {
    fn default() -> Self {
        StepCounters {
            invoked: [0; StepKind::COUNT],
            nested_runs: 0,
        }
    }
}

impl StepCounters {
    #[inline]
    pub fn record(&mut self, kind: StepKind) {
        let slot = &mut self.invoked[kind.index()];
        *slot = slot.wrapping_add(1);
    }

    #[inline]
    pub fn record_nested_run(&mut self) {
        self.nested_runs = self.nested_runs.wrapping_add(1);
    }

    /// How many Steps of `kind` were invoked.
    pub fn invoked(&self, kind: StepKind) -> u64 {
        self.invoked[kind.index()]
    }

    /// How many nested evaluators ran (guarded blocks and iterator steps).
    pub fn nested_runs(&self) -> u64 {
        self.nested_runs
    }

    pub fn total(&self) -> u64 {
        self.invoked.iter().fold(0, |sum, count| sum.wrapping_add(*count))
    }

    /// Format a summary report, one line per Step kind that ran.
    pub fn report(&self) -> String {
        let mut out = format!(
            "Evaluation profile:\n  Steps invoked: {}\n  Nested runs:   {}",
            self.total(),
            self.nested_runs
        );
        for kind in StepKind::ALL {
            let count = self.invoked(kind);
            if count > 0 {
                out.push_str(&format!("\n  {:<14} {count}", kind.name()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_by_kind() {
        let mut counters = StepCounters::default();
        counters.record(StepKind::Call);
        counters.record(StepKind::Call);
        counters.record(StepKind::Eval);
        assert_eq!(counters.invoked(StepKind::Call), 2);
        assert_eq!(counters.invoked(StepKind::Eval), 1);
        assert_eq!(counters.invoked(StepKind::ForNext), 0);
        assert_eq!(counters.total(), 3);
    }

    #[test]
    fn report_lists_only_used_kinds() {
        let mut counters = StepCounters::default();
        counters.record(StepKind::ForStart);
        counters.record_nested_run();
        let report = counters.report();
        assert!(report.contains("ForStart"));
        assert!(report.contains("Nested runs:   1"));
        assert!(!report.contains("WhileTest"));
    }

    #[test]
    fn kind_table_is_in_declaration_order() {
        for (index, kind) in StepKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), index);
        }
    }
}
