//! Per-run classification counters and their summary histogram.

use std::cell::RefCell;
use std::collections::BTreeMap;

/// Classification counters collected while a run is active: for every key,
/// how often each value was tagged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyContext {
    tags: BTreeMap<String, BTreeMap<String, u64>>,
}

impl PropertyContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: &str, value: &str) {
        *self
            .tags
            .entry(key.to_string())
            .or_default()
            .entry(value.to_string())
            .or_default() += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Occurrences recorded for a specific key/value pair.
    pub fn count(&self, key: &str, value: &str) -> u64 {
        self.tags
            .get(key)
            .and_then(|values| values.get(value))
            .copied()
            .unwrap_or(0)
    }

    /// Per-key value histogram with percentages, printed after a passing
    /// run.
    pub fn format_summary(&self) -> String {
        let mut out = String::new();
        for (key, values) in &self.tags {
            let total: u64 = values.values().sum();
            out.push_str(&format!("[{}]\n", key));
            for (value, count) in values {
                let percent = 100.0 * *count as f64 / total as f64;
                out.push_str(&format!("  {}: {:.2}% ({})\n", value, percent, count));
            }
        }
        out
    }
}

thread_local! {
    static ACTIVE: RefCell<Option<PropertyContext>> = const { RefCell::new(None) };
}

/// Installs a fresh context for the duration of a run and restores the
/// previous one on drop, so nested runs do not mix counters.
pub(crate) struct ContextGuard {
    previous: Option<PropertyContext>,
}

impl ContextGuard {
    pub(crate) fn install() -> Self {
        let previous = ACTIVE.with(|active| active.borrow_mut().replace(PropertyContext::new()));
        Self { previous }
    }

    /// Copy of the counters recorded so far.
    pub(crate) fn snapshot(&self) -> PropertyContext {
        ACTIVE.with(|active| active.borrow().clone().unwrap_or_default())
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        ACTIVE.with(|active| *active.borrow_mut() = previous);
    }
}

/// Record a key/value tag under the active run's context. Outside of a run
/// the call is a no-op. The location parameters mirror the macro contract.
pub fn tag(_file: &'static str, _line: u32, key: &str, value: &str) {
    ACTIVE.with(|active| {
        if let Some(context) = active.borrow_mut().as_mut() {
            context.record(key, value);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_count_per_key_and_value() {
        let mut context = PropertyContext::new();
        context.record("parity", "even");
        context.record("parity", "even");
        context.record("parity", "odd");
        context.record("sign", "positive");
        assert_eq!(context.count("parity", "even"), 2);
        assert_eq!(context.count("parity", "odd"), 1);
        assert_eq!(context.count("sign", "positive"), 1);
        assert_eq!(context.count("sign", "negative"), 0);
    }

    #[test]
    fn summary_lists_percentages() {
        let mut context = PropertyContext::new();
        context.record("parity", "even");
        context.record("parity", "even");
        context.record("parity", "odd");
        context.record("parity", "odd");
        let summary = context.format_summary();
        assert!(summary.contains("[parity]"));
        assert!(summary.contains("even: 50.00% (2)"));
        assert!(summary.contains("odd: 50.00% (2)"));
    }

    #[test]
    fn tag_outside_a_run_is_ignored() {
        tag("here.rs", 1, "key", "value");
        let guard = ContextGuard::install();
        assert!(guard.snapshot().is_empty());
    }

    #[test]
    fn guard_restores_the_previous_context() {
        let outer = ContextGuard::install();
        tag("here.rs", 1, "depth", "outer");
        {
            let inner = ContextGuard::install();
            tag("here.rs", 2, "depth", "inner");
            assert_eq!(inner.snapshot().count("depth", "inner"), 1);
            assert_eq!(inner.snapshot().count("depth", "outer"), 0);
        }
        assert_eq!(outer.snapshot().count("depth", "outer"), 1);
    }
}
