//! First-match classification of raw error text.

use crate::store::PatternStore;
use crate::types::{ErrorCategory, ErrorEvent, FixStrategy, PatternId, RawError, Severity};
use indexmap::IndexMap;

/// Result of classifying a single message.
#[derive(Debug, Clone)]
pub enum Classification {
    /// The message matched a rule.
    Matched {
        pattern: PatternId,
        category: ErrorCategory,
        severity: Severity,
        strategy: FixStrategy,
        blocking: bool,
    },
    /// No rule matched. Reported, never remediated.
    Unmatched,
}

impl Classification {
    pub fn is_matched(&self) -> bool {
        matches!(self, Classification::Matched { .. })
    }
}

/// A classified collection window: one [`ErrorEvent`] per distinct pattern
/// with its observed frequency, plus the raw lines nothing matched.
#[derive(Debug, Default)]
pub struct ClassifiedBatch {
    pub events: Vec<ErrorEvent>,
    pub unmatched: Vec<RawError>,
}

/// Stateless matcher over a [`PatternStore`].
#[derive(Debug, Clone)]
pub struct Classifier {
    store: PatternStore,
}

impl Classifier {
    pub fn new(store: PatternStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    /// Match a single message against the rule table.
    ///
    /// Iterates rules in registration order and returns the **first**
    /// match, not the best one; rule ordering is the specificity policy.
    pub fn classify(&self, message: &str) -> Classification {
        for rule in self.store.rules() {
            if rule.matcher.is_match(message) {
                return Classification::Matched {
                    pattern: rule.id.clone(),
                    category: rule.category,
                    severity: rule.severity,
                    strategy: rule.strategy,
                    blocking: rule.blocking,
                };
            }
        }
        Classification::Unmatched
    }

    /// Classify a window of raw errors, grouping repeats of the same
    /// pattern into one event with a frequency count.
    ///
    /// Event order follows first appearance in the window, which is the
    /// detection order the priority engine's stable sort preserves on
    /// ties.
    pub fn classify_batch(&self, raw: &[RawError]) -> ClassifiedBatch {
        let mut grouped: IndexMap<PatternId, ErrorEvent> = IndexMap::new();
        let mut unmatched = Vec::new();

        for entry in raw {
            match self.classify(&entry.message) {
                Classification::Matched {
                    pattern,
                    category,
                    severity,
                    strategy,
                    blocking,
                } => {
                    grouped
                        .entry(pattern.clone())
                        .and_modify(|event| event.frequency += 1)
                        .or_insert_with(|| ErrorEvent {
                            pattern,
                            category,
                            severity,
                            strategy,
                            message: entry.message.clone(),
                            timestamp: entry.observed_at,
                            frequency: 1,
                            blocking,
                        });
                }
                Classification::Unmatched => unmatched.push(entry.clone()),
            }
        }

        ClassifiedBatch {
            events: grouped.into_values().collect(),
            unmatched,
        }
    }
}
