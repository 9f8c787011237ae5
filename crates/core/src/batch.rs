//! Per-item outcome accumulator for batch operations.
//!
//! Batches run each item as its own atomic operation. A failing item never
//! aborts the batch; it is recorded here and the loop moves on.

use serde::Serialize;

/// Outcome of one batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchOutcome<T> {
    /// The item was processed.
    Succeeded {
        /// Operation result.
        result: T,
    },
    /// The item was intentionally left alone.
    Skipped {
        /// Why it was skipped.
        reason: String,
    },
    /// Processing the item failed.
    Failed {
        /// Error message.
        error: String,
    },
}

/// One recorded batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem<K, T> {
    /// Item key (shipment, customer, debt...).
    pub key: K,
    /// What happened to it.
    #[serde(flatten)]
    pub outcome: BatchOutcome<T>,
}

/// Counts and per-item outcomes of a batch run, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport<K, T> {
    /// Items processed successfully.
    pub succeeded: usize,
    /// Items skipped.
    pub skipped: usize,
    /// Items that failed.
    pub failed: usize,
    /// Every item, in processing order.
    pub items: Vec<BatchItem<K, T>>,
}

impl<K, T> Default for BatchReport<K, T> {
    fn default() -> Self {
        Self {
            succeeded: 0,
            skipped: 0,
            failed: 0,
            items: Vec::new(),
        }
    }
}

impl<K, T> BatchReport<K, T> {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful item.
    pub fn succeed(&mut self, key: K, result: T) {
        self.succeeded += 1;
        self.items.push(BatchItem {
            key,
            outcome: BatchOutcome::Succeeded { result },
        });
    }

    /// Records a skipped item.
    pub fn skip(&mut self, key: K, reason: impl Into<String>) {
        self.skipped += 1;
        self.items.push(BatchItem {
            key,
            outcome: BatchOutcome::Skipped {
                reason: reason.into(),
            },
        });
    }

    /// Records a failed item.
    pub fn fail(&mut self, key: K, error: impl ToString) {
        self.failed += 1;
        self.items.push(BatchItem {
            key,
            outcome: BatchOutcome::Failed {
                error: error.to_string(),
            },
        });
    }

    /// Records the result of one item operation.
    pub fn record<E: ToString>(&mut self, key: K, result: Result<T, E>) {
        match result {
            Ok(value) => self.succeed(key, value),
            Err(e) => self.fail(key, e),
        }
    }

    /// Total number of items seen.
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }
}
