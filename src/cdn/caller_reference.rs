use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out invalidation caller references: a UTC timestamp with nanosecond precision plus a sequence number
/// that only ever grows within the process.
#[derive(Debug, Default)]
pub struct CallerReferences {
    sequence: AtomicU64,
}

impl CallerReferences {
    pub fn new() -> Self {
        CallerReferences::default()
    }

    pub fn next_reference(&self) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", Utc::now().format("%Y%m%dT%H%M%S%.9fZ"), sequence)
    }
}
