//! Append-only diagnostics sink.

use cinder_events::EventLogRecord;

/// Where per-step event records end up.
///
/// Records are appended by the driver on its own cadence: they buffer
/// internally while fine timestep bins run alone and are handed over
/// once the highest active and highest occupied bins coincide, followed
/// by a `flush()`.
pub trait DiagnosticsSink: Send {
    /// Append one record.
    fn append(&mut self, record: EventLogRecord);
    /// Make everything appended so far durable.
    fn flush(&mut self);
}

/// In-memory sink for tests and embedders that poll.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<EventLogRecord>,
    flushes: u32,
}

impl MemorySink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything appended so far.
    pub fn records(&self) -> &[EventLogRecord] {
        &self.records
    }

    /// How many times `flush()` was called.
    pub fn flush_count(&self) -> u32 {
        self.flushes
    }
}

impl DiagnosticsSink for MemorySink {
    fn append(&mut self, record: EventLogRecord) {
        self.records.push(record);
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}
