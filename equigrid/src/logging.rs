// src/logging.rs
//
// Per-step telemetry sinks for episode rollouts.
// - EventSink:  trait used by the episode runner
// - NoopSink:   discards all records
// - JsonlSink:  one JSON object per step, for offline analysis
// - MemorySink: keeps records in memory (tests, small batch runs)

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::reward::RewardComponents;
use crate::terminal::TerminationReason;

/// What happened in one step of one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub episode_id: u64,
    pub seed: u64,
    /// 1-based step index within the episode.
    pub step: u64,
    pub policy: String,
    pub action: Action,
    pub reward: f64,
    pub components: RewardComponents,
    /// Budget after the step.
    pub budget: f64,
    pub unserved_cities: usize,
    /// Set on the step that ended the episode.
    pub termination: Option<TerminationReason>,
}

/// Abstract sink for per-step telemetry.
pub trait EventSink {
    fn log_step(&mut self, record: &StepRecord);

    fn flush(&mut self) {}
}

/// Sink that discards all records.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn log_step(&mut self, _record: &StepRecord) {}
}

/// JSONL file sink.
pub struct JsonlSink {
    writer: BufWriter<File>,
}

impl JsonlSink {
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl EventSink for JsonlSink {
    fn log_step(&mut self, record: &StepRecord) {
        // Telemetry failures must not abort a rollout.
        if let Ok(line) = serde_json::to_string(record) {
            let _ = self.writer.write_all(line.as_bytes());
            let _ = self.writer.write_all(b"\n");
        }
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}

impl Drop for JsonlSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// In-memory sink.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub records: Vec<StepRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for MemorySink {
    fn log_step(&mut self, record: &StepRecord) {
        self.records.push(record.clone());
    }
}
