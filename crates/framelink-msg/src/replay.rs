//! ---
//! fl_section: "02-messaging-ipc-data-model"
//! fl_subsection: "module"
//! fl_type: "source"
//! fl_scope: "code"
//! fl_description: "Message schema helpers and protocol codecs."
//! fl_version: "v0.0.0-prealpha"
//! fl_owner: "tbd"
//! ---
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::service::{DispatchOutcome, MessageService};
use crate::Result;

#[derive(Debug, Deserialize)]
struct ReplayRecord {
    #[serde(default)]
    delay_ms: Option<u64>,
    #[serde(default)]
    payload: Option<JsonValue>,
}

/// Totals collected while replaying a capture.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    /// Records read from the capture.
    pub records: usize,
    /// Records fanned out on the event bus.
    pub delivered: usize,
    /// Records the service discarded as malformed.
    pub discarded: usize,
    /// Replies that completed a pending request.
    pub resolved: usize,
    /// Delivered records per inbound discriminant.
    pub by_kind: BTreeMap<String, usize>,
}

impl ReplaySummary {
    fn record(&mut self, outcome: DispatchOutcome) {
        self.records += 1;
        match outcome {
            DispatchOutcome::Discarded => self.discarded += 1,
            DispatchOutcome::Delivered { kind, resolved, .. } => {
                self.delivered += 1;
                if resolved {
                    self.resolved += 1;
                }
                *self.by_kind.entry(kind.as_str().to_owned()).or_default() += 1;
            }
        }
    }
}

/// Replay inbound host traffic from a newline-delimited JSON capture.
///
/// Each line must contain an object with a `payload` field holding the raw
/// inbound message and an optional `delay_ms` field to simulate time between
/// messages. Payloads go through [`MessageService::dispatch`], so unknown or
/// empty payloads are counted as discarded rather than failing the replay.
pub fn replay_from_file<P: AsRef<Path>>(service: &MessageService, path: P) -> Result<ReplaySummary> {
    let file = File::open(path)?;
    replay_from_reader(service, file)
}

/// Replay a capture from any reader. See [`replay_from_file`].
pub fn replay_from_reader<R: Read>(service: &MessageService, reader: R) -> Result<ReplaySummary> {
    let reader = BufReader::new(reader);
    let mut summary = ReplaySummary::default();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ReplayRecord = serde_json::from_str(&line)?;
        if let Some(delay) = record.delay_ms {
            std::thread::sleep(Duration::from_millis(delay));
        }
        summary.record(service.dispatch(record.payload.as_ref()));
    }

    tracing::debug!(
        records = summary.records,
        delivered = summary.delivered,
        discarded = summary.discarded,
        "capture replay finished"
    );
    Ok(summary)
}
