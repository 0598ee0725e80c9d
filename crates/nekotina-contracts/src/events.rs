use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

pub type EventPayload = Map<String, Value>;

/// JSONL log of one conversation.
///
/// Every line is a compact object carrying `type`, `conversation_id`, `seq`
/// and `ts`, followed by the caller's payload. Payload keys replace the
/// envelope keys of the same name. Clones share the sequence counter, so
/// `seq` is strictly increasing per writer family.
#[derive(Debug, Clone)]
pub struct EventWriter {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    path: PathBuf,
    conversation_id: String,
    next_seq: Mutex<u64>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, conversation_id: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                path: path.into(),
                conversation_id: conversation_id.into(),
                next_seq: Mutex::new(0),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    pub fn conversation_id(&self) -> &str {
        &self.shared.conversation_id
    }

    /// Appends one event and returns it as written.
    pub fn emit(&self, event_type: &str, payload: EventPayload) -> anyhow::Result<Value> {
        let mut next_seq = self
            .shared
            .next_seq
            .lock()
            .map_err(|_| anyhow!("event log lock poisoned"))?;

        let mut event = self.envelope(event_type, *next_seq);
        event.extend(payload);
        let mut line = serde_json::to_string(&event)?;
        line.push('\n');

        let path = &self.shared.path;
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(line.as_bytes()))
            .with_context(|| format!("failed to append to {}", path.display()))?;

        *next_seq += 1;
        Ok(Value::Object(event))
    }

    fn envelope(&self, event_type: &str, seq: u64) -> EventPayload {
        let mut event = Map::new();
        event.insert("type".into(), Value::from(event_type));
        event.insert(
            "conversation_id".into(),
            Value::from(self.shared.conversation_id.as_str()),
        );
        event.insert("seq".into(), Value::from(seq));
        event.insert(
            "ts".into(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        event
    }
}
