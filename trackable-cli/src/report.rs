//! JSON-lines event report
//!
//! Installs a sink that writes one JSON record per emitted event:
//! `{"timestamp": "...", "event": "...", "properties": {...}}`.

use serde::Serialize;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use trackable::{sink, Dictionary};

#[derive(Debug, Serialize)]
struct EventRecord<'a> {
    timestamp: String,
    event: &'a str,
    properties: &'a Dictionary,
}

/// Writes emitted events to an output stream
#[derive(Clone)]
pub struct JsonLinesReport {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    written: Arc<AtomicUsize>,
}

impl JsonLinesReport {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            written: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make this report the process-wide sink
    pub fn install(&self) {
        let report = self.clone();
        sink::set_sink(move |event_name: &str, properties: &Dictionary| {
            if let Err(e) = report.write_event(event_name, properties) {
                log::error!("Failed to write event {}: {}", event_name, e);
            }
        });
    }

    fn write_event(&self, event_name: &str, properties: &Dictionary) -> std::io::Result<()> {
        let record = EventRecord {
            timestamp: chrono::Utc::now().to_rfc3339(),
            event: event_name,
            properties,
        };

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        serde_json::to_writer(&mut *writer, &record)?;
        writeln!(writer)?;
        self.written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Number of records written so far
    pub fn written(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }

    pub fn flush(&self) -> std::io::Result<()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner).flush()
    }
}
