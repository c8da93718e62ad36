use std::cell::RefCell;
use std::rc::Rc;

use log::info;

use printloom_ingest::UploadKind;

/// Analytics emitted by committing user actions.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    ImageAdded {
        file_size: usize,
        file_type: UploadKind,
    },
    TextAdded {
        length: usize,
        font: String,
        size: f64,
    },
}

/// Sink for telemetry events. The engine never blocks on a sink.
pub trait Telemetry {
    fn record(&mut self, event: TelemetryEvent);
}

/// Default sink: structured log records.
#[derive(Debug, Default)]
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn record(&mut self, event: TelemetryEvent) {
        match event {
            TelemetryEvent::ImageAdded {
                file_size,
                file_type,
            } => info!(
                "telemetry: image added (size={file_size}, type={})",
                file_type.mime()
            ),
            TelemetryEvent::TextAdded { length, font, size } => {
                info!("telemetry: text added (length={length}, font={font:?}, size={size})");
            }
        }
    }
}

/// In-memory sink with a shared handle, for tests and host instrumentation.
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    events: Rc<RefCell<Vec<TelemetryEvent>>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.borrow().clone()
    }
}

impl Telemetry for RecordingTelemetry {
    fn record(&mut self, event: TelemetryEvent) {
        self.events.borrow_mut().push(event);
    }
}
