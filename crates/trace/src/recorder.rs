//! Durable JSON recorder.
//!
//! All events funnel through one ingress channel into a dedicated writer
//! thread, so the output file is written by a single serialized writer in
//! arrival order. Recording never blocks on disk I/O.

use crate::{EventSink, Recorded, TraceEvent};
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Writes the event stream as a JSON array to a file.
///
/// Events are stamped with a wall-clock nanosecond timestamp at ingress and
/// appended in arrival order. [`JsonRecorder::close`] must be called after
/// the run to flush the array tail; events recorded after close are
/// discarded.
pub struct JsonRecorder {
    ingress: Mutex<Option<Sender<Recorded>>>,
    writer: Mutex<Option<JoinHandle<io::Result<()>>>>,
}

impl JsonRecorder {
    /// Create the output file and start the writer thread.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        let (tx, rx) = unbounded();
        let writer = thread::Builder::new()
            .name("trace-writer".into())
            .spawn(move || write_loop(rx, file))?;
        Ok(Self {
            ingress: Mutex::new(Some(tx)),
            writer: Mutex::new(Some(writer)),
        })
    }

    /// Stop accepting events, drain the queue, and flush the file.
    pub fn close(&self) -> io::Result<()> {
        // Dropping the sender ends the writer's drain loop.
        self.ingress.lock().expect("recorder poisoned").take();
        let handle = self.writer.lock().expect("recorder poisoned").take();
        match handle {
            Some(handle) => handle
                .join()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "trace writer panicked"))?,
            None => Ok(()),
        }
    }

    fn timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or(0)
    }
}

impl EventSink for JsonRecorder {
    fn record(&self, event: TraceEvent) {
        let recorded = Recorded {
            timestamp: Self::timestamp(),
            event,
        };
        let ingress = self.ingress.lock().expect("recorder poisoned");
        match ingress.as_ref() {
            Some(tx) => {
                // The writer holds the receiver for as long as the sender
                // exists, so this cannot fail.
                let _ = tx.send(recorded);
            }
            None => warn!("event recorded after recorder close, discarding"),
        }
    }
}

fn write_loop(rx: Receiver<Recorded>, file: File) -> io::Result<()> {
    let mut out = BufWriter::new(file);
    out.write_all(b"[")?;
    let mut first = true;
    for recorded in rx {
        if first {
            out.write_all(b"\n")?;
        } else {
            out.write_all(b",\n")?;
        }
        serde_json::to_writer(&mut out, &recorded)?;
        first = false;
    }
    out.write_all(b"\n]\n")?;
    out.flush()
}
