#![forbid(unsafe_code)]

//! Tracing output forwarded line by line to a sink.
//!
//! On wasm the sink is `console.log`; the fmt layer runs without timestamps
//! (no clock is assumed) and without ANSI colors.

use std::io;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

type Sink = Arc<dyn Fn(&str) + Send + Sync>;

/// [`MakeWriter`] handing each formatted event to `sink`.
#[derive(Clone)]
pub struct LineSinkWriter {
    sink: Sink,
}

impl LineSinkWriter {
    pub fn new(sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }
}

impl std::fmt::Debug for LineSinkWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineSinkWriter").finish_non_exhaustive()
    }
}

/// Buffers one event and emits its lines on flush or drop.
pub struct LineWriter {
    sink: Sink,
    buf: Vec<u8>,
}

impl LineWriter {
    fn emit_complete_lines(&mut self) {
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            (self.sink)(String::from_utf8_lossy(&line[..pos]).as_ref());
        }
    }
}

impl io::Write for LineWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit_complete_lines();
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        self.emit_complete_lines();
        if !self.buf.is_empty() {
            (self.sink)(String::from_utf8_lossy(&self.buf).as_ref());
        }
    }
}

impl<'a> MakeWriter<'a> for LineSinkWriter {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter {
            sink: Arc::clone(&self.sink),
            buf: Vec::new(),
        }
    }
}

/// Install a global fmt subscriber writing to `sink` at `max_level`.
///
/// Returns `false` if a global subscriber was already set.
pub fn init_with_sink(sink: impl Fn(&str) + Send + Sync + 'static, max_level: Level) -> bool {
    tracing_subscriber::fmt()
        .with_writer(LineSinkWriter::new(sink))
        .without_time()
        .with_max_level(max_level)
        .try_init()
        .is_ok()
}
