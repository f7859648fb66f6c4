//! Logging setup and prompt-safe output
//!
//! While the shell is reading input, anything written straight to the terminal
//! would land in the middle of the user's half-typed line. Output therefore
//! goes through a [`PrinterSlot`]: once the shell installs the line editor's
//! external printer, log records and server lines are printed above the
//! prompt, which is then redrawn. Before that (and after teardown) output
//! falls back to plain stdout/stderr.

use rustyline::ExternalPrinter;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Printer handed out by the line editor
pub type Printer = Box<dyn ExternalPrinter + Send>;

/// Shared, swappable output destination
#[derive(Clone, Default)]
pub struct PrinterSlot {
    inner: Arc<Mutex<Option<Printer>>>,
}

impl PrinterSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route output through `printer` from now on
    pub fn install(&self, printer: Printer) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = Some(printer);
        }
    }

    /// Go back to writing to the terminal directly
    pub fn clear(&self) {
        if let Ok(mut slot) = self.inner.lock() {
            slot.take();
        }
    }

    pub fn is_installed(&self) -> bool {
        self.inner.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Print a line to stdout, above the prompt when one is active
    pub fn print(&self, text: String) {
        if !self.print_with_printer(&text) {
            print!("{}", terminated(&text));
        }
    }

    fn eprint(&self, text: String) {
        if !self.print_with_printer(&text) {
            let _ = write!(io::stderr(), "{}", terminated(&text));
        }
    }

    fn print_with_printer(&self, text: &str) -> bool {
        match self.inner.lock() {
            Ok(mut slot) => match slot.as_mut() {
                Some(printer) => printer.print(terminated(text)).is_ok(),
                None => false,
            },
            Err(_) => false,
        }
    }
}

/// The external printer writes messages verbatim while no prompt is being
/// edited, so every message carries its own line ending.
fn terminated(text: &str) -> String {
    let mut line = String::with_capacity(text.len() + 1);
    line.push_str(text);
    if !line.ends_with('\n') {
        line.push('\n');
    }
    line
}

impl<'a> MakeWriter<'a> for PrinterSlot {
    type Writer = SlotWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SlotWriter {
            slot: self.clone(),
            buffer: Vec::with_capacity(256),
        }
    }
}

/// Buffers one log record and emits it on flush or drop
pub struct SlotWriter {
    slot: PrinterSlot,
    buffer: Vec<u8>,
}

impl SlotWriter {
    fn flush_buffer(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let record = String::from_utf8_lossy(&self.buffer).trim_end().to_string();
        self.buffer.clear();

        if !record.is_empty() {
            self.slot.eprint(record);
        }
    }
}

impl Write for SlotWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_buffer();
        Ok(())
    }
}

impl Drop for SlotWriter {
    fn drop(&mut self) {
        self.flush_buffer();
    }
}

/// Initialize the logging system
///
/// Records carry a timestamp and a colored level. `RUST_LOG` overrides the
/// default filter.
pub fn init_logging(verbose: bool, slot: PrinterSlot) {
    let level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "rctl={},rctl_client={},rctl_proto={}",
            level, level, level
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(slot)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Capture(Arc<Mutex<Vec<String>>>);

    impl ExternalPrinter for Capture {
        fn print(&mut self, msg: String) -> rustyline::Result<()> {
            if let Ok(mut lines) = self.0.lock() {
                lines.push(msg);
            }
            Ok(())
        }
    }

    #[test]
    fn test_writer_routes_through_printer() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let slot = PrinterSlot::new();
        slot.install(Box::new(Capture(lines.clone())));
        assert!(slot.is_installed());

        {
            let mut writer = slot.make_writer();
            writer.write_all(b"2026-10-16T10:00:00Z  INFO ").unwrap();
            writer.write_all(b"Connected\n").unwrap();
        }
        slot.print("[OK] done".to_string());

        let lines = lines.lock().unwrap();
        assert_eq!(
            *lines,
            vec![
                "2026-10-16T10:00:00Z  INFO Connected\n".to_string(),
                "[OK] done\n".to_string()
            ]
        );
    }

    #[test]
    fn test_each_message_ends_its_line() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let slot = PrinterSlot::new();
        slot.install(Box::new(Capture(lines.clone())));

        {
            let mut writer = slot.make_writer();
            writer.write_all(b" WARN Not connected to server\n").unwrap();
        }
        slot.print("[OK] done".to_string());
        slot.print("[INFO] one\n[INFO] two".to_string());
        slot.print("already ended\n".to_string());

        let lines = lines.lock().unwrap();
        assert_eq!(
            lines.concat(),
            " WARN Not connected to server\n[OK] done\n[INFO] one\n[INFO] two\nalready ended\n"
        );
        assert!(lines.iter().all(|line| line.ends_with('\n') && !line.ends_with("\n\n")));
    }

    #[test]
    fn test_clear_restores_direct_output() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let slot = PrinterSlot::new();
        slot.install(Box::new(Capture(lines.clone())));
        slot.clear();

        assert!(!slot.is_installed());
        slot.print("to stdout".to_string());
        assert!(lines.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_record_not_printed() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let slot = PrinterSlot::new();
        slot.install(Box::new(Capture(lines.clone())));

        let mut writer = slot.make_writer();
        writer.write_all(b"\n").unwrap();
        writer.flush().unwrap();
        drop(writer);

        assert!(lines.lock().unwrap().is_empty());
    }
}
