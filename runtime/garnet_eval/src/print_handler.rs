//! Destinations for guest output (`puts`, `print`, `p`).
//!
//! Enum dispatch keeps the hot `write` path free of vtable calls. The buffer
//! variant is what tests and embedding hosts read back.

use parking_lot::Mutex;
use std::io::Write as _;
use std::sync::Arc;

/// Guest output target.
pub enum PrintHandlerImpl {
    /// Process stdout.
    Stdout,
    /// In-memory capture.
    Buffer(Mutex<String>),
    /// Output is dropped.
    Silent,
}

impl PrintHandlerImpl {
    /// Write `text` as-is.
    pub fn write(&self, text: &str) {
        match self {
            Self::Stdout => {
                let mut out = std::io::stdout().lock();
                // Guest output has nowhere to report a closed stdout.
                let _ = out.write_all(text.as_bytes());
            }
            Self::Buffer(buf) => buf.lock().push_str(text),
            Self::Silent => {}
        }
    }

    /// Write `text` followed by a newline, unless it already ends with one.
    pub fn write_line(&self, text: &str) {
        if text.ends_with('\n') {
            self.write(text);
        } else {
            let mut line = String::with_capacity(text.len() + 1);
            line.push_str(text);
            line.push('\n');
            self.write(&line);
        }
    }

    /// Everything captured so far; empty for non-capturing handlers.
    pub fn output(&self) -> String {
        match self {
            Self::Buffer(buf) => buf.lock().clone(),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    /// Drain the captured output.
    pub fn take_output(&self) -> String {
        match self {
            Self::Buffer(buf) => std::mem::take(&mut *buf.lock()),
            Self::Stdout | Self::Silent => String::new(),
        }
    }
}

/// Handler shared by an interpreter and whoever reads its output.
pub type SharedPrintHandler = Arc<PrintHandlerImpl>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Stdout)
}

pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Buffer(Mutex::new(String::new())))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Silent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_captures_lines_and_fragments() {
        let handler = buffer_handler();
        handler.write("a");
        handler.write("b");
        handler.write_line("c");
        assert_eq!(handler.output(), "abc\n");
    }

    #[test]
    fn write_line_does_not_double_newline() {
        let handler = buffer_handler();
        handler.write_line("x\n");
        handler.write_line("");
        assert_eq!(handler.output(), "x\n\n");
    }

    #[test]
    fn take_output_drains() {
        let handler = buffer_handler();
        handler.write_line("once");
        assert_eq!(handler.take_output(), "once\n");
        assert_eq!(handler.output(), "");
    }

    #[test]
    fn silent_discards() {
        let handler = silent_handler();
        handler.write_line("dropped");
        assert_eq!(handler.output(), "");
    }

    #[test]
    fn buffer_is_shareable_across_threads() {
        let handler = buffer_handler();
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let handler = Arc::clone(&handler);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        handler.write("x");
                    }
                })
            })
            .collect();
        for worker in workers {
            assert!(worker.join().is_ok());
        }
        assert_eq!(handler.output().len(), 100);
    }
}
