use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::time::Instant;

use tracing::warn;

use crate::level::Level;

/// Prefix a sequence puts in front of the lines its children print.
pub const SUB_COMMAND_PREFIX: &str = "   ";

/// Leveled line sink used by commands to report progress.
///
/// Implementors only provide [`Printer::log`]; every other method forwards to
/// it. Roots decide whether a line is emitted, decorators such as
/// [`PrefixedPrinter`] only rewrite it.
pub trait Printer {
    /// Emit `message` at `level`, one line per call.
    fn log(&self, level: Level, message: fmt::Arguments<'_>);

    fn trace(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Trace, message);
    }

    fn debug(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Debug, message);
    }

    fn info(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Info, message);
    }

    fn warn(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Warn, message);
    }

    fn error(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Error, message);
    }

    fn fatal(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Fatal, message);
    }

    /// Announce that `command` starts and return the instant it started at.
    fn start_command(&self, command: &dyn fmt::Display) -> Instant {
        self.info(format_args!("=== RUN {command}"));
        Instant::now()
    }

    /// Announce that `command` finished, with the time elapsed since `start`.
    fn end_command(&self, command: &dyn fmt::Display, start: Instant) {
        self.info(format_args!("--- END {command} ({:?})", start.elapsed()));
    }
}

impl<'p> dyn Printer + 'p {
    /// Bind a child printer that prepends `prefix` to every line.
    pub fn with_prefix(&self, prefix: impl Into<String>) -> PrefixedPrinter<'_> {
        PrefixedPrinter::new(self, prefix)
    }
}

/// Root printer: filters by threshold and writes lines to its sink.
pub struct StdPrinter {
    writer: RefCell<Box<dyn Write>>,
    threshold: Level,
}

impl StdPrinter {
    #[must_use]
    pub fn new(writer: impl Write + 'static, threshold: Level) -> Self {
        Self {
            writer: RefCell::new(Box::new(writer)),
            threshold,
        }
    }

    /// Printer writing to standard output at the default threshold.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout(), Level::default())
    }

    #[must_use]
    pub fn threshold(&self) -> Level {
        self.threshold
    }

    /// Printer writing into a [`CaptureBuffer`] that tests can inspect.
    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn capture(threshold: Level) -> (Self, CaptureBuffer) {
        let buffer = CaptureBuffer::default();
        (Self::new(buffer.clone(), threshold), buffer)
    }
}

impl Default for StdPrinter {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for StdPrinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdPrinter")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl Printer for StdPrinter {
    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        if level < self.threshold {
            return;
        }

        let mut writer = self.writer.borrow_mut();
        if let Err(error) = writeln!(writer, "{message}") {
            warn!(%error, %level, "failed to write printer line");
        }
    }
}

/// Decorator forwarding every line to its parent with a prefix prepended.
///
/// It has no threshold of its own: filtering happens once, at the root.
pub struct PrefixedPrinter<'a> {
    parent: &'a dyn Printer,
    prefix: String,
}

impl<'a> PrefixedPrinter<'a> {
    pub fn new(parent: &'a dyn Printer, prefix: impl Into<String>) -> Self {
        Self {
            parent,
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Printer for PrefixedPrinter<'_> {
    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        self.parent
            .log(level, format_args!("{}{message}", self.prefix));
    }
}

/// Shared in-memory sink, cloned into a printer and read back afterwards.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer(std::rc::Rc<RefCell<Vec<u8>>>);

#[cfg(any(test, feature = "testing"))]
impl CaptureBuffer {
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

#[cfg(any(test, feature = "testing"))]
impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
