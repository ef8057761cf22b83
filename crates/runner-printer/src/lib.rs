//! Leveled line printer for step runners.
//!
//! A [`StdPrinter`] is the root of a printer tree: it owns the sink and the
//! severity threshold. [`PrefixedPrinter`]s hang off it to indent the output
//! of nested commands, forwarding every line upward.

mod level;
mod printer;

pub use level::{Level, ParseLevelError};
#[cfg(any(test, feature = "testing"))]
pub use printer::CaptureBuffer;
pub use printer::{PrefixedPrinter, Printer, SUB_COMMAND_PREFIX, StdPrinter};
