//! Directory watching for the target log file.
//!
//! Provides the watch session, event classification and the loop that
//! turns content changes into forwarded trace blocks.

mod error;
mod event;
mod session;
mod watch_loop;

pub use error::WatcherError;
pub use event::{FileEvent, FileEventKind};
pub use session::WatchSession;
pub use watch_loop::{EventOutcome, FileWatchLoop, LoopReport};
