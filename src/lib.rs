//! Records how long each website stays in the foreground of the browser.
//!
//! `sitetime-host` is started by the browser as a native messaging host and keeps per day
//! totals on disk. `sitetime` reads them back.

pub mod browser_api;
pub mod cli;
pub mod daemon;
pub mod fs;
pub mod utils;
