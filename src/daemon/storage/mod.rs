//!  Storage is organized through [time_storage::JsonTimeStorage].
//!  The basic idea is:
//!   - All accumulated time lives in a single json document inside the application directory.
//!   - The document maps a local calendar day to the seconds spent on each hostname that day.
//!   - Readers and writers always move the whole document. Writes replace the file atomically.

pub mod entities;
pub mod time_storage;
