//! Line-oriented output of scan records
//!
//! Records are written to the output stream as soon as they are produced, one per line and flushed
//! immediately, so the output can be piped into other tools while a long run is in progress.
//!
//! Data lines are either a repository URL or `<digest>  <source label>` (two spaces, the format of
//! common checksum lists). Lines starting with `#` are comments and never data.

mod lines;

pub use lines::LineWriter;
