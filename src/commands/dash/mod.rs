//! Dash command - interactive dashboard over stdin
//!
//! Reads one line at a time; every character on the line is a key
//! (`jjx` moves down twice and toggles). Aggregation runs on a worker
//! thread so the shell keeps answering while a refresh is in flight.
//!
//! # Usage
//!
//! ```bash
//! repodash              # Same as `repodash dash`
//! repodash dash --quality
//! ```

mod internal;

use anyhow::Result;

/// Execute the dash command
pub fn execute(check_quality: bool) -> Result<()> {
    internal::run(check_quality)
}
