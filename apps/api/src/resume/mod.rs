//! Resume intake and judging. Uploaded files are parsed in memory and
//! discarded after the response; nothing is persisted.

pub mod handlers;
pub mod judge;
