//! Interview domain: Quinn's persona, realtime interviewer replies,
//! stateless question generation, hints, per-answer evaluation, content
//! judging, and the post-interview report.

pub mod content_judge;
pub mod evaluation;
pub mod handlers;
pub mod hint;
pub mod persona;
pub mod question;
pub mod report;
