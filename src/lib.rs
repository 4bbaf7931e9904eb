//! `rijmdoc` - Sinterklaas rhyme to Word document service.
//!
//! Converts a rhyme typed as plain text into document paragraphs, merges them
//! with a first name into a `.docx` template, and serves the result over HTTP.

pub mod config;
pub mod constants;
pub mod docx;
pub mod error;
pub mod server;
pub mod session;
pub mod stanza;
