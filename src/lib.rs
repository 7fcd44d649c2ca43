//! goread feed cache library
//!
//! Exposes the article cache, the feed fetcher and the CLI parsing used by the
//! `goread` binary, so integration tests and other front ends can drive them.

pub mod cache;
pub mod cli;
pub mod feed;
