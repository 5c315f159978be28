//! calt-merge CLI library.

pub mod cli;
pub mod io;
pub mod merge;
pub mod parallel;
pub mod status;
