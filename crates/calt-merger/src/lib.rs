//! # calt merger
//!
//! Enable OpenType stylistic sets by default by adding their GSUB lookups to
//! the `calt` feature of every language system that offers them.
//!
//! Lookups are never moved or rewritten. Only feature membership changes,
//! plus a family name suffix so the result installs alongside the original.
//!
//! ## Example
//!
//! ```no_run
//! use font_calt_merger::{Font, MergeOptions};
//!
//! let data = std::fs::read("PragmataPro.ttf").unwrap();
//! let font = Font::new(&data).unwrap();
//! let merged = font.merge(&MergeOptions::new(["ss13", "ss15"])).unwrap();
//! std::fs::write("PragmataProCustom.ttf", merged.data).unwrap();
//! ```

mod codec;
mod compat;
mod error;
mod font;
mod merge;
pub mod model;
mod names;
mod resolve;
mod types;

pub use codec::{NameRecord, NameTable, decode, encode};
pub use error::{Error, ErrorKind, Result};
pub use font::Font;
pub use merge::{AddedLookup, CaltAction, LookupMerger, MergeReport, PairReport};
pub use model::LayoutTable;
pub use names::{DEFAULT_SUFFIX, NameRewriter, RenameReport, describe_features};
pub use resolve::{FeatureResolver, Resolution, parse_tags};
pub use types::{FeatureSummary, FontReport, LangSysSummary, MergeOptions, MergeResult, MergeStats};

/// Report the language systems and features of a font.
pub fn report(data: &[u8]) -> Result<FontReport> {
    Font::new(data)?.report()
}

/// Merge features into `calt` and return the new font with statistics.
pub fn merge(data: &[u8], options: &MergeOptions) -> Result<MergeResult> {
    Font::new(data)?.merge(options)
}
