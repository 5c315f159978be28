//! Error types for stylistic set merging.

use std::{fmt, result};

use read_fonts::{ReadError, types::Tag};
use write_fonts::BuilderError;

use crate::model::LookupIndex;

/// Errors that can occur while merging stylistic sets into `calt`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse font: {0}")]
    Parse(#[from] ReadError),

    #[error("malformed table: {0}")]
    Malformed(String),

    #[error("no GSUB table in font")]
    NoGsub,

    #[error("no name table in font")]
    NameTableMissing,

    #[error("feature '{tag}' not found in any script/language system (available: {})", available.join(","))]
    FeatureNotFound { tag: Tag, available: Vec<String> },

    #[error("lookup {lookup} has incompatible flags: {reason}")]
    IncompatibleLookupFlags { lookup: LookupIndex, reason: String },

    #[error("{what} offset {value} does not fit its field")]
    EncodingOverflow { what: &'static str, value: usize },

    #[error("invalid feature tag {0:?}")]
    InvalidTag(String),

    #[error("name {name_id} in group {group:?} cannot be encoded for its platform")]
    UnencodableName { name_id: u16, group: (u16, u16, u16) },

    #[error("failed to build font: {0}")]
    Build(#[from] BuilderError),
}

/// Coarse classification of [`Error`], one per failure the caller may want to
/// report distinctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedTable,
    FeatureNotFound,
    IncompatibleLookupFlags,
    EncodingOverflow,
    NameTableMissing,
    InvalidInput,
    Build,
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub(crate) fn overflow(what: &'static str, value: usize) -> Self {
        Self::EncodingOverflow { what, value }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(_) | Self::Malformed(_) | Self::NoGsub => ErrorKind::MalformedTable,
            Self::NameTableMissing => ErrorKind::NameTableMissing,
            Self::FeatureNotFound { .. } => ErrorKind::FeatureNotFound,
            Self::IncompatibleLookupFlags { .. } => ErrorKind::IncompatibleLookupFlags,
            Self::EncodingOverflow { .. } => ErrorKind::EncodingOverflow,
            Self::InvalidTag(_) | Self::UnencodableName { .. } => ErrorKind::InvalidInput,
            Self::Build(_) => ErrorKind::Build,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MalformedTable => "malformed table",
            Self::FeatureNotFound => "feature not found",
            Self::IncompatibleLookupFlags => "incompatible lookup flags",
            Self::EncodingOverflow => "encoding overflow",
            Self::NameTableMissing => "name table missing",
            Self::InvalidInput => "invalid input",
            Self::Build => "font build failed",
        })
    }
}

pub type Result<T> = result::Result<T, Error>;
