//! Merge configuration and results.

use std::fmt::{self, Formatter};

use read_fonts::types::Tag;

use crate::{
    Result,
    merge::MergeReport,
    model::{FeatureIndex, LangSysKey, LayoutTable, LookupIndex},
    names::{DEFAULT_SUFFIX, RenameReport},
    resolve::parse_tags,
};

/// Options controlling which features are merged and how the font is renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    pub features: Vec<String>,
    pub suffix: String,
    /// Rewrite family names with `suffix`.
    pub rename: bool,
    /// Set the description record (name ID 10).
    pub description: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            suffix: DEFAULT_SUFFIX.to_owned(),
            rename: true,
            description: true,
        }
    }
}

impl MergeOptions {
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_suffix_opt<S: Into<String>>(mut self, suffix: Option<S>) -> Self {
        if let Some(suffix) = suffix {
            self.suffix = suffix.into();
        }
        self
    }

    pub fn with_keep_names(mut self) -> Self {
        self.rename = false;
        self
    }

    pub fn with_keep_names_if(mut self, on: bool) -> Self {
        self.rename &= !on;
        self
    }

    pub fn without_description(mut self) -> Self {
        self.description = false;
        self
    }

    pub fn with_description_if(mut self, on: bool) -> Self {
        self.description = on;
        self
    }

    /// Requested features as tags, in request order without duplicates.
    pub fn feature_tags(&self) -> Result<Vec<Tag>> {
        parse_tags(&self.features)
    }
}

/// Result of merging features into `calt`.
#[derive(Debug, Clone)]
pub struct MergeResult {
    pub data: Vec<u8>,
    pub stats: MergeStats,
    pub report: MergeReport,
    pub rename: Option<RenameReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub features_requested: usize,
    pub language_systems: usize,
    pub lookups_added: usize,
    pub features_added: usize,
}

impl MergeStats {
    pub(crate) fn new(features_requested: usize, report: &MergeReport) -> Self {
        Self {
            features_requested,
            language_systems: report.pairs_changed(),
            lookups_added: report.lookups_added(),
            features_added: report.features_added,
        }
    }
}

impl fmt::Display for MergeStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "merged {} features into calt, {} lookups added across {} language systems",
            self.features_requested, self.lookups_added, self.language_systems
        )
    }
}

/// One feature as seen from a language system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSummary {
    pub index: FeatureIndex,
    pub tag: Tag,
    pub lookups: Vec<LookupIndex>,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangSysSummary {
    pub key: LangSysKey,
    pub features: Vec<FeatureSummary>,
}

/// Language systems and features available in a font.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontReport {
    pub language_systems: Vec<LangSysSummary>,
    pub features: Vec<String>,
}

impl FontReport {
    pub(crate) fn from_layout(table: &LayoutTable) -> Self {
        let language_systems = table
            .lang_systems()
            .map(|(key, ls)| LangSysSummary {
                key,
                features: ls
                    .active_features()
                    .filter_map(|index| {
                        let feature = table.feature(index)?;
                        Some(FeatureSummary {
                            index,
                            tag: feature.tag,
                            lookups: feature.lookup_indices.clone(),
                            required: ls.required_feature == Some(index),
                        })
                    })
                    .collect(),
            })
            .collect();
        Self { language_systems, features: table.feature_tags() }
    }
}

impl fmt::Display for FontReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Scripts and languages:")?;
        for ls in &self.language_systems {
            writeln!(f, "{}", ls.key)?;
            for feature in &ls.features {
                let lookups: Vec<_> = feature.lookups.iter().map(ToString::to_string).collect();
                let required = if feature.required { " (required)" } else { "" };
                writeln!(
                    f,
                    "  [{}] {}{required}: {}",
                    feature.index,
                    feature.tag,
                    lookups.join(" ")
                )?;
            }
        }
        writeln!(f, "# Features:")?;
        write!(f, "-f {}", self.features.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let options = MergeOptions::new(["ss13", "ss15"]);
        assert_eq!(options.suffix, "Custom");
        assert!(options.rename);
        assert!(options.description);
    }

    #[test]
    fn test_options_builders() {
        let options = MergeOptions::new(["ss13"])
            .with_suffix_opt(Some("Term"))
            .with_keep_names_if(false)
            .with_description_if(false);
        assert_eq!(options.suffix, "Term");
        assert!(options.rename);
        assert!(!options.description);

        let options = MergeOptions::new(["ss13"]).with_suffix_opt(None::<String>).with_keep_names();
        assert_eq!(options.suffix, "Custom");
        assert!(!options.rename);
    }

    #[test]
    fn test_feature_tags_dedup() {
        let options = MergeOptions::new(["ss15", "ss13", "ss15"]);
        assert_eq!(options.feature_tags().unwrap(), [Tag::new(b"ss15"), Tag::new(b"ss13")]);
    }

    #[test]
    fn test_stats_display() {
        let stats = MergeStats {
            features_requested: 2,
            language_systems: 3,
            lookups_added: 4,
            features_added: 0,
        };
        assert_eq!(
            stats.to_string(),
            "merged 2 features into calt, 4 lookups added across 3 language systems"
        );
    }
}
