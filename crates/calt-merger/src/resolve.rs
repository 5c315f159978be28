//! Resolve feature tags to the lookups they activate per language system.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::debug;
use read_fonts::types::Tag;

use crate::{
    Error, Result,
    model::{LangSysKey, LayoutTable, LookupIndex},
};

/// Lookups reachable from the requested features, per language system in
/// table order. Language systems without any requested feature are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    pub requested: Vec<Tag>,
    pub pairs: IndexMap<LangSysKey, BTreeSet<LookupIndex>>,
}

impl Resolution {
    pub fn iter(&self) -> impl Iterator<Item = (&LangSysKey, &BTreeSet<LookupIndex>)> {
        self.pairs.iter()
    }
}

pub struct FeatureResolver<'a> {
    table: &'a LayoutTable,
}

impl<'a> FeatureResolver<'a> {
    pub fn new(table: &'a LayoutTable) -> Self {
        Self { table }
    }

    /// Fails with [`Error::FeatureNotFound`] for the first requested tag that
    /// no language system activates.
    pub fn resolve(&self, requested: &[Tag]) -> Result<Resolution> {
        let mut pairs: IndexMap<LangSysKey, BTreeSet<LookupIndex>> = IndexMap::new();
        let mut found = BTreeSet::new();

        for (key, ls) in self.table.lang_systems() {
            let mut lookups = BTreeSet::new();
            for idx in ls.active_features() {
                let Some(feature) = self.table.feature(idx) else { continue };
                if requested.contains(&feature.tag) {
                    found.insert(feature.tag);
                    lookups.extend(feature.lookup_indices.iter().copied());
                }
            }
            if !lookups.is_empty() {
                debug!("{key}: resolved lookups {lookups:?}");
                pairs.entry(key).or_default().extend(lookups);
            }
        }

        if let Some(&tag) = requested.iter().find(|t| !found.contains(*t)) {
            return Err(Error::FeatureNotFound { tag, available: self.table.feature_tags() });
        }

        Ok(Resolution { requested: requested.to_vec(), pairs })
    }
}

/// Parse feature tags, rejecting anything that is not 1 to 4 printable ASCII
/// characters.
pub fn parse_tags<I, S>(features: I) -> Result<Vec<Tag>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags = Vec::new();
    for feature in features {
        let feature = feature.as_ref();
        let tag = Tag::new_checked(feature.as_bytes())
            .map_err(|_| Error::InvalidTag(feature.to_owned()))?;
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags_dedups_in_order() {
        let tags = parse_tags(["ss13", "ss15", "ss13"]).unwrap();
        assert_eq!(tags, [Tag::new(b"ss13"), Tag::new(b"ss15")]);
    }

    #[test]
    fn test_parse_tags_pads_short_tags() {
        assert_eq!(parse_tags(["cv1"]).unwrap(), [Tag::new(b"cv1 ")]);
    }

    #[test]
    fn test_parse_tags_rejects_invalid() {
        assert!(matches!(parse_tags(["ss013"]), Err(Error::InvalidTag(t)) if t == "ss013"));
        assert!(matches!(parse_tags([""]), Err(Error::InvalidTag(_))));
        assert!(matches!(parse_tags(["ss\u{e9}"]), Err(Error::InvalidTag(_))));
    }
}
