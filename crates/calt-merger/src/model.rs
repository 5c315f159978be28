//! In-memory model of a GSUB table.
//!
//! Structural relationships are held as indices into owned vectors. Byte
//! offsets exist only in the codec.

use std::fmt;

use read_fonts::{
    tables::layout::LookupFlag,
    types::{GlyphId16, Tag},
};

use crate::{Error, Result};

pub const CALT: Tag = Tag::new(b"calt");

const IGNORE_MARKS: u16 = 0x0008;
const MARK_ATTACHMENT_TYPE_MASK: u16 = 0xFF00;

/// Index into the feature list
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureIndex(pub u16);

impl FeatureIndex {
    pub fn new(idx: u16) -> Self {
        Self(idx)
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }

    fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into the lookup list, which is also the lookup's execution position
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LookupIndex(pub u16);

impl LookupIndex {
    pub fn new(idx: u16) -> Self {
        Self(idx)
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }

    fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LookupIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one language system: a script plus a language, where `None`
/// is the script's default language system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LangSysKey {
    pub script: Tag,
    pub lang: Option<Tag>,
}

impl LangSysKey {
    pub fn new(script: Tag, lang: Option<Tag>) -> Self {
        Self { script, lang }
    }

    pub fn dflt(script: Tag) -> Self {
        Self { script, lang: None }
    }
}

impl fmt::Display for LangSysKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lang {
            Some(lang) => write!(f, "{}/{}", self.script, lang),
            None => write!(f, "{}/dflt", self.script),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LangSys {
    pub required_feature: Option<FeatureIndex>,
    pub feature_indices: Vec<FeatureIndex>,
}

impl LangSys {
    pub fn new(feature_indices: Vec<FeatureIndex>) -> Self {
        Self { required_feature: None, feature_indices }
    }

    /// All features active for this language system, required feature first.
    pub fn active_features(&self) -> impl Iterator<Item = FeatureIndex> + '_ {
        self.required_feature.into_iter().chain(self.feature_indices.iter().copied())
    }

    pub fn references(&self, feature: FeatureIndex) -> bool {
        self.active_features().any(|f| f == feature)
    }

    /// Point every reference to `from` at `to`.
    pub(crate) fn repoint(&mut self, from: FeatureIndex, to: FeatureIndex) {
        if self.required_feature == Some(from) {
            self.required_feature = Some(to);
        }
        for idx in self.feature_indices.iter_mut().filter(|i| **i == from) {
            *idx = to;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LangSysRecord {
    pub tag: Tag,
    pub lang_sys: LangSys,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptRecord {
    pub tag: Tag,
    pub default_lang_sys: Option<LangSys>,
    pub lang_sys: Vec<LangSysRecord>,
}

impl ScriptRecord {
    /// Language systems of this script in table order, default first.
    pub fn lang_systems(&self) -> impl Iterator<Item = (LangSysKey, &LangSys)> + '_ {
        let script = self.tag;
        self.default_lang_sys
            .iter()
            .map(move |ls| (LangSysKey::dflt(script), ls))
            .chain(
                self.lang_sys
                    .iter()
                    .map(move |r| (LangSysKey::new(script, Some(r.tag)), &r.lang_sys)),
            )
    }

    fn lang_systems_mut(&mut self) -> impl Iterator<Item = (LangSysKey, &mut LangSys)> + '_ {
        let script = self.tag;
        self.default_lang_sys
            .iter_mut()
            .map(move |ls| (LangSysKey::dflt(script), ls))
            .chain(
                self.lang_sys
                    .iter_mut()
                    .map(move |r| (LangSysKey::new(script, Some(r.tag)), &mut r.lang_sys)),
            )
    }
}

/// Raw FeatureParams bytes, carried through untouched.
pub type FeatureParams = Vec<u8>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureRecord {
    pub tag: Tag,
    pub params: Option<FeatureParams>,
    pub lookup_indices: Vec<LookupIndex>,
}

impl FeatureRecord {
    pub fn new(tag: Tag, lookup_indices: Vec<LookupIndex>) -> Self {
        Self { tag, params: None, lookup_indices }
    }

    pub fn contains(&self, lookup: LookupIndex) -> bool {
        self.lookup_indices.contains(&lookup)
    }
}

/// GSUB lookup types, with extension lookups already unwrapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Single,
    Multiple,
    Alternate,
    Ligature,
    Context,
    ChainContext,
    ReverseChain,
}

impl LookupKind {
    pub fn class(self) -> LookupClass {
        match self {
            Self::Single | Self::Multiple | Self::Alternate => LookupClass::ContextFree,
            Self::Ligature => LookupClass::Ligature,
            Self::Context | Self::ChainContext | Self::ReverseChain => LookupClass::Contextual,
        }
    }

    pub fn is_contextual(self) -> bool {
        self.class() == LookupClass::Contextual
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Single => "single",
            Self::Multiple => "multiple",
            Self::Alternate => "alternate",
            Self::Ligature => "ligature",
            Self::Context => "context",
            Self::ChainContext => "chain-context",
            Self::ReverseChain => "reverse-chain",
        })
    }
}

/// How a lookup behaves once it runs at its position in the lookup list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LookupClass {
    /// One input glyph, no surrounding context.
    ContextFree,
    /// Matches a glyph sequence, but no context outside it.
    Ligature,
    /// Depends on backtrack, input or lookahead state.
    Contextual,
}

impl fmt::Display for LookupClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ContextFree => "context-free",
            Self::Ligature => "ligature",
            Self::Contextual => "contextual",
        })
    }
}

/// Which marks a lookup can see while matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkVisibility {
    All,
    /// Restricted by a mark filtering set or a mark attachment class.
    Filtered,
    /// IGNORE_MARKS is set.
    Ignored,
}

impl fmt::Display for MarkVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "sees all marks",
            Self::Filtered => "sees filtered marks",
            Self::Ignored => "ignores marks",
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Coverage(pub Vec<GlyphId16>);

impl Coverage {
    pub fn glyphs(&self) -> &[GlyphId16] {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ligature {
    pub components: Vec<GlyphId16>,
    pub glyph: GlyphId16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LigatureSubst {
    pub coverage: Coverage,
    pub ligatures: Vec<Ligature>,
}

/// One position of a context rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GlyphSet {
    Glyph(GlyphId16),
    Class(u16),
    Coverage(Coverage),
}

/// A lookup applied by a context rule once the whole context matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NestedLookup {
    pub sequence_index: u16,
    pub lookup: LookupIndex,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextRule {
    pub backtrack: Vec<GlyphSet>,
    pub input: Vec<GlyphSet>,
    pub lookahead: Vec<GlyphSet>,
    pub lookups: Vec<NestedLookup>,
}

/// Contextual or chained contextual substitution. Plain contextual rules
/// have empty backtrack and lookahead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextSubst {
    pub format: u16,
    pub rules: Vec<ContextRule>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Subtable {
    /// Single, multiple and alternate substitution.
    Simple(Coverage),
    Ligature(LigatureSubst),
    Context(ContextSubst),
    /// Kept only as bytes in the retained region.
    PassThrough { kind: LookupKind, format: u16 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lookup {
    pub kind: LookupKind,
    pub flag: LookupFlag,
    pub mark_filtering_set: Option<u16>,
    pub extension: bool,
    pub subtables: Vec<Subtable>,
}

impl Lookup {
    pub fn visibility(&self) -> MarkVisibility {
        let bits = self.flag.to_bits();
        if bits & IGNORE_MARKS != 0 {
            MarkVisibility::Ignored
        } else if self.mark_filtering_set.is_some() || bits & MARK_ATTACHMENT_TYPE_MASK != 0 {
            MarkVisibility::Filtered
        } else {
            MarkVisibility::All
        }
    }

    /// Lookups applied from this lookup's context rules.
    pub fn nested_lookups(&self) -> impl Iterator<Item = NestedLookup> + '_ {
        self.subtables
            .iter()
            .filter_map(|s| match s {
                Subtable::Context(ctx) => Some(ctx),
                _ => None,
            })
            .flat_map(|ctx| ctx.rules.iter())
            .flat_map(|rule| rule.lookups.iter().copied())
    }
}

/// The part of the table that is re-emitted verbatim: the LookupList and
/// the FeatureVariations table with everything they reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RetainedRegion {
    pub(crate) bytes: Vec<u8>,
    pub(crate) lookup_list: usize,
    pub(crate) feature_variations: Option<usize>,
}

/// The lists as they were decoded, for byte-exact re-encoding when nothing
/// changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Source {
    pub(crate) bytes: Vec<u8>,
    pub(crate) scripts: Vec<ScriptRecord>,
    pub(crate) features: Vec<FeatureRecord>,
}

/// A decoded GSUB table.
///
/// Scripts and features can be edited. Lookups are read-only: their position
/// in the list is their execution order, so nothing may reorder them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutTable {
    pub(crate) version: (u16, u16),
    pub(crate) scripts: Vec<ScriptRecord>,
    pub(crate) features: Vec<FeatureRecord>,
    pub(crate) lookups: Vec<Lookup>,
    pub(crate) retained: RetainedRegion,
    pub(crate) source: Option<Source>,
}

impl LayoutTable {
    pub fn version(&self) -> (u16, u16) {
        self.version
    }

    pub fn scripts(&self) -> &[ScriptRecord] {
        &self.scripts
    }

    pub fn features(&self) -> &[FeatureRecord] {
        &self.features
    }

    pub fn lookups(&self) -> &[Lookup] {
        &self.lookups
    }

    pub fn feature(&self, idx: FeatureIndex) -> Option<&FeatureRecord> {
        self.features.get(idx.as_usize())
    }

    pub fn feature_mut(&mut self, idx: FeatureIndex) -> Option<&mut FeatureRecord> {
        self.features.get_mut(idx.as_usize())
    }

    pub fn lookup(&self, idx: LookupIndex) -> Option<&Lookup> {
        self.lookups.get(idx.as_usize())
    }

    /// Bytes of the LookupList as found in the source table.
    pub fn lookup_list_bytes(&self) -> &[u8] {
        let end = self
            .retained
            .feature_variations
            .filter(|&fv| fv > self.retained.lookup_list)
            .unwrap_or(self.retained.bytes.len());
        &self.retained.bytes[self.retained.lookup_list..end]
    }

    /// Every language system in table order.
    pub fn lang_systems(&self) -> impl Iterator<Item = (LangSysKey, &LangSys)> + '_ {
        self.scripts.iter().flat_map(ScriptRecord::lang_systems)
    }

    pub fn lang_sys(&self, key: &LangSysKey) -> Option<&LangSys> {
        self.lang_systems().find(|(k, _)| k == key).map(|(_, ls)| ls)
    }

    pub fn lang_sys_mut(&mut self, key: &LangSysKey) -> Option<&mut LangSys> {
        self.scripts
            .iter_mut()
            .flat_map(ScriptRecord::lang_systems_mut)
            .find(|(k, _)| k == key)
            .map(|(_, ls)| ls)
    }

    /// Language systems that activate `feature`.
    pub fn referencing(&self, feature: FeatureIndex) -> Vec<LangSysKey> {
        self.lang_systems()
            .filter(|(_, ls)| ls.references(feature))
            .map(|(k, _)| k)
            .collect()
    }

    /// The first active feature with `tag` in a language system.
    pub fn find_active(&self, key: &LangSysKey, tag: Tag) -> Option<FeatureIndex> {
        self.lang_sys(key)?
            .active_features()
            .find(|&i| self.feature(i).is_some_and(|f| f.tag == tag))
    }

    /// Append a feature record. Existing feature indices never change.
    pub fn push_feature(&mut self, record: FeatureRecord) -> Result<FeatureIndex> {
        let idx = self.features.len();
        // 0xFFFF is the "no required feature" sentinel
        if idx >= 0xFFFF {
            return Err(Error::overflow("FeatureList count", idx + 1));
        }
        self.features.push(record);
        Ok(FeatureIndex::new(idx as u16))
    }

    /// Sorted, de-duplicated feature tags.
    pub fn feature_tags(&self) -> Vec<String> {
        let mut tags: Vec<_> = self.features.iter().map(|f| f.tag.to_string()).collect();
        tags.sort();
        tags.dedup();
        tags
    }

    /// Check every index reference against the list it points into.
    pub fn validate(&self) -> Result<()> {
        let feature_count = self.features.len();
        for (key, ls) in self.lang_systems() {
            if let Some(bad) = ls.active_features().find(|f| f.as_usize() >= feature_count) {
                return Err(Error::malformed(format!(
                    "{key} references feature {bad} of {feature_count}"
                )));
            }
        }
        let lookup_count = self.lookups.len();
        for feature in &self.features {
            if let Some(bad) = feature.lookup_indices.iter().find(|l| l.as_usize() >= lookup_count)
            {
                return Err(Error::malformed(format!(
                    "feature '{}' references lookup {bad} of {lookup_count}",
                    feature.tag
                )));
            }
        }
        for (i, lookup) in self.lookups.iter().enumerate() {
            if let Some(bad) = lookup.nested_lookups().find(|n| n.lookup.as_usize() >= lookup_count)
            {
                return Err(Error::malformed(format!(
                    "lookup {i} applies lookup {} of {lookup_count}",
                    bad.lookup
                )));
            }
        }
        Ok(())
    }

    /// A table with an empty retained region, for tests that never encode
    /// the lookup list.
    #[cfg(test)]
    pub(crate) fn from_parts(
        scripts: Vec<ScriptRecord>,
        features: Vec<FeatureRecord>,
        lookups: Vec<Lookup>,
    ) -> Self {
        Self {
            version: (1, 0),
            scripts,
            features,
            lookups,
            retained: RetainedRegion { bytes: vec![0, 0], lookup_list: 0, feature_variations: None },
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lang_sys_key_display() {
        let latn = Tag::new(b"latn");
        assert_eq!(LangSysKey::dflt(latn).to_string(), "latn/dflt");
        assert_eq!(LangSysKey::new(latn, Some(Tag::new(b"TRK "))).to_string(), "latn/TRK ");
    }

    #[test]
    fn test_active_features_required_first() {
        let ls = LangSys {
            required_feature: Some(FeatureIndex(4)),
            feature_indices: vec![FeatureIndex(1), FeatureIndex(2)],
        };
        let active: Vec<_> = ls.active_features().collect();
        assert_eq!(active, [FeatureIndex(4), FeatureIndex(1), FeatureIndex(2)]);
    }

    #[test]
    fn test_repoint_replaces_all_references() {
        let mut ls = LangSys {
            required_feature: Some(FeatureIndex(1)),
            feature_indices: vec![FeatureIndex(0), FeatureIndex(1)],
        };
        ls.repoint(FeatureIndex(1), FeatureIndex(7));
        assert_eq!(ls.required_feature, Some(FeatureIndex(7)));
        assert_eq!(ls.feature_indices, [FeatureIndex(0), FeatureIndex(7)]);
    }

    #[test]
    fn test_visibility_from_flags() {
        let lookup = |bits: u16, mfs: Option<u16>| Lookup {
            kind: LookupKind::Single,
            flag: LookupFlag::from_bits_truncate(bits),
            mark_filtering_set: mfs,
            extension: false,
            subtables: vec![],
        };
        assert_eq!(lookup(0, None).visibility(), MarkVisibility::All);
        assert_eq!(lookup(0x0001, None).visibility(), MarkVisibility::All);
        assert_eq!(lookup(0x0008, None).visibility(), MarkVisibility::Ignored);
        assert_eq!(lookup(0x0010, Some(0)).visibility(), MarkVisibility::Filtered);
        assert_eq!(lookup(0x0100, None).visibility(), MarkVisibility::Filtered);
    }

    #[test]
    fn test_kind_classes() {
        assert_eq!(LookupKind::Multiple.class(), LookupClass::ContextFree);
        assert_eq!(LookupKind::Ligature.class(), LookupClass::Ligature);
        assert!(LookupKind::ChainContext.is_contextual());
        assert!(LookupKind::ReverseChain.is_contextual());
        assert!(!LookupKind::Alternate.is_contextual());
    }
}
