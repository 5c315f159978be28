//! Fixture fonts built in memory.
#![allow(dead_code)]

use read_fonts::types::{GlyphId16, NameId, Tag};
use write_fonts::{
    FontBuilder,
    tables::{
        gsub::{Gsub, SingleSubst, SubstitutionChainContext, SubstitutionLookup, SubstitutionLookupList},
        layout::{
            ChainedSequenceContext, ChainedSequenceContextFormat3, CoverageTable, Feature,
            FeatureList, FeatureRecord, LangSys, LangSysRecord, Lookup, LookupFlag, Script,
            ScriptList, ScriptRecord, SequenceLookupRecord,
        },
        name::{Name, NameRecord},
    },
};

pub const FAMILY: &str = "PragmataPro Liga";

/// A language system: script, language (`None` for the default) and its
/// feature indices.
pub type LangSysDef<'a> = (&'a [u8; 4], Option<&'a [u8; 4]>, &'a [u16]);

pub fn single(flag: LookupFlag, glyph: u16) -> SubstitutionLookup {
    let coverage = CoverageTable::format_1(vec![GlyphId16::new(glyph)]);
    SubstitutionLookup::Single(Lookup::new(flag, vec![SingleSubst::format_1(coverage, 1)]))
}

/// A chaining context lookup applying `applies` at the first input position.
pub fn chain(flag: LookupFlag, applies: u16) -> SubstitutionLookup {
    let context = ChainedSequenceContextFormat3::new(
        vec![],
        vec![CoverageTable::format_1(vec![GlyphId16::new(1)])],
        vec![],
        vec![SequenceLookupRecord::new(0, applies)],
    );
    SubstitutionLookup::ChainContextual(Lookup::new(
        flag,
        vec![SubstitutionChainContext::from(ChainedSequenceContext::Format3(context))],
    ))
}

pub fn simple_lookups(count: u16) -> Vec<SubstitutionLookup> {
    (0..count).map(|i| single(LookupFlag::empty(), i + 10)).collect()
}

pub fn gsub(
    lang_systems: &[LangSysDef],
    features: &[(&[u8; 4], &[u16])],
    lookups: Vec<SubstitutionLookup>,
) -> Gsub {
    let mut scripts: Vec<(Tag, Option<LangSys>, Vec<LangSysRecord>)> = Vec::new();
    for &(script, lang, indices) in lang_systems {
        let tag = Tag::new(script);
        let pos = match scripts.iter().position(|(t, ..)| *t == tag) {
            Some(pos) => pos,
            None => {
                scripts.push((tag, None, Vec::new()));
                scripts.len() - 1
            }
        };
        let mut lang_sys = LangSys::new(indices.to_vec());
        lang_sys.required_feature_index = 0xFFFF;
        match lang {
            Some(lang) => scripts[pos].2.push(LangSysRecord::new(Tag::new(lang), lang_sys)),
            None => scripts[pos].1 = Some(lang_sys),
        }
    }
    let script_records = scripts
        .into_iter()
        .map(|(tag, dflt, langs)| ScriptRecord::new(tag, Script::new(dflt, langs)))
        .collect();
    let feature_records = features
        .iter()
        .map(|(tag, lookups)| FeatureRecord::new(Tag::new(tag), Feature::new(None, lookups.to_vec())))
        .collect();
    Gsub::new(
        ScriptList::new(script_records),
        FeatureList::new(feature_records),
        SubstitutionLookupList::new(lookups),
    )
}

/// Family, subfamily, unique ID, full name and PostScript name on the Mac
/// and Windows platforms.
pub fn name(family: &str) -> Name {
    let ps = family.replace(' ', "");
    let mut records = Vec::new();
    for (platform, encoding, language) in [(1, 0, 0), (3, 1, 0x409)] {
        for (id, value) in [
            (1, family.to_owned()),
            (2, "Regular".to_owned()),
            (3, format!("1.000;TEST;{ps}-Regular")),
            (4, format!("{family} Regular")),
            (5, "Version 1.000".to_owned()),
            (6, format!("{ps}-Regular")),
        ] {
            records.push(NameRecord::new(
                platform,
                encoding,
                language,
                NameId::new(id),
                value.into(),
            ));
        }
    }
    Name::new(records)
}

/// A minimal `head`: version 1.0, magic number, 1000 units per em.
pub fn head() -> Vec<u8> {
    let mut head = vec![0u8; 54];
    head[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    head[12..16].copy_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
    head[18..20].copy_from_slice(&1000u16.to_be_bytes());
    head
}

pub const OPAQUE_TAG: Tag = Tag::new(b"TEST");
pub const OPAQUE_DATA: &[u8] = b"opaque table carried through untouched";

pub fn font(gsub: Option<&Gsub>, name: Option<&Name>) -> Vec<u8> {
    let mut builder = FontBuilder::new();
    builder.add_raw(Tag::new(b"head"), head());
    builder.add_raw(OPAQUE_TAG, OPAQUE_DATA);
    if let Some(gsub) = gsub {
        builder.add_table(gsub).unwrap();
    }
    if let Some(name) = name {
        builder.add_table(name).unwrap();
    }
    builder.build()
}

/// A font whose name table is given as raw bytes, for tables write-fonts
/// cannot produce.
pub fn font_with_raw_name(gsub: &Gsub, name: &[u8]) -> Vec<u8> {
    let mut builder = FontBuilder::new();
    builder.add_raw(Tag::new(b"head"), head());
    builder.add_table(gsub).unwrap();
    builder.add_raw(Tag::new(b"name"), name.to_vec());
    builder.build()
}

/// Point the directory record of `tag` at `offset`.
pub fn set_table_offset(data: &mut [u8], tag: Tag, offset: u32) {
    let num_tables = u16::from_be_bytes([data[4], data[5]]) as usize;
    let record = (0..num_tables)
        .map(|i| 12 + i * 16)
        .find(|&rec| data[rec..rec + 4] == tag.to_be_bytes())
        .unwrap();
    data[record + 8..record + 12].copy_from_slice(&offset.to_be_bytes());
}

/// `calt` = [2, 5] and `ss13` = [7] in every language system.
pub fn pragmata_gsub() -> Gsub {
    gsub(
        &[
            (b"DFLT", None, &[0, 1]),
            (b"latn", None, &[0, 1]),
            (b"latn", Some(b"TRK "), &[0, 1]),
        ],
        &[(b"calt", &[2, 5]), (b"ss13", &[7])],
        simple_lookups(8),
    )
}

pub fn pragmata() -> Vec<u8> {
    font(Some(&pragmata_gsub()), Some(&name(FAMILY)))
}
