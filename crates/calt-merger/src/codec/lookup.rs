//! Read-only decoding of GSUB lookups into the model.

use read_fonts::{
    ReadError,
    tables::{
        gsub::{SingleSubst, SubstitutionLookup, SubstitutionLookupList, SubstitutionSubtables},
        layout::{
            ChainedSequenceContext, CoverageTable, SequenceContext, SequenceLookupRecord,
        },
    },
    types::{BigEndian, GlyphId16},
};

use crate::{
    Result,
    model::{
        ContextRule, ContextSubst, Coverage, GlyphSet, Ligature, LigatureSubst, Lookup,
        LookupIndex, LookupKind, NestedLookup, Subtable,
    },
};

const EXTENSION_LOOKUP_TYPE: u16 = 7;

pub(super) fn decode_lookups(list: &SubstitutionLookupList) -> Result<Vec<Lookup>> {
    list.lookups().iter().map(|lookup| decode_lookup(&lookup?)).collect()
}

fn decode_lookup(lookup: &SubstitutionLookup) -> Result<Lookup> {
    let (kind, subtables) = match lookup.subtables()? {
        SubstitutionSubtables::Single(tables) => (
            LookupKind::Single,
            tables
                .iter()
                .map(|t| {
                    let coverage = match t? {
                        SingleSubst::Format1(f) => f.coverage()?,
                        SingleSubst::Format2(f) => f.coverage()?,
                    };
                    Ok(Subtable::Simple(coverage_glyphs(&coverage)))
                })
                .collect::<Result<_>>()?,
        ),
        SubstitutionSubtables::Multiple(tables) => (
            LookupKind::Multiple,
            tables
                .iter()
                .map(|t| Ok(Subtable::Simple(coverage_glyphs(&t?.coverage()?))))
                .collect::<Result<_>>()?,
        ),
        SubstitutionSubtables::Alternate(tables) => (
            LookupKind::Alternate,
            tables
                .iter()
                .map(|t| Ok(Subtable::Simple(coverage_glyphs(&t?.coverage()?))))
                .collect::<Result<_>>()?,
        ),
        SubstitutionSubtables::Ligature(tables) => (
            LookupKind::Ligature,
            tables
                .iter()
                .map(|t| {
                    let t = t?;
                    let coverage = coverage_glyphs(&t.coverage()?);
                    let mut ligatures = Vec::new();
                    for (first, set) in coverage.glyphs().iter().zip(t.ligature_sets().iter()) {
                        for lig in set?.ligatures().iter() {
                            let lig = lig?;
                            ligatures.push(Ligature {
                                components: std::iter::once(*first)
                                    .chain(glyphs(lig.component_glyph_ids()))
                                    .collect(),
                                glyph: lig.ligature_glyph(),
                            });
                        }
                    }
                    Ok(Subtable::Ligature(LigatureSubst { coverage, ligatures }))
                })
                .collect::<Result<_>>()?,
        ),
        SubstitutionSubtables::Contextual(tables) => (
            LookupKind::Context,
            tables
                .iter()
                .map(|t| Ok(Subtable::Context(decode_sequence_context(&t?)?)))
                .collect::<Result<_>>()?,
        ),
        SubstitutionSubtables::ChainContextual(tables) => (
            LookupKind::ChainContext,
            tables
                .iter()
                .map(|t| Ok(Subtable::Context(decode_chained_context(&t?)?)))
                .collect::<Result<_>>()?,
        ),
        SubstitutionSubtables::Reverse(tables) => (
            LookupKind::ReverseChain,
            tables
                .iter()
                .map(|t| {
                    t?;
                    Ok(Subtable::PassThrough { kind: LookupKind::ReverseChain, format: 1 })
                })
                .collect::<Result<_>>()?,
        ),
    };

    Ok(Lookup {
        kind,
        flag: lookup.lookup_flag(),
        mark_filtering_set: lookup.mark_filtering_set(),
        extension: lookup.lookup_type() == EXTENSION_LOOKUP_TYPE,
        subtables,
    })
}

fn coverage_glyphs(coverage: &CoverageTable) -> Coverage {
    Coverage(coverage.iter().collect())
}

fn glyphs(ids: &[BigEndian<GlyphId16>]) -> impl Iterator<Item = GlyphId16> + '_ {
    ids.iter().map(|g| g.get())
}

fn glyph_sets(ids: &[BigEndian<GlyphId16>]) -> Vec<GlyphSet> {
    glyphs(ids).map(GlyphSet::Glyph).collect()
}

fn class_sets(classes: &[BigEndian<u16>]) -> Vec<GlyphSet> {
    classes.iter().map(|c| GlyphSet::Class(c.get())).collect()
}

fn coverage_sets<'a>(
    coverages: impl Iterator<Item = std::result::Result<CoverageTable<'a>, ReadError>>,
) -> Result<Vec<GlyphSet>> {
    coverages.map(|c| Ok(GlyphSet::Coverage(coverage_glyphs(&c?)))).collect()
}

fn nested(records: &[SequenceLookupRecord]) -> Vec<NestedLookup> {
    records
        .iter()
        .map(|r| NestedLookup {
            sequence_index: r.sequence_index(),
            lookup: LookupIndex::new(r.lookup_list_index()),
        })
        .collect()
}

/// Prepend the glyph or class a rule set is keyed by to a rule's input.
fn keyed_input(first: GlyphSet, rest: Vec<GlyphSet>) -> Vec<GlyphSet> {
    std::iter::once(first).chain(rest).collect()
}

fn decode_sequence_context(ctx: &SequenceContext) -> Result<ContextSubst> {
    let mut rules = Vec::new();
    let format = match ctx {
        SequenceContext::Format1(f1) => {
            let coverage = f1.coverage()?;
            for (first, set) in coverage.iter().zip(f1.seq_rule_sets().iter()) {
                let Some(set) = set.transpose()? else { continue };
                for rule in set.seq_rules().iter() {
                    let rule = rule?;
                    rules.push(ContextRule {
                        input: keyed_input(GlyphSet::Glyph(first), glyph_sets(rule.input_sequence())),
                        lookups: nested(rule.seq_lookup_records()),
                        ..Default::default()
                    });
                }
            }
            1
        }
        SequenceContext::Format2(f2) => {
            for (class, set) in f2.class_seq_rule_sets().iter().enumerate() {
                let Some(set) = set.transpose()? else { continue };
                for rule in set.class_seq_rules().iter() {
                    let rule = rule?;
                    rules.push(ContextRule {
                        input: keyed_input(
                            GlyphSet::Class(class as u16),
                            class_sets(rule.input_sequence()),
                        ),
                        lookups: nested(rule.seq_lookup_records()),
                        ..Default::default()
                    });
                }
            }
            2
        }
        SequenceContext::Format3(f3) => {
            rules.push(ContextRule {
                input: coverage_sets(f3.coverages().iter())?,
                lookups: nested(f3.seq_lookup_records()),
                ..Default::default()
            });
            3
        }
    };
    Ok(ContextSubst { format, rules })
}

fn decode_chained_context(ctx: &ChainedSequenceContext) -> Result<ContextSubst> {
    let mut rules = Vec::new();
    let format = match ctx {
        ChainedSequenceContext::Format1(f1) => {
            let coverage = f1.coverage()?;
            for (first, set) in coverage.iter().zip(f1.chained_seq_rule_sets().iter()) {
                let Some(set) = set.transpose()? else { continue };
                for rule in set.chained_seq_rules().iter() {
                    let rule = rule?;
                    rules.push(ContextRule {
                        backtrack: glyph_sets(rule.backtrack_sequence()),
                        input: keyed_input(GlyphSet::Glyph(first), glyph_sets(rule.input_sequence())),
                        lookahead: glyph_sets(rule.lookahead_sequence()),
                        lookups: nested(rule.seq_lookup_records()),
                    });
                }
            }
            1
        }
        ChainedSequenceContext::Format2(f2) => {
            for (class, set) in f2.chained_class_seq_rule_sets().iter().enumerate() {
                let Some(set) = set.transpose()? else { continue };
                for rule in set.chained_class_seq_rules().iter() {
                    let rule = rule?;
                    rules.push(ContextRule {
                        backtrack: class_sets(rule.backtrack_sequence()),
                        input: keyed_input(
                            GlyphSet::Class(class as u16),
                            class_sets(rule.input_sequence()),
                        ),
                        lookahead: class_sets(rule.lookahead_sequence()),
                        lookups: nested(rule.seq_lookup_records()),
                    });
                }
            }
            2
        }
        ChainedSequenceContext::Format3(f3) => {
            rules.push(ContextRule {
                backtrack: coverage_sets(f3.backtrack_coverages().iter())?,
                input: coverage_sets(f3.input_coverages().iter())?,
                lookahead: coverage_sets(f3.lookahead_coverages().iter())?,
                lookups: nested(f3.seq_lookup_records()),
            });
            3
        }
    };
    Ok(ContextSubst { format, rules })
}
