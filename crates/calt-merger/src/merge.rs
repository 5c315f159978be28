//! Splice resolved lookups into `calt`.
//!
//! Lookups run in LookupList order no matter which feature names them, so
//! adding an index to `calt` makes it run at its existing position whenever
//! `calt` is on. Nothing here reorders or renumbers lookups, and features are
//! only ever appended.

use std::{collections::BTreeSet, fmt};

use indexmap::IndexMap;
use log::{debug, info};

use crate::{
    Error, Result,
    compat::CompatCheck,
    model::{
        CALT, FeatureIndex, FeatureRecord, LangSysKey, LayoutTable, LookupClass, LookupIndex,
        LookupKind,
    },
    resolve::Resolution,
};

/// What happened to the `calt` feature of one language system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaltAction {
    /// Every lookup was already present.
    Unchanged,
    /// The existing record gained lookups.
    Extended,
    /// The record was shared with language systems needing different
    /// additions; this one now points at an extended copy.
    Split,
    /// The language system had no `calt`; a new record was appended.
    Synthesized,
}

impl fmt::Display for CaltAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unchanged => "unchanged",
            Self::Extended => "extended",
            Self::Split => "split",
            Self::Synthesized => "synthesized",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddedLookup {
    pub lookup: LookupIndex,
    pub kind: LookupKind,
    pub class: LookupClass,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairReport {
    pub key: LangSysKey,
    /// The `calt` feature this language system uses after the merge.
    pub feature: FeatureIndex,
    pub action: CaltAction,
    pub added: Vec<AddedLookup>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub pairs: Vec<PairReport>,
    pub features_added: usize,
    pub warnings: Vec<String>,
}

impl MergeReport {
    pub fn lookups_added(&self) -> usize {
        self.pairs.iter().map(|p| p.added.len()).sum()
    }

    pub fn pairs_changed(&self) -> usize {
        self.pairs.iter().filter(|p| p.action != CaltAction::Unchanged).count()
    }

    pub fn is_unchanged(&self) -> bool {
        self.pairs_changed() == 0
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pair in &self.pairs {
            write!(f, "{}: calt[{}] {}", pair.key, pair.feature, pair.action)?;
            for added in &pair.added {
                write!(f, " +{} ({}, {})", added.lookup, added.kind, added.class)?;
            }
            writeln!(f)?;
        }
        for w in &self.warnings {
            writeln!(f, "warning: {w}")?;
        }
        Ok(())
    }
}

struct Plan {
    key: LangSysKey,
    calt: Option<FeatureIndex>,
    resolved: BTreeSet<LookupIndex>,
    to_add: Vec<LookupIndex>,
}

pub struct LookupMerger<'a> {
    table: &'a mut LayoutTable,
}

impl<'a> LookupMerger<'a> {
    pub fn new(table: &'a mut LayoutTable) -> Self {
        Self { table }
    }

    /// Add every resolved lookup to the `calt` feature of its language
    /// system. Validation runs before any change, so a rejected merge leaves
    /// the table untouched.
    pub fn merge(self, resolution: &Resolution) -> Result<MergeReport> {
        let plans = self.plan(resolution)?;
        let warnings = self.validate(&plans)?;
        let mut report = self.apply(&plans)?;
        report.warnings = warnings;
        Ok(report)
    }

    fn plan(&self, resolution: &Resolution) -> Result<Vec<Plan>> {
        resolution
            .iter()
            .map(|(key, resolved)| {
                if self.table.lang_sys(key).is_none() {
                    return Err(Error::malformed(format!("{key} is not in the ScriptList")));
                }
                let calt = self.table.find_active(key, CALT);
                let present = calt.and_then(|c| self.table.feature(c));
                let to_add = resolved
                    .iter()
                    .copied()
                    .filter(|l| present.is_none_or(|f| !f.contains(*l)))
                    .collect();
                Ok(Plan { key: *key, calt, resolved: resolved.clone(), to_add })
            })
            .collect()
    }

    fn validate(&self, plans: &[Plan]) -> Result<Vec<String>> {
        let mut warnings = Vec::new();
        for plan in plans.iter().filter(|p| !p.to_add.is_empty()) {
            let Some(feature) = plan.calt.and_then(|c| self.table.feature(c)) else {
                continue;
            };
            let existing: BTreeSet<_> = feature
                .lookup_indices
                .iter()
                .copied()
                .filter(|l| !plan.resolved.contains(l))
                .collect();
            warnings.extend(CompatCheck::new(self.table, plan.key, &existing).check(&plan.to_add)?);
        }
        Ok(warnings)
    }

    fn apply(mut self, plans: &[Plan]) -> Result<MergeReport> {
        let mut outcome: IndexMap<LangSysKey, (FeatureIndex, CaltAction)> = IndexMap::new();
        let mut features_added = 0;

        let mut shared: Vec<FeatureIndex> = Vec::new();
        for calt in plans.iter().filter_map(|p| p.calt) {
            if !shared.contains(&calt) {
                shared.push(calt);
            }
        }

        for calt in shared {
            // Language systems not planned against this record need nothing.
            let additions: IndexMap<LangSysKey, &[LookupIndex]> = self
                .table
                .referencing(calt)
                .into_iter()
                .map(|key| {
                    let add = plans
                        .iter()
                        .find(|p| p.key == key && p.calt == Some(calt))
                        .map_or(&[][..], |p| p.to_add.as_slice());
                    (key, add)
                })
                .collect();

            let planned = |key: &LangSysKey| {
                plans.iter().any(|p| p.key == *key && p.calt == Some(calt))
            };

            let mut groups: IndexMap<&[LookupIndex], Vec<LangSysKey>> = IndexMap::new();
            for (key, add) in &additions {
                groups.entry(*add).or_default().push(*key);
            }

            if groups.len() == 1 {
                let Some((add, keys)) = groups.first() else { continue };
                let action = if add.is_empty() {
                    CaltAction::Unchanged
                } else {
                    self.extend(calt, add)?;
                    CaltAction::Extended
                };
                for key in keys.iter().filter(|&k| planned(k)) {
                    outcome.insert(*key, (calt, action));
                }
                continue;
            }

            for (add, keys) in groups {
                if add.is_empty() {
                    for key in keys.into_iter().filter(|k| planned(k)) {
                        outcome.insert(key, (calt, CaltAction::Unchanged));
                    }
                    continue;
                }
                let mut record = self.feature(calt)?.clone();
                record.lookup_indices.extend_from_slice(add);
                let copy = self.table.push_feature(record)?;
                features_added += 1;
                for key in keys {
                    if let Some(ls) = self.table.lang_sys_mut(&key) {
                        ls.repoint(calt, copy);
                    }
                    info!("{key}: split calt feature {calt} into {copy}");
                    outcome.insert(key, (copy, CaltAction::Split));
                }
            }
        }

        let mut missing: IndexMap<&[LookupIndex], Vec<LangSysKey>> = IndexMap::new();
        for plan in plans.iter().filter(|p| p.calt.is_none()) {
            missing.entry(plan.to_add.as_slice()).or_default().push(plan.key);
        }
        for (add, keys) in missing {
            let feature = self.table.push_feature(FeatureRecord::new(CALT, add.to_vec()))?;
            features_added += 1;
            for key in keys {
                if let Some(ls) = self.table.lang_sys_mut(&key) {
                    ls.feature_indices.push(feature);
                }
                info!("{key}: synthesized calt feature {feature}");
                outcome.insert(key, (feature, CaltAction::Synthesized));
            }
        }

        let pairs = plans
            .iter()
            .filter_map(|plan| {
                let &(feature, action) = outcome.get(&plan.key)?;
                Some(PairReport { key: plan.key, feature, action, added: self.describe(plan) })
            })
            .collect();

        Ok(MergeReport { pairs, features_added, warnings: Vec::new() })
    }

    fn feature(&self, idx: FeatureIndex) -> Result<&FeatureRecord> {
        self.table
            .feature(idx)
            .ok_or_else(|| Error::malformed(format!("feature {idx} out of range")))
    }

    fn extend(&mut self, calt: FeatureIndex, add: &[LookupIndex]) -> Result<()> {
        let record = self
            .table
            .feature_mut(calt)
            .ok_or_else(|| Error::malformed(format!("feature {calt} out of range")))?;
        record.lookup_indices.extend_from_slice(add);
        info!("extended calt feature {calt} with lookups {add:?}");
        Ok(())
    }

    fn describe(&self, plan: &Plan) -> Vec<AddedLookup> {
        plan.to_add
            .iter()
            .filter_map(|&lookup| {
                let kind = self.table.lookup(lookup)?.kind;
                debug!("{}: lookup {lookup} ({kind}, {})", plan.key, kind.class());
                Some(AddedLookup { lookup, kind, class: kind.class() })
            })
            .collect()
    }
}
