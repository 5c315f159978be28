//! Lookup flag compatibility between merged lookups and existing `calt` rules.
//!
//! A best-effort check from flag bits and the nesting graph alone. Whether a
//! filtered mark set actually covers the glyphs at a context position depends
//! on GDEF, so combinations involving a filter only produce warnings.

use std::collections::BTreeSet;

use log::warn;

use crate::{
    Error, Result,
    model::{LangSysKey, LayoutTable, Lookup, LookupIndex, MarkVisibility},
};

pub(crate) struct CompatCheck<'a> {
    table: &'a LayoutTable,
    key: LangSysKey,
    /// Lookups of the pair's `calt` that were not requested.
    existing: &'a BTreeSet<LookupIndex>,
}

impl<'a> CompatCheck<'a> {
    pub(crate) fn new(
        table: &'a LayoutTable,
        key: LangSysKey,
        existing: &'a BTreeSet<LookupIndex>,
    ) -> Self {
        Self { table, key, existing }
    }

    /// Reject the first candidate whose flags conflict with a context rule it
    /// shares with an existing `calt` lookup. Returns warnings for
    /// combinations that cannot be judged without GDEF.
    pub(crate) fn check(&self, candidates: &[LookupIndex]) -> Result<Vec<String>> {
        let mut warnings = Vec::new();
        for &candidate in candidates {
            let lookup = self.lookup(candidate)?;

            for &host in self.existing {
                if self.lookup(host)?.nested_lookups().any(|n| n.lookup == candidate) {
                    self.judge(candidate, host, candidate, &mut warnings)?;
                }
            }

            if lookup.kind.is_contextual() {
                let applied: BTreeSet<_> = lookup
                    .nested_lookups()
                    .map(|n| n.lookup)
                    .filter(|l| self.existing.contains(l))
                    .collect();
                for inner in applied {
                    self.judge(candidate, candidate, inner, &mut warnings)?;
                }
            }
        }
        Ok(warnings)
    }

    fn lookup(&self, idx: LookupIndex) -> Result<&'a Lookup> {
        self.table
            .lookup(idx)
            .ok_or_else(|| Error::malformed(format!("lookup {idx} out of range")))
    }

    /// `host` applies `inner` from one of its context rules.
    fn judge(
        &self,
        candidate: LookupIndex,
        host: LookupIndex,
        inner: LookupIndex,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        let outer_vis = self.lookup(host)?.visibility();
        let inner_vis = self.lookup(inner)?.visibility();
        let relation = format!(
            "{}: lookup {host} {outer_vis} but applies lookup {inner}, which {inner_vis}",
            self.key
        );
        if outer_vis == MarkVisibility::All && inner_vis == MarkVisibility::Ignored {
            return Err(Error::IncompatibleLookupFlags { lookup: candidate, reason: relation });
        }
        if inner_vis > outer_vis {
            let msg = format!("{relation}; result depends on GDEF mark sets");
            warn!("{msg}");
            warnings.push(msg);
        }
        Ok(())
    }
}
