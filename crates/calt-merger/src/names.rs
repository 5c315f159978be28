//! Family name suffixing for merged fonts.

use indexmap::IndexSet;
use log::{debug, info};
use read_fonts::types::Tag;

use crate::{
    Error, Result,
    codec::{NameRecord, NameTable},
};

pub const DEFAULT_SUFFIX: &str = "Custom";

const FAMILY: u16 = 1;
const SUBFAMILY: u16 = 2;
const UNIQUE_ID: u16 = 3;
const FULL_NAME: u16 = 4;
const POSTSCRIPT_NAME: u16 = 6;
const DESCRIPTION: u16 = 10;
const TYPOGRAPHIC_FAMILY: u16 = 16;
const TYPOGRAPHIC_SUBFAMILY: u16 = 17;
const COMPATIBLE_FULL: u16 = 18;
const VARIATIONS_PS_PREFIX: u16 = 20;
const WWS_FAMILY: u16 = 21;

const WINDOWS: u16 = 3;

/// What [`NameRewriter::rewrite`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameReport {
    pub family_old: String,
    pub family_new: String,
    pub records_changed: usize,
    /// Groups whose family already carried the suffix.
    pub skipped_groups: usize,
}

/// Default description for a merge of `features`.
pub fn describe_features(features: &[Tag]) -> String {
    let list: Vec<_> = features.iter().map(|t| t.to_string().trim_end().to_owned()).collect();
    format!("Customized with {} features enabled by default", list.join(", "))
}

pub struct NameRewriter {
    suffix: String,
    description: Option<String>,
}

impl Default for NameRewriter {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIX)
    }
}

impl NameRewriter {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self { suffix: suffix.into(), description: None }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Append the suffix to the family name of every platform/encoding/language
    /// group and update the records derived from it.
    pub fn rewrite(&self, table: &mut NameTable) -> Result<RenameReport> {
        let fallback = fallback_root(table)
            .ok_or_else(|| Error::malformed("name table has no family name"))?
            .to_owned();
        let tail = format!(" {}", self.suffix);
        let mut report = RenameReport {
            family_new: if fallback.ends_with(&tail) {
                fallback.clone()
            } else {
                format!("{fallback}{tail}")
            },
            family_old: fallback.clone(),
            ..Default::default()
        };

        let groups: IndexSet<_> = table.records.iter().map(NameRecord::group).collect();
        for group in groups {
            let root = group_root(table, group).unwrap_or(fallback.as_str()).to_owned();
            if root.ends_with(&tail) {
                debug!("name group {group:?} already named '{root}'");
                report.skipped_groups += 1;
                continue;
            }
            let renamed = Renamed::new(&root, &tail);
            for record in table.records.iter_mut().filter(|r| r.group() == group) {
                if let Some(value) = renamed.apply(record)
                    && value != record.value
                {
                    record.value = value;
                    report.records_changed += 1;
                }
            }
            if let Some(description) = &self.description
                && has_family(table, group)
            {
                report.records_changed += set_record(table, group, DESCRIPTION, description);
            }
        }

        info!(
            "renamed '{}' to '{}' ({} records)",
            report.family_old, report.family_new, report.records_changed
        );
        Ok(report)
    }
}

struct Renamed {
    root: String,
    tail: String,
    new: String,
    root_ns: String,
    new_ns: String,
}

impl Renamed {
    fn new(root: &str, tail: &str) -> Self {
        let new = format!("{root}{tail}");
        Self {
            root_ns: root.replace(' ', ""),
            new_ns: new.replace(' ', ""),
            root: root.to_owned(),
            tail: tail.to_owned(),
            new,
        }
    }

    fn apply(&self, record: &NameRecord) -> Option<String> {
        let value = &record.value;
        match record.name_id {
            FAMILY | TYPOGRAPHIC_FAMILY | WWS_FAMILY => Some(if value.contains(&self.root) {
                value.replacen(&self.root, &self.new, 1)
            } else {
                format!("{value}{}", self.tail)
            }),
            SUBFAMILY | FULL_NAME | TYPOGRAPHIC_SUBFAMILY | COMPATIBLE_FULL => value
                .contains(&self.root)
                .then(|| value.replacen(&self.root, &self.new, 1)),
            UNIQUE_ID if value.contains(&self.root) => {
                Some(value.replacen(&self.root, &self.new, 1))
            }
            UNIQUE_ID | POSTSCRIPT_NAME | VARIATIONS_PS_PREFIX => value
                .contains(&self.root_ns)
                .then(|| value.replacen(&self.root_ns, &self.new_ns, 1)),
            _ => None,
        }
    }
}

fn group_root(table: &NameTable, group: (u16, u16, u16)) -> Option<&str> {
    find_value(table, group, TYPOGRAPHIC_FAMILY).or_else(|| find_value(table, group, FAMILY))
}

fn find_value(table: &NameTable, group: (u16, u16, u16), name_id: u16) -> Option<&str> {
    table
        .records
        .iter()
        .find(|r| r.group() == group && r.name_id == name_id && !r.value.is_empty())
        .map(|r| r.value.as_str())
}

/// The family to use for groups without their own, preferring Windows records.
fn fallback_root(table: &NameTable) -> Option<&str> {
    let mut groups: Vec<_> = table.records.iter().map(NameRecord::group).collect();
    groups.sort_by_key(|g| g.0 != WINDOWS);
    groups.into_iter().find_map(|g| group_root(table, g))
}

fn has_family(table: &NameTable, group: (u16, u16, u16)) -> bool {
    table
        .records
        .iter()
        .any(|r| r.group() == group && matches!(r.name_id, FAMILY | TYPOGRAPHIC_FAMILY))
}

/// Insert or replace one record, returning 1 if anything changed.
fn set_record(table: &mut NameTable, group: (u16, u16, u16), name_id: u16, value: &str) -> usize {
    match table.records.iter_mut().find(|r| r.group() == group && r.name_id == name_id) {
        Some(r) if r.value == value => 0,
        Some(r) => {
            r.value = value.to_owned();
            1
        }
        None => {
            let (platform, encoding, language) = group;
            table.records.push(NameRecord::new(platform, encoding, language, name_id, value));
            1
        }
    }
}
