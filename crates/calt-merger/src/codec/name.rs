//! Naming table model.

use log::warn;
use read_fonts::{
    FontRef, TableProvider,
    tables::name::{Encoding, MacRomanMapping},
    types::{NameId, Tag},
};
use write_fonts::tables::name;

use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub value: String,
}

impl NameRecord {
    pub fn new(
        platform_id: u16,
        encoding_id: u16,
        language_id: u16,
        name_id: u16,
        value: impl Into<String>,
    ) -> Self {
        Self { platform_id, encoding_id, language_id, name_id, value: value.into() }
    }

    /// Records sharing platform, encoding and language describe one localized
    /// set of names.
    pub fn group(&self) -> (u16, u16, u16) {
        (self.platform_id, self.encoding_id, self.language_id)
    }

    /// Whether the value can be written back in the record's encoding.
    fn is_encodable(&self) -> bool {
        match Encoding::new(self.platform_id, self.encoding_id) {
            Encoding::Utf16Be => true,
            Encoding::MacRoman => self.value.chars().all(|c| MacRomanMapping.encode(c).is_some()),
            Encoding::Unknown => false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameTable {
    pub records: Vec<NameRecord>,
}

impl NameTable {
    pub fn new(records: Vec<NameRecord>) -> Self {
        Self { records }
    }

    /// Decode the font's name table. Records in encodings other than UTF-16
    /// and Mac Roman (Shift-JIS, Big5 and the like) are dropped.
    pub fn decode(font: &FontRef) -> Result<Self> {
        if font.table_data(Tag::new(b"name")).is_none() {
            return Err(Error::NameTableMissing);
        }
        let name = font.name()?;
        let string_data = name.string_data();
        let mut records = Vec::new();
        for r in name.name_record() {
            let (platform, encoding) = (r.platform_id(), r.encoding_id());
            let decoded = match Encoding::new(platform, encoding) {
                Encoding::Unknown => Err("unsupported encoding".to_owned()),
                _ => r.string(string_data).map(|s| s.to_string()).map_err(|e| e.to_string()),
            };
            match decoded {
                Ok(value) => records.push(NameRecord::new(
                    platform,
                    encoding,
                    r.language_id(),
                    r.name_id().to_u16(),
                    value,
                )),
                Err(e) => warn!(
                    "dropping name record {} ({platform}, {encoding}, {}): {e}",
                    r.name_id().to_u16(),
                    r.language_id()
                ),
            }
        }
        Ok(Self { records })
    }

    pub fn get(&self, name_id: u16) -> Option<&str> {
        self.records.iter().find(|r| r.name_id == name_id).map(|r| r.value.as_str())
    }

    /// Fails with [`Error::UnencodableName`] when a value has characters its
    /// record's encoding cannot hold, e.g. a non-Latin suffix on a Mac Roman
    /// record.
    pub fn encode(&self) -> Result<name::Name> {
        if let Some(r) = self.records.iter().find(|r| !r.is_encodable()) {
            return Err(Error::UnencodableName { name_id: r.name_id, group: r.group() });
        }
        let mut records = self.records.clone();
        records.sort_by_key(|r| (r.group(), r.name_id));
        Ok(name::Name::new(
            records
                .into_iter()
                .map(|r| {
                    name::NameRecord::new(
                        r.platform_id,
                        r.encoding_id,
                        r.language_id,
                        NameId::new(r.name_id),
                        r.value.into(),
                    )
                })
                .collect(),
        ))
    }
}
