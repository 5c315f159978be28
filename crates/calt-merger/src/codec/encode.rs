//! GSUB encoding.
//!
//! Layout: header, ScriptList (each Script followed by its LangSys tables),
//! FeatureList (each Feature followed by its params), then the retained
//! LookupList/FeatureVariations region. Every offset is range-checked.

use read_fonts::types::Tag;

use crate::{
    Error, Result,
    model::{FeatureRecord, LangSys, LayoutTable, ScriptRecord},
};

const NO_REQUIRED_FEATURE: u16 = 0xFFFF;

/// Encode a GSUB table.
///
/// A table whose scripts and features are unchanged since decoding encodes
/// to its source bytes.
pub fn encode(table: &LayoutTable) -> Result<Vec<u8>> {
    table.validate()?;
    if let Some(source) = &table.source
        && source.scripts == table.scripts
        && source.features == table.features
    {
        return Ok(source.bytes.clone());
    }

    let (major, minor) = table.version;
    let mut w = Writer::default();
    w.u16(major);
    w.u16(minor);
    let script_list = w.reserve16();
    let feature_list = w.reserve16();
    let lookup_list = w.reserve16();
    let feature_variations = (minor >= 1).then(|| w.reserve32());

    w.patch16(script_list, 0, "ScriptList")?;
    write_script_list(&mut w, &table.scripts)?;
    w.patch16(feature_list, 0, "FeatureList")?;
    write_feature_list(&mut w, &table.features)?;

    let retained_start = w.len();
    w.bytes(&table.retained.bytes);
    w.set16(lookup_list, retained_start + table.retained.lookup_list, "LookupList")?;
    if let (Some(pos), Some(rel)) = (feature_variations, table.retained.feature_variations) {
        w.set32(pos, retained_start + rel, "FeatureVariations")?;
    }
    Ok(w.finish())
}

fn write_script_list(w: &mut Writer, scripts: &[ScriptRecord]) -> Result<()> {
    let base = w.len();
    w.count16(scripts.len(), "ScriptList count")?;
    let records: Vec<_> = scripts
        .iter()
        .map(|s| {
            w.tag(s.tag);
            w.reserve16()
        })
        .collect();
    for (script, pos) in scripts.iter().zip(records) {
        w.patch16(pos, base, "Script")?;
        write_script(w, script)?;
    }
    Ok(())
}

fn write_script(w: &mut Writer, script: &ScriptRecord) -> Result<()> {
    let base = w.len();
    let default_pos = w.reserve16();
    w.count16(script.lang_sys.len(), "LangSys count")?;
    let records: Vec<_> = script
        .lang_sys
        .iter()
        .map(|r| {
            w.tag(r.tag);
            w.reserve16()
        })
        .collect();
    if let Some(ls) = &script.default_lang_sys {
        w.patch16(default_pos, base, "default LangSys")?;
        write_lang_sys(w, ls)?;
    }
    for (record, pos) in script.lang_sys.iter().zip(records) {
        w.patch16(pos, base, "LangSys")?;
        write_lang_sys(w, &record.lang_sys)?;
    }
    Ok(())
}

fn write_lang_sys(w: &mut Writer, ls: &LangSys) -> Result<()> {
    // lookupOrderOffset, reserved
    w.u16(0);
    w.u16(ls.required_feature.map_or(NO_REQUIRED_FEATURE, |f| f.as_u16()));
    w.count16(ls.feature_indices.len(), "LangSys feature count")?;
    for idx in &ls.feature_indices {
        w.u16(idx.as_u16());
    }
    Ok(())
}

fn write_feature_list(w: &mut Writer, features: &[FeatureRecord]) -> Result<()> {
    let base = w.len();
    w.count16(features.len(), "FeatureList count")?;
    let records: Vec<_> = features
        .iter()
        .map(|f| {
            w.tag(f.tag);
            w.reserve16()
        })
        .collect();
    for (feature, pos) in features.iter().zip(records) {
        w.patch16(pos, base, "Feature")?;
        write_feature(w, feature)?;
    }
    Ok(())
}

fn write_feature(w: &mut Writer, feature: &FeatureRecord) -> Result<()> {
    let base = w.len();
    let params_pos = w.reserve16();
    w.count16(feature.lookup_indices.len(), "Feature lookup count")?;
    for idx in &feature.lookup_indices {
        w.u16(idx.as_u16());
    }
    if let Some(params) = &feature.params {
        w.patch16(params_pos, base, "FeatureParams")?;
        w.bytes(params);
        if params.len() % 2 == 1 {
            w.u8(0);
        }
    }
    Ok(())
}

/// Big-endian byte writer with placeholder offsets patched once the target
/// position is known.
#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn len(&self) -> usize {
        self.buf.len()
    }

    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn tag(&mut self, tag: Tag) {
        self.buf.extend_from_slice(&tag.to_be_bytes());
    }

    fn bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    fn count16(&mut self, count: usize, what: &'static str) -> Result<()> {
        let v = u16::try_from(count).map_err(|_| Error::overflow(what, count))?;
        self.u16(v);
        Ok(())
    }

    fn reserve16(&mut self) -> usize {
        let pos = self.len();
        self.u16(0);
        pos
    }

    fn reserve32(&mut self) -> usize {
        let pos = self.len();
        self.bytes(&[0; 4]);
        pos
    }

    /// Point the offset at `pos`, relative to `base`, at the current end.
    fn patch16(&mut self, pos: usize, base: usize, what: &'static str) -> Result<()> {
        self.set16(pos, self.len() - base, what)
    }

    fn set16(&mut self, pos: usize, value: usize, what: &'static str) -> Result<()> {
        let v = u16::try_from(value).map_err(|_| Error::overflow(what, value))?;
        self.buf[pos..pos + 2].copy_from_slice(&v.to_be_bytes());
        Ok(())
    }

    fn set32(&mut self, pos: usize, value: usize, what: &'static str) -> Result<()> {
        let v = u32::try_from(value).map_err(|_| Error::overflow(what, value))?;
        self.buf[pos..pos + 4].copy_from_slice(&v.to_be_bytes());
        Ok(())
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch16_relative_to_base() {
        let mut w = Writer::default();
        w.u16(0xAAAA);
        let pos = w.reserve16();
        w.bytes(&[1, 2, 3]);
        w.patch16(pos, 0, "test").unwrap();
        assert_eq!(w.finish(), [0xAA, 0xAA, 0x00, 0x07, 1, 2, 3]);
    }

    #[test]
    fn test_set16_rejects_overflow() {
        let mut w = Writer::default();
        let pos = w.reserve16();
        let err = w.set16(pos, 0x1_0000, "Feature").unwrap_err();
        assert!(matches!(err, Error::EncodingOverflow { what: "Feature", value: 0x1_0000 }));
    }

    #[test]
    fn test_count16_rejects_overflow() {
        let mut w = Writer::default();
        assert!(w.count16(65_535, "count").is_ok());
        assert!(matches!(w.count16(65_536, "count"), Err(Error::EncodingOverflow { .. })));
    }

    #[test]
    fn test_lang_sys_layout() {
        let mut w = Writer::default();
        let ls = LangSys {
            required_feature: None,
            feature_indices: vec![
                crate::model::FeatureIndex::new(2),
                crate::model::FeatureIndex::new(5),
            ],
        };
        write_lang_sys(&mut w, &ls).unwrap();
        assert_eq!(w.finish(), [0, 0, 0xFF, 0xFF, 0, 2, 0, 2, 0, 5]);
    }
}
