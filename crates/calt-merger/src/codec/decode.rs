//! GSUB decoding.

use read_fonts::{
    FontData, FontRead,
    tables::{gsub::Gsub, layout},
    types::Tag,
};

use super::{lookup::decode_lookups, read_u16_be, read_u32_be};
use crate::{
    Error, Result,
    model::{
        FeatureIndex, FeatureParams, FeatureRecord, LangSys, LangSysRecord, LayoutTable,
        LookupIndex, RetainedRegion, ScriptRecord, Source,
    },
};

const NO_REQUIRED_FEATURE: u16 = 0xFFFF;

/// Decode a GSUB table.
///
/// ScriptList and FeatureList are modelled in full. The LookupList is
/// modelled read-only and its bytes, together with FeatureVariations, are
/// retained for verbatim re-emission.
pub fn decode(data: &[u8]) -> Result<LayoutTable> {
    let major = read_u16_be(data, 0)?;
    let minor = read_u16_be(data, 2)?;
    if major != 1 {
        return Err(Error::malformed(format!("unsupported GSUB version {major}.{minor}")));
    }
    let header_len = if minor >= 1 { 14 } else { 10 };
    let script_list_offset = read_u16_be(data, 4)? as usize;
    let feature_list_offset = read_u16_be(data, 6)? as usize;
    let lookup_list_offset = read_u16_be(data, 8)? as usize;
    let feature_variations_offset = match minor {
        0 => None,
        _ => Some(read_u32_be(data, 10)? as usize).filter(|&o| o != 0),
    };
    if lookup_list_offset == 0 {
        return Err(Error::malformed("GSUB has no LookupList"));
    }

    let gsub = Gsub::read(FontData::new(data))?;
    let scripts = match script_list_offset {
        0 => Vec::new(),
        _ => decode_scripts(&gsub)?,
    };
    let features = match feature_list_offset {
        0 => Vec::new(),
        _ => decode_features(&gsub, data, feature_list_offset)?,
    };
    let lookups = decode_lookups(&gsub.lookup_list()?)?;

    let start = feature_variations_offset.map_or(lookup_list_offset, |fv| fv.min(lookup_list_offset));
    if start < header_len || start > data.len() {
        return Err(Error::malformed(format!(
            "LookupList offset {start} outside table of {} bytes",
            data.len()
        )));
    }
    let retained = RetainedRegion {
        bytes: data[start..].to_vec(),
        lookup_list: lookup_list_offset - start,
        feature_variations: feature_variations_offset.map(|fv| fv - start),
    };

    let table = LayoutTable {
        version: (major, minor),
        source: Some(Source {
            bytes: data.to_vec(),
            scripts: scripts.clone(),
            features: features.clone(),
        }),
        scripts,
        features,
        lookups,
        retained,
    };
    table.validate()?;
    Ok(table)
}

fn decode_scripts(gsub: &Gsub) -> Result<Vec<ScriptRecord>> {
    let script_list = gsub.script_list()?;
    script_list
        .script_records()
        .iter()
        .map(|sr| {
            let script = sr.script(script_list.offset_data())?;
            let default_lang_sys = script
                .default_lang_sys()
                .transpose()?
                .map(|ls| decode_lang_sys(&ls));
            let lang_sys = script
                .lang_sys_records()
                .iter()
                .map(|lr| {
                    Ok(LangSysRecord {
                        tag: lr.lang_sys_tag(),
                        lang_sys: decode_lang_sys(&lr.lang_sys(script.offset_data())?),
                    })
                })
                .collect::<Result<_>>()?;
            Ok(ScriptRecord { tag: sr.script_tag(), default_lang_sys, lang_sys })
        })
        .collect()
}

fn decode_lang_sys(ls: &layout::LangSys) -> LangSys {
    let required = ls.required_feature_index();
    LangSys {
        required_feature: (required != NO_REQUIRED_FEATURE).then(|| FeatureIndex::new(required)),
        feature_indices: ls.feature_indices().iter().map(|i| FeatureIndex::new(i.get())).collect(),
    }
}

fn decode_features(gsub: &Gsub, data: &[u8], list_offset: usize) -> Result<Vec<FeatureRecord>> {
    let feature_list = gsub.feature_list()?;
    feature_list
        .feature_records()
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let tag = record.feature_tag();
            let feature = record.feature(feature_list.offset_data())?;
            let lookup_indices =
                feature.lookup_list_indices().iter().map(|l| LookupIndex::new(l.get())).collect();
            // count, then 6-byte records of tag + Offset16
            let feature_offset = list_offset + read_u16_be(data, list_offset + 2 + i * 6 + 4)? as usize;
            let params = decode_params(data, tag, feature_offset)?;
            Ok(FeatureRecord { tag, params, lookup_indices })
        })
        .collect()
}

fn decode_params(data: &[u8], tag: Tag, feature_offset: usize) -> Result<Option<FeatureParams>> {
    let params_offset = read_u16_be(data, feature_offset)? as usize;
    if params_offset == 0 {
        return Ok(None);
    }
    let start = feature_offset + params_offset;
    let len = params_len(data, tag, start)?;
    data.get(start..start + len)
        .map(|b| Some(b.to_vec()))
        .ok_or_else(|| Error::malformed(format!("FeatureParams of '{tag}' beyond table end")))
}

fn params_len(data: &[u8], tag: Tag, start: usize) -> Result<usize> {
    match tag.to_be_bytes() {
        [b's', b'i', b'z', b'e'] => Ok(10),
        [b's', b's', a, b] if a.is_ascii_digit() && b.is_ascii_digit() => Ok(4),
        [b'c', b'v', a, b] if a.is_ascii_digit() && b.is_ascii_digit() => {
            let char_count = read_u16_be(data, start + 12)? as usize;
            Ok(14 + 3 * char_count)
        }
        _ => Err(Error::malformed(format!("FeatureParams of unknown length on '{tag}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_header() {
        assert!(matches!(decode(&[0, 1, 0]), Err(Error::Malformed(_))));
    }

    #[test]
    fn test_rejects_unknown_major_version() {
        let data = [0, 2, 0, 0, 0, 10, 0, 12, 0, 14, 0, 0, 0, 0, 0, 0];
        assert!(matches!(decode(&data), Err(Error::Malformed(_))));
    }

    #[test]
    fn test_rejects_null_lookup_list() {
        let data = [0, 1, 0, 0, 0, 10, 0, 12, 0, 0, 0, 0, 0, 0];
        assert!(matches!(decode(&data), Err(Error::Malformed(_))));
    }

    #[test]
    fn test_params_len_by_tag() {
        let mut cv = vec![0u8; 20];
        cv[12..14].copy_from_slice(&2u16.to_be_bytes());
        assert_eq!(params_len(&cv, Tag::new(b"size"), 0).unwrap(), 10);
        assert_eq!(params_len(&cv, Tag::new(b"ss13"), 0).unwrap(), 4);
        assert_eq!(params_len(&cv, Tag::new(b"cv01"), 0).unwrap(), 20);
        assert!(params_len(&cv, Tag::new(b"liga"), 0).is_err());
    }
}
