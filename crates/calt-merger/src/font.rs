//! Font parsing, merging, and serialization.

use std::fmt::Formatter;

use log::debug;
use read_fonts::{FontRef, tables::compute_checksum, types::Tag};
use write_fonts::FontBuilder;

use crate::{
    Result,
    codec::{self, NameTable, read_u16_be, read_u32_be},
    error::Error,
    merge::LookupMerger,
    model::LayoutTable,
    names::{NameRewriter, describe_features},
    resolve::FeatureResolver,
    types::*,
};

const GSUB: Tag = Tag::new(b"GSUB");
const HEAD: Tag = Tag::new(b"head");
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

/// A parsed font ready for merging.
pub struct Font<'a> {
    data: &'a [u8],
    inner: FontRef<'a>,
}

impl std::fmt::Debug for Font<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font").field("data_len", &self.data.len()).finish_non_exhaustive()
    }
}

impl<'a> TryFrom<&'a [u8]> for Font<'a> {
    type Error = Error;

    fn try_from(data: &'a [u8]) -> Result<Self> {
        Self::new(data)
    }
}

impl AsRef<[u8]> for Font<'_> {
    fn as_ref(&self) -> &[u8] {
        self.data
    }
}

impl<'a> Font<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self> {
        Ok(Self { data, inner: FontRef::new(data)? })
    }

    pub fn data(&self) -> &[u8] {
        self.data
    }

    /// Decode the GSUB table.
    pub fn layout(&self) -> Result<LayoutTable> {
        let gsub = self.inner.table_data(GSUB).ok_or(Error::NoGsub)?;
        codec::decode(gsub.as_bytes())
    }

    pub fn names(&self) -> Result<NameTable> {
        NameTable::decode(&self.inner)
    }

    pub fn report(&self) -> Result<FontReport> {
        Ok(FontReport::from_layout(&self.layout()?))
    }

    /// Merge the requested features into `calt` and return the new font.
    ///
    /// Every check runs before the output is assembled, so an error means no
    /// bytes were produced.
    pub fn merge(&self, options: &MergeOptions) -> Result<MergeResult> {
        let tags = options.feature_tags()?;
        let mut layout = self.layout()?;
        let mut names = options.rename.then(|| self.names()).transpose()?;

        let resolution = FeatureResolver::new(&layout).resolve(&tags)?;
        let report = LookupMerger::new(&mut layout).merge(&resolution)?;

        let rename = match names.as_mut() {
            Some(names) => Some(
                NameRewriter::new(options.suffix.as_str())
                    .with_description(options.description.then(|| describe_features(&tags)))
                    .rewrite(names)?,
            ),
            None => None,
        };

        let gsub = codec::encode(&layout)?;
        debug!("encoded GSUB: {} bytes", gsub.len());
        let data = self.rebuild(gsub, names.as_ref())?;

        Ok(MergeResult { data, stats: MergeStats::new(tags.len(), &report), report, rename })
    }

    /// Reassemble the font with a new GSUB and optionally a new name table.
    /// Every other table is copied as is, and the sfnt version of the input is
    /// kept so CFF fonts stay `OTTO`.
    fn rebuild(&self, gsub: Vec<u8>, names: Option<&NameTable>) -> Result<Vec<u8>> {
        let mut builder = FontBuilder::new();
        for rec in self.inner.table_directory.table_records() {
            let tag = rec.tag();
            let data = self
                .inner
                .table_data(tag)
                .ok_or_else(|| Error::malformed(format!("table '{tag}' out of bounds")))?;
            if tag == HEAD {
                let mut head = data.as_bytes().to_vec();
                head.get_mut(8..12)
                    .ok_or_else(|| Error::malformed("head table too short"))?
                    .fill(0);
                builder.add_raw(tag, head);
            } else {
                builder.add_raw(tag, data);
            }
        }
        builder.add_raw(GSUB, gsub);
        if let Some(names) = names {
            builder.add_table(&names.encode()?)?;
        }
        let mut data = builder.build();
        data[..4].copy_from_slice(&self.inner.table_directory.sfnt_version().to_be_bytes());
        fix_checksum_adjustment(&mut data)?;
        Ok(data)
    }
}

/// Write `head.checkSumAdjustment` for a font whose adjustment field is zero.
fn fix_checksum_adjustment(data: &mut [u8]) -> Result<()> {
    let num_tables = read_u16_be(data, 4)? as usize;
    let Some(record) = (0..num_tables)
        .map(|i| 12 + i * 16)
        .find(|&rec| data.get(rec..rec + 4) == Some(&HEAD.to_be_bytes()[..]))
    else {
        return Ok(());
    };
    let offset = read_u32_be(data, record + 8)? as usize;
    let adjustment = CHECKSUM_MAGIC.wrapping_sub(compute_checksum(data));
    data.get_mut(offset + 8..offset + 12)
        .ok_or_else(|| Error::malformed("head table beyond end of font"))?
        .copy_from_slice(&adjustment.to_be_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_checksum_adjustment() {
        // sfnt header, one table record for head at offset 28, 12 bytes of head
        let mut data = vec![0, 1, 0, 0, 0, 1, 0, 16, 0, 0, 0, 0];
        data.extend_from_slice(b"head");
        data.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 28, 0, 0, 0, 12]);
        data.extend_from_slice(&[0, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0]);

        fix_checksum_adjustment(&mut data).unwrap();

        assert_eq!(compute_checksum(&data), CHECKSUM_MAGIC);
        assert_ne!(&data[36..40], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(Font::new(b"not a font").is_err());
    }
}
