//! Binary GSUB and name table codec.

mod decode;
mod encode;
mod lookup;
mod name;

pub use decode::decode;
pub use encode::encode;
pub use name::{NameRecord, NameTable};

use crate::{Error, Result};

pub(crate) fn read_u16_be(data: &[u8], offset: usize) -> Result<u16> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| Error::malformed(format!("u16 at {offset} beyond table end {}", data.len())))
}

pub(crate) fn read_u32_be(data: &[u8], offset: usize) -> Result<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| Error::malformed(format!("u32 at {offset} beyond table end {}", data.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_be_bounds() {
        let data = [0x00, 0x01, 0xAB, 0xCD, 0xEF];
        assert_eq!(read_u16_be(&data, 0).unwrap(), 1);
        assert_eq!(read_u32_be(&data, 1).unwrap(), 0x01AB_CDEF);
        assert!(read_u16_be(&data, 4).is_err());
        assert!(read_u32_be(&data, 2).is_err());
    }
}
