//! Process exit statuses.

use anyhow::Error;
use font_calt_merger::ErrorKind;

pub const OTHER: u8 = 1;
pub const USAGE: u8 = 2;
pub const MALFORMED_TABLE: u8 = 3;
pub const FEATURE_NOT_FOUND: u8 = 4;
pub const INCOMPATIBLE_LOOKUP_FLAGS: u8 = 5;
pub const ENCODING_OVERFLOW: u8 = 6;
pub const NAME_TABLE_MISSING: u8 = 7;

/// Exit status for an error, from the first merge error in its chain.
/// I/O and anything else exits with [`OTHER`].
pub fn exit_status(err: &Error) -> u8 {
    err.chain()
        .find_map(|e| e.downcast_ref::<font_calt_merger::Error>())
        .map_or(OTHER, |e| match e.kind() {
            ErrorKind::InvalidInput => USAGE,
            ErrorKind::MalformedTable => MALFORMED_TABLE,
            ErrorKind::FeatureNotFound => FEATURE_NOT_FOUND,
            ErrorKind::IncompatibleLookupFlags => INCOMPATIBLE_LOOKUP_FLAGS,
            ErrorKind::EncodingOverflow => ENCODING_OVERFLOW,
            ErrorKind::NameTableMissing => NAME_TABLE_MISSING,
            ErrorKind::Build => OTHER,
        })
}

#[cfg(test)]
mod tests {
    use std::io;

    use anyhow::Context;

    use super::*;

    fn status_of(err: font_calt_merger::Error) -> u8 {
        let wrapped = Err::<(), _>(err).context("Failed to merge font.ttf").unwrap_err();
        exit_status(&wrapped.context("Merge failed: 0 succeeded, 1 failed"))
    }

    #[test]
    fn test_merge_errors_map_through_context() {
        use font_calt_merger::Error;

        assert_eq!(status_of(Error::NoGsub), MALFORMED_TABLE);
        assert_eq!(status_of(Error::Malformed("bad".into())), MALFORMED_TABLE);
        assert_eq!(status_of(Error::NameTableMissing), NAME_TABLE_MISSING);
        assert_eq!(status_of(Error::InvalidTag("ss013".into())), USAGE);
        assert_eq!(
            status_of(Error::EncodingOverflow { what: "Feature", value: 70000 }),
            ENCODING_OVERFLOW
        );
        assert_eq!(
            status_of(Error::FeatureNotFound {
                tag: font_calt_merger::model::CALT,
                available: vec![]
            }),
            FEATURE_NOT_FOUND
        );
        assert_eq!(
            status_of(Error::IncompatibleLookupFlags {
                lookup: font_calt_merger::model::LookupIndex::new(7),
                reason: "latn/dflt".into()
            }),
            INCOMPATIBLE_LOOKUP_FLAGS
        );
    }

    #[test]
    fn test_io_error_is_other() {
        let err = Err::<(), _>(io::Error::from(io::ErrorKind::NotFound))
            .context("Failed to read font: a.ttf")
            .unwrap_err();
        assert_eq!(exit_status(&err), OTHER);
    }
}
