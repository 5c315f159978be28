use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use font_calt_merger::{MergeOptions, MergeStats, report};
use log::{info, warn};

use crate::{
    io::{FontFile, output_paths},
    parallel::run_parallel,
};

/// Merge one font, writing `output` only if every step succeeded.
pub fn merge_file(input: &Path, output: &Path, options: &MergeOptions) -> Result<MergeStats> {
    let data = FontFile::new(input).read()?;
    let result = font_calt_merger::merge(&data, options)
        .with_context(|| format!("Failed to merge features into {}", input.display()))?;

    for w in &result.report.warnings {
        warn!("{}: {w}", input.display());
    }
    FontFile::new(output).write_staged(&result.data)?;

    info!("{}: {}", input.file_name().unwrap_or_default().to_string_lossy(), result.stats);
    if let Some(rename) = &result.rename {
        info!("{}: family '{}' -> '{}'", output.display(), rename.family_old, rename.family_new);
    }
    Ok(result.stats)
}

/// Merge every font into `out_dir` in parallel. Each font is handled on its
/// own; the first failure is returned after all have run. Output collisions
/// are rejected before anything runs.
pub fn merge_batch(files: &[PathBuf], out_dir: &Path, options: &MergeOptions) -> Result<()> {
    let outputs: HashMap<&Path, PathBuf> =
        files.iter().map(PathBuf::as_path).zip(output_paths(out_dir, files)?).collect();
    info!("Merging {} into calt for {} fonts", options.features.join(","), files.len());
    run_parallel("Merge", files, |path| merge_file(path, &outputs[path], options).map(|_| ()))
        .ok_or_first_error("Merge")
}

pub fn print_report(input: &Path) -> Result<()> {
    let data = FontFile::new(input).read()?;
    let report =
        report(&data).with_context(|| format!("Failed to read layout of {}", input.display()))?;
    println!("{report}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use read_fonts::types::{GlyphId16, NameId, Tag};
    use write_fonts::{
        FontBuilder,
        tables::{
            gsub::{Gsub, SingleSubst, SubstitutionLookup, SubstitutionLookupList},
            layout::{
                CoverageTable, Feature, FeatureList, FeatureRecord, LangSys, Lookup, LookupFlag,
                Script, ScriptList, ScriptRecord,
            },
            name::{Name, NameRecord},
        },
    };

    use super::*;
    use crate::status::{FEATURE_NOT_FOUND, MALFORMED_TABLE, OTHER, exit_status};

    /// `calt` and `ss13` for latn, one lookup each.
    fn font() -> Vec<u8> {
        let lookup = |glyph| {
            let coverage = CoverageTable::format_1(vec![GlyphId16::new(glyph)]);
            SubstitutionLookup::Single(Lookup::new(
                LookupFlag::empty(),
                vec![SingleSubst::format_1(coverage, 1)],
            ))
        };
        let mut lang_sys = LangSys::new(vec![0, 1]);
        lang_sys.required_feature_index = 0xFFFF;
        let gsub = Gsub::new(
            ScriptList::new(vec![ScriptRecord::new(
                Tag::new(b"latn"),
                Script::new(Some(lang_sys), vec![]),
            )]),
            FeatureList::new(vec![
                FeatureRecord::new(Tag::new(b"calt"), Feature::new(None, vec![0])),
                FeatureRecord::new(Tag::new(b"ss13"), Feature::new(None, vec![1])),
            ]),
            SubstitutionLookupList::new(vec![lookup(3), lookup(4)]),
        );
        let name = Name::new(vec![NameRecord::new(
            3,
            1,
            0x409,
            NameId::new(1),
            "Test Mono".to_owned().into(),
        )]);

        let mut head = vec![0u8; 54];
        head[12..16].copy_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
        let mut builder = FontBuilder::new();
        builder.add_raw(Tag::new(b"head"), head);
        builder.add_table(&gsub).unwrap();
        builder.add_table(&name).unwrap();
        builder.build()
    }

    #[test]
    fn test_merge_file_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let (input, output) = (dir.path().join("in.ttf"), dir.path().join("out/in.ttf"));
        write(&input, font()).unwrap();

        let stats = merge_file(&input, &output, &MergeOptions::new(["ss13"])).unwrap();

        assert_eq!(stats.lookups_added, 1);
        assert!(output.exists());
    }

    #[test]
    fn test_unknown_feature_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (input, output) = (dir.path().join("in.ttf"), dir.path().join("out.ttf"));
        write(&input, font()).unwrap();

        let err = merge_file(&input, &output, &MergeOptions::new(["ss99"])).unwrap_err();

        assert_eq!(exit_status(&err), FEATURE_NOT_FOUND);
        assert!(!output.exists());
    }

    #[test]
    fn test_batch_rejects_output_over_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.ttf");
        write(&input, font()).unwrap();

        let err = merge_batch(&[input.clone()], dir.path(), &MergeOptions::new(["ss13"]))
            .unwrap_err();

        assert_eq!(exit_status(&err), OTHER);
        assert_eq!(std::fs::read(&input).unwrap(), font());
    }

    #[test]
    fn test_invalid_font_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (input, output) = (dir.path().join("in.ttf"), dir.path().join("out.ttf"));
        write(&input, b"definitely not a font").unwrap();

        let err = merge_file(&input, &output, &MergeOptions::new(["ss13"])).unwrap_err();

        assert_eq!(exit_status(&err), MALFORMED_TABLE);
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_input_is_other() {
        let dir = tempfile::tempdir().unwrap();
        let err = merge_file(
            &dir.path().join("missing.ttf"),
            &dir.path().join("out.ttf"),
            &MergeOptions::new(["ss13"]),
        )
        .unwrap_err();
        assert_eq!(exit_status(&err), OTHER);
    }

    #[test]
    fn test_batch_reports_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let inputs: Vec<_> = ["a.ttf", "b.ttf"]
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                write(&path, b"junk").unwrap();
                path
            })
            .collect();
        let out_dir = dir.path().join("out");

        let err = merge_batch(&inputs, &out_dir, &MergeOptions::new(["ss13"])).unwrap_err();

        assert_eq!(exit_status(&err), MALFORMED_TABLE);
        assert!(err.to_string().contains("0 succeeded, 2 failed"));
        assert!(!out_dir.join("a.ttf").exists());
    }
}
