//! CLI definitions and command dispatch.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use font_calt_merger::{DEFAULT_SUFFIX, MergeOptions};

use crate::{
    io::glob_fonts,
    merge::{merge_batch, merge_file, print_report},
};

#[derive(Parser)]
#[command(name = "calt-merge", version)]
#[command(about = "Enable stylistic sets by default by merging their lookups into calt")]
#[command(after_help = "Examples:\n  \
    calt-merge merge -f ss13,ss15 PragmataPro.ttf PragmataProCustom.ttf\n  \
    calt-merge batch -f ss13 --out-dir dist --dir fonts --pattern '*.ttf'\n  \
    calt-merge report PragmataPro.ttf")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, clap::Args)]
pub struct MergeArgs {
    /// Comma-separated feature tags, e.g. 'ss13,ss15'
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub features: Vec<String>,
    /// Suffix appended to the family name
    #[arg(short, long, default_value = DEFAULT_SUFFIX)]
    pub suffix: String,
    /// Leave the name table untouched
    #[arg(long, conflicts_with = "suffix")]
    pub keep_names: bool,
    /// Do not set the description (name ID 10)
    #[arg(long)]
    pub no_description: bool,
}

impl MergeArgs {
    pub fn options(&self) -> MergeOptions {
        let features = self.features.iter().map(|f| f.trim()).filter(|f| !f.is_empty());
        MergeOptions::new(features)
            .with_suffix(self.suffix.as_str())
            .with_keep_names_if(self.keep_names)
            .with_description_if(!self.no_description)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge features into calt for one font
    Merge {
        #[command(flatten)]
        args: MergeArgs,
        /// Input .otf or .ttf font file
        input: PathBuf,
        /// Output font file
        output: PathBuf,
    },
    /// Merge features into calt for many fonts in parallel
    Batch {
        #[command(flatten)]
        args: MergeArgs,
        /// Directory receiving the merged fonts, named as their inputs
        #[arg(long)]
        out_dir: PathBuf,
        /// Directory to search instead of listing files
        #[arg(long, conflicts_with = "files")]
        dir: Option<PathBuf>,
        /// Glob pattern used with --dir
        #[arg(long, default_value = "*.[ot]tf", requires = "dir")]
        pattern: String,
        /// Font files
        #[arg(required_unless_present = "dir")]
        files: Vec<PathBuf>,
    },
    /// List language systems and their features
    Report {
        /// Input .otf or .ttf font file
        input: PathBuf,
    },
}

impl Commands {
    pub fn run(self) -> Result<()> {
        match self {
            Commands::Merge { args, input, output } => {
                merge_file(&input, &output, &args.options())?;
            }
            Commands::Batch { args, out_dir, dir, pattern, files } => {
                let files = match dir {
                    Some(dir) => glob_fonts(&dir, &pattern)?,
                    None => files,
                };
                if files.is_empty() {
                    bail!("No fonts to merge");
                }
                merge_batch(&files, &out_dir, &args.options())?;
            }
            Commands::Report { input } => print_report(&input)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(std::iter::once("calt-merge").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn test_merge_defaults() {
        let Commands::Merge { args, input, output } =
            parse(&["merge", "-f", "ss13,ss15", "in.ttf", "out.ttf"])
        else {
            panic!("expected merge");
        };
        let options = args.options();
        assert_eq!(options.features, ["ss13", "ss15"]);
        assert_eq!(options.suffix, "Custom");
        assert!(options.rename);
        assert!(options.description);
        assert_eq!(input, PathBuf::from("in.ttf"));
        assert_eq!(output, PathBuf::from("out.ttf"));
    }

    #[test]
    fn test_merge_flags() {
        let Commands::Merge { args, .. } =
            parse(&["merge", "-f", "ss13", "--keep-names", "--no-description", "a", "b"])
        else {
            panic!("expected merge");
        };
        let options = args.options();
        assert!(!options.rename);
        assert!(!options.description);
    }

    #[test]
    fn test_keep_names_conflicts_with_suffix() {
        let args = ["calt-merge", "merge", "-f", "ss13", "-s", "X", "--keep-names", "a", "b"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_features_required() {
        assert!(Cli::try_parse_from(["calt-merge", "merge", "a", "b"]).is_err());
    }

    #[test]
    fn test_batch_needs_files_or_dir() {
        assert!(Cli::try_parse_from(["calt-merge", "batch", "-f", "ss13", "--out-dir", "o"]).is_err());
        let Commands::Batch { dir, files, .. } =
            parse(&["batch", "-f", "ss13", "--out-dir", "o", "--dir", "fonts"])
        else {
            panic!("expected batch");
        };
        assert_eq!(dir, Some(PathBuf::from("fonts")));
        assert!(files.is_empty());
    }
}
