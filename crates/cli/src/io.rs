//! Shared font I/O utilities.

use std::{
    collections::HashSet,
    fs::{create_dir_all, read},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use glob::glob;
use tempfile::NamedTempFile;

/// A font file handle for I/O operations.
#[derive(Debug, Clone)]
pub struct FontFile {
    path: PathBuf,
}

impl FontFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read font data from the file.
    pub fn read(&self) -> Result<Vec<u8>> {
        read(&self.path).with_context(|| format!("Failed to read font: {}", self.path.display()))
    }

    /// Write font data through a temporary file in the destination directory,
    /// renamed over the target once complete. A failed write leaves any
    /// existing file in place.
    pub fn write_staged(&self, data: impl AsRef<[u8]>) -> Result<()> {
        self.ensure_parent_dir()?;
        let dir = self.dir();
        let mut staged = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        staged
            .write_all(data.as_ref())
            .with_context(|| format!("Failed to write font: {}", self.path.display()))?;
        staged
            .persist(&self.path)
            .with_context(|| format!("Failed to move font into place: {}", self.path.display()))?;
        Ok(())
    }

    /// Create parent directory if it doesn't exist.
    pub fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        Ok(())
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl AsRef<Path> for FontFile {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Find fonts matching a glob pattern in a directory.
pub fn glob_fonts(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern = dir.join(pattern);
    let pattern_str = pattern.to_str().context("Invalid pattern path")?;
    let mut paths: Vec<_> = glob(pattern_str)
        .with_context(|| format!("Failed to glob pattern: {pattern_str}"))?
        .filter_map(Result::ok)
        .collect();
    paths.sort();
    Ok(paths)
}

/// Where a batch writes `input`: same file name under `out_dir`.
pub fn output_path(out_dir: &Path, input: &Path) -> Result<PathBuf> {
    let name = input
        .file_name()
        .with_context(|| format!("Not a font file path: {}", input.display()))?;
    Ok(out_dir.join(name))
}

/// Batch output paths for `inputs`, rejecting two inputs that share a file
/// name and any output that would overwrite its own input.
pub fn output_paths(out_dir: &Path, inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let output = output_path(out_dir, input)?;
            if !seen.insert(output.clone()) {
                bail!("More than one input would be written to {}", output.display());
            }
            if is_same_file(input, &output) {
                bail!("Output would overwrite input: {}", input.display());
            }
            Ok(output)
        })
        .collect()
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    a == b
        || matches!((a.canonicalize(), b.canonicalize()), (Ok(a), Ok(b)) if a == b)
}
