//! Program files: JSON for `.json` paths, bincode for everything else.

use anyhow::{Context, Result};
use irmut_ir::{validate_program, Program};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Reads and validates a program
pub fn read_program(path: &Path) -> Result<Program> {
    let program = if is_json(path) {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Program::from_json(&text)
    } else {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Program::from_bytes(&bytes)
    }
    .with_context(|| format!("Failed to parse {}", path.display()))?;

    validate_program(&program).with_context(|| format!("Invalid program in {}", path.display()))?;
    debug!(path = %path.display(), functions = program.num_functions(), "Loaded program");
    Ok(program)
}

/// Writes the whole program or nothing: the bytes land in a sibling temp file
/// that is renamed over `path`.
pub fn write_program(program: &Program, path: &Path) -> Result<()> {
    let bytes = if is_json(path) {
        program.to_json()?.into_bytes()
    } else {
        program.to_bytes()?
    };

    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let written = fs::write(&tmp, bytes)
        .with_context(|| format!("Failed to write {}", tmp.display()))
        .and_then(|()| {
            fs::rename(&tmp, path)
                .with_context(|| format!("Failed to move output to {}", path.display()))
        });
    if written.is_err() {
        if let Err(e) = fs::remove_file(&tmp) {
            debug!(path = %tmp.display(), "Could not remove temp file: {}", e);
        }
    }
    written
}

/// Every readable program in `dir`, in file name order. Unreadable files are skipped.
pub fn read_seed_dir(dir: &Path) -> Result<Vec<Program>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut seeds = Vec::with_capacity(paths.len());
    for path in paths {
        match read_program(&path) {
            Ok(program) => seeds.push(program),
            Err(e) => warn!(path = %path.display(), "Skipping seed: {:#}", e),
        }
    }
    Ok(seeds)
}
