//! Merge member sequence directories into their assembly's directory.
//!
//! An assembly directory is created at most once: if it already exists the
//! assembly is skipped, whatever its contents. A copy that fails half-way
//! leaves a partial directory behind and aborts the pass; that directory has
//! to be removed by hand before the next pass will retry.

use std::fs;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::db::AnnotationDb;
use crate::db::models::UnitKind;
use crate::errors::ReconcileError;
use crate::layout::ResultsLayout;

/// Consolidate every assembly in `assemblies` whose directory does not exist
/// yet. Returns the assemblies whose directory was created.
pub fn consolidate(
    db: &AnnotationDb,
    layout: &ResultsLayout,
    assemblies: &[String],
) -> Result<Vec<String>, ReconcileError> {
    let mut created = Vec::new();
    for assembly in assemblies {
        if consolidate_assembly(db, layout, assembly)? {
            created.push(assembly.clone());
        }
    }
    Ok(created)
}

/// Copy each chromosome member of `assembly` into
/// `<results_dir>/<assembly>/<member>/`. Returns false when the assembly
/// directory was already present.
pub fn consolidate_assembly(
    db: &AnnotationDb,
    layout: &ResultsLayout,
    assembly: &str,
) -> Result<bool, ReconcileError> {
    let target = layout.assembly_dir(assembly);
    if target.exists() {
        debug!(assembly, path = %target.display(), "assembly directory exists, skipping");
        return Ok(false);
    }

    let members = db.members_of(assembly)?;
    fs::create_dir_all(&target).map_err(|source| ReconcileError::ConsolidationFailed {
        assembly: assembly.to_string(),
        member: String::new(),
        path: target.clone(),
        source,
    })?;

    let mut copied = 0usize;
    for member in members.iter().filter(|u| u.kind == UnitKind::Chromosome) {
        let files = copy_tree(&layout.unit_dir(&member.accession), &target.join(&member.accession))
            .map_err(|(path, source)| ReconcileError::ConsolidationFailed {
                assembly: assembly.to_string(),
                member: member.accession.clone(),
                path,
                source,
            })?;
        debug!(assembly, member = %member.accession, files, "member copied");
        copied += 1;
    }

    info!(assembly, members = copied, path = %target.display(), "assembly consolidated");
    Ok(true)
}

/// Recursively copy `src` to `dst`, preserving structure. Symlinks are
/// followed and their targets copied. Returns the number of files copied, or
/// the path that failed.
fn copy_tree(src: &Path, dst: &Path) -> Result<usize, (std::path::PathBuf, std::io::Error)> {
    let mut files = 0;
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            (path, std::io::Error::from(e))
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| {
                (
                    entry.path().to_path_buf(),
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
                )
            })?;
        let dest = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(|e| (dest.clone(), e))?;
        } else {
            fs::copy(entry.path(), &dest).map_err(|e| (entry.path().to_path_buf(), e))?;
            files += 1;
        }
    }
    Ok(files)
}
