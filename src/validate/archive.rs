//! Migration archive analysis and cross-checking
//!
//! An export archive holds paginated JSON files named `<type>_<page>.json`,
//! each a JSON array. Counting the entries per type gives a point-in-time
//! ground truth that is compared against both the live source and the target.

use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use log::{debug, info};
use tar::{Archive, EntryType};
use tempfile::TempDir;

use super::compare::{ComparisonOptions, ComparisonResult, diff};
use super::snapshot::{MigrationArchiveMetrics, RepositorySnapshot};
use crate::error::ArchiveError;

type Result<T> = std::result::Result<T, ArchiveError>;

const ISSUES_PREFIX: &str = "issues_";
const PULL_REQUESTS_PREFIX: &str = "pull_requests_";
const PROTECTED_BRANCHES_PREFIX: &str = "protected_branches_";
const RELEASES_PREFIX: &str = "releases_";

/// Rows comparing the archive against the live source and the target.
///
/// Archive vs Source checks export completeness (`archive - source`).
/// Archive vs Target checks migration fidelity (`archive [+1 issues] - target`).
pub fn cross_check(
    archive: &MigrationArchiveMetrics,
    source: &RepositorySnapshot,
    target: &RepositorySnapshot,
    options: &ComparisonOptions,
) -> Vec<ComparisonResult> {
    let mut results = Vec::with_capacity(8);

    if !options.skip_issues {
        results.push(ComparisonResult::count(
            "Archive vs Source Issues",
            archive.issue_count,
            source.issue_count,
            diff(archive.issue_count, source.issue_count),
        ));
    }
    results.push(ComparisonResult::count(
        "Archive vs Source Pull Requests",
        archive.pull_request_count,
        source.pull_requests.total(),
        diff(archive.pull_request_count, source.pull_requests.total()),
    ));
    results.push(ComparisonResult::count(
        "Archive vs Source Protected Branches",
        archive.protected_branch_count,
        source.branch_protection_rule_count,
        diff(
            archive.protected_branch_count,
            source.branch_protection_rule_count,
        ),
    ));
    if !options.skip_releases {
        results.push(ComparisonResult::count(
            "Archive vs Source Releases",
            archive.release_count,
            source.release_count,
            diff(archive.release_count, source.release_count),
        ));
    }

    if !options.skip_issues {
        let expected = archive.issue_count + options.issue_offset();
        results.push(ComparisonResult::count(
            "Archive vs Target Issues",
            archive.issue_count,
            target.issue_count,
            diff(expected, target.issue_count),
        ));
    }
    results.push(ComparisonResult::count(
        "Archive vs Target Pull Requests",
        archive.pull_request_count,
        target.pull_requests.total(),
        diff(archive.pull_request_count, target.pull_requests.total()),
    ));
    results.push(ComparisonResult::count(
        "Archive vs Target Protected Branches",
        archive.protected_branch_count,
        target.branch_protection_rule_count,
        diff(
            archive.protected_branch_count,
            target.branch_protection_rule_count,
        ),
    ));
    if !options.skip_releases {
        results.push(ComparisonResult::count(
            "Archive vs Target Releases",
            archive.release_count,
            target.release_count,
            diff(archive.release_count, target.release_count),
        ));
    }

    results
}

/// Count archive entries per type in an extracted archive directory.
///
/// A directory holding no JSON files and exactly one subdirectory is treated
/// as a wrapper and descended into.
pub fn analyze_archive(dir: &Path) -> Result<MigrationArchiveMetrics> {
    if !dir.is_dir() {
        return Err(ArchiveError::NotFound(dir.display().to_string()));
    }

    let root = archive_root(dir)?;
    debug!("Analyzing migration archive at {}", root.display());

    let mut metrics = MigrationArchiveMetrics::default();
    for file in json_files(&root)? {
        let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let slot = if name.starts_with(ISSUES_PREFIX) {
            &mut metrics.issue_count
        } else if name.starts_with(PULL_REQUESTS_PREFIX) {
            &mut metrics.pull_request_count
        } else if name.starts_with(PROTECTED_BRANCHES_PREFIX) {
            &mut metrics.protected_branch_count
        } else if name.starts_with(RELEASES_PREFIX) {
            &mut metrics.release_count
        } else {
            continue;
        };

        let entries = count_entries(&file)?;
        debug!("{}: {} entries", name, entries);
        *slot += entries;
    }

    info!(
        "Archive contains {} issues, {} pull requests, {} protected branches, {} releases",
        metrics.issue_count,
        metrics.pull_request_count,
        metrics.protected_branch_count,
        metrics.release_count
    );
    Ok(metrics)
}

/// Extract a `.tar.gz` archive into `dest`.
///
/// Absolute paths, `..` components and link entries are rejected before
/// anything is written.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<()> {
    if !archive_path.is_file() {
        return Err(ArchiveError::NotFound(archive_path.display().to_string()));
    }

    fs::create_dir_all(dest).map_err(|e| ArchiveError::Extract(e.to_string()))?;

    let file = File::open(archive_path).map_err(|e| ArchiveError::Extract(e.to_string()))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    let entries = archive
        .entries()
        .map_err(|e| ArchiveError::Extract(e.to_string()))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| ArchiveError::Extract(e.to_string()))?;
        let path = entry
            .path()
            .map_err(|e| ArchiveError::Extract(e.to_string()))?
            .into_owned();

        if !is_safe_entry_path(&path) {
            return Err(ArchiveError::UnsafePath(path.display().to_string()));
        }
        if matches!(
            entry.header().entry_type(),
            EntryType::Symlink | EntryType::Link
        ) {
            return Err(ArchiveError::UnsafePath(path.display().to_string()));
        }

        let unpacked = entry
            .unpack_in(dest)
            .map_err(|e| ArchiveError::Extract(e.to_string()))?;
        if !unpacked {
            return Err(ArchiveError::UnsafePath(path.display().to_string()));
        }
    }

    Ok(())
}

/// Analyze an archive given as a directory or a `.tar.gz`/`.tgz` file.
pub fn load_archive(path: &Path) -> Result<MigrationArchiveMetrics> {
    if path.is_dir() {
        return analyze_archive(path);
    }

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if !(name.ends_with(".tar.gz") || name.ends_with(".tgz")) {
        return Err(ArchiveError::NotFound(format!(
            "{} (expected a directory or .tar.gz file)",
            path.display()
        )));
    }

    let workdir = TempDir::new().map_err(|e| ArchiveError::Extract(e.to_string()))?;
    info!("Extracting {} for analysis", path.display());
    extract_archive(path, workdir.path())?;
    analyze_archive(workdir.path())
}

fn is_safe_entry_path(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn archive_root(dir: &Path) -> Result<PathBuf> {
    if !json_files(dir)?.is_empty() {
        return Ok(dir.to_path_buf());
    }

    let subdirs: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| ArchiveError::NotFound(e.to_string()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();

    match subdirs.as_slice() {
        [only] => Ok(only.clone()),
        _ => Ok(dir.to_path_buf()),
    }
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| ArchiveError::NotFound(e.to_string()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

fn count_entries(file: &Path) -> Result<u64> {
    let parse_err = |reason: String| ArchiveError::Parse {
        file: file.display().to_string(),
        reason,
    };

    let contents = fs::read_to_string(file).map_err(|e| parse_err(e.to_string()))?;
    let value: serde_json::Value =
        serde_json::from_str(&contents).map_err(|e| parse_err(e.to_string()))?;

    value
        .as_array()
        .map(|items| items.len() as u64)
        .ok_or_else(|| parse_err("expected a JSON array".to_string()))
}
