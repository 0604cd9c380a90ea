//! JSON report files

use crate::error::{ReportError, ReportResult};
use crate::model::{LoadReport, SuiteReport};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// File-name-safe form of a run name: lower-case ASCII alphanumerics joined
/// by single dashes
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "run".to_string()
    } else {
        slug.to_string()
    }
}

pub fn load_report_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}-report.json", slugify(name)))
}

pub fn suite_report_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}-results.json", slugify(name)))
}

/// Write `<dir>/<slug>-report.json`, creating `dir` when missing
pub fn write_load_report(dir: &Path, report: &LoadReport) -> ReportResult<PathBuf> {
    let path = load_report_path(dir, &report.name);
    write_pretty(&path, report)?;
    Ok(path)
}

/// Write `<dir>/<slug>-results.json`, creating `dir` when missing
pub fn write_suite_report(dir: &Path, report: &SuiteReport) -> ReportResult<PathBuf> {
    let path = suite_report_path(dir, &report.name);
    write_pretty(&path, report)?;
    Ok(path)
}

fn write_pretty<T: Serialize>(path: &Path, value: &T) -> ReportResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ReportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Report written to {}", path.display());
    Ok(())
}
