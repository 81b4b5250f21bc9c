//! Build output enumeration

use crate::error::{PrecacheError, PrecacheResult};
use std::path::Path;
use walkdir::WalkDir;

/// Filters applied to enumerated build artifacts
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    /// Extensions (without dot) of pre-compressed siblings
    pub excluded_extensions: Vec<String>,

    /// Exact file names of OS metadata files
    pub excluded_names: Vec<String>,

    /// Root-relative paths never listed, such as the proxy being generated
    pub excluded_paths: Vec<String>,
}

impl ScanFilter {
    /// Whether a root-relative, forward-slash path belongs in the manifest
    pub fn keeps(&self, web_path: &str) -> bool {
        if web_path.is_empty() || self.excluded_paths.iter().any(|p| p == web_path) {
            return false;
        }

        let name = web_path.rsplit('/').next().unwrap_or(web_path);
        if self.excluded_names.iter().any(|n| n == name) {
            return false;
        }

        match name.rsplit_once('.') {
            Some((_, ext)) => !self
                .excluded_extensions
                .iter()
                .any(|excluded| excluded.eq_ignore_ascii_case(ext)),
            None => true,
        }
    }
}

/// Every retained file under `root`, as sorted root-relative web paths
pub fn scan_build_output(root: &Path, filter: &ScanFilter) -> PrecacheResult<Vec<String>> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            let context = format!("scanning {}", root.display());
            match e.into_io_error() {
                Some(source) => PrecacheError::io(context, source),
                None => PrecacheError::Internal(format!("{} failed: symlink loop", context)),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let web_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if filter.keeps(&web_path) {
            paths.push(web_path);
        }
    }

    paths.sort();
    paths.dedup();
    Ok(paths)
}
