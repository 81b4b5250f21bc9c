//! Site root access shared by the release tools

use crate::error::{PrecacheError, PrecacheResult};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Suffix of the temporary sibling used by [`write_atomic`]
pub const TEMP_SUFFIX: &str = ".tmp";

/// One page document at the site root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// File name relative to the site root, e.g. `products.html`
    pub name: String,
    pub text: String,
}

/// Ensure `root` is an existing directory
pub async fn ensure_root(root: &Path) -> PrecacheResult<()> {
    match fs::metadata(root).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        _ => Err(PrecacheError::SiteRootNotFound(root.to_path_buf())),
    }
}

/// Paths of the `*.html` files directly under `root`, sorted by name
pub async fn page_paths(root: &Path) -> PrecacheResult<Vec<PathBuf>> {
    ensure_root(root).await?;

    let mut entries = fs::read_dir(root)
        .await
        .map_err(|e| PrecacheError::io(format!("listing {}", root.display()), e))?;

    let mut pages = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PrecacheError::io(format!("listing {}", root.display()), e))?
    {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        let is_html = entry
            .file_name()
            .to_string_lossy()
            .to_ascii_lowercase()
            .ends_with(".html");
        if is_file && is_html {
            pages.push(entry.path());
        }
    }

    pages.sort();
    Ok(pages)
}

/// Every page document at the site root, read into memory
pub async fn load_pages(root: &Path) -> PrecacheResult<Vec<Page>> {
    let mut pages = Vec::new();
    for path in page_paths(root).await? {
        let text = read_text(&path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        pages.push(Page { name, text });
    }
    Ok(pages)
}

/// Read a UTF-8 file with path context on failure
pub async fn read_text(path: &Path) -> PrecacheResult<String> {
    fs::read_to_string(path)
        .await
        .map_err(|e| PrecacheError::io(format!("reading {}", path.display()), e))
}

/// Read a file that may legitimately be absent
pub async fn read_optional(path: &Path) -> PrecacheResult<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PrecacheError::io(format!("reading {}", path.display()), e)),
    }
}

/// Whether `path` is an existing regular file
pub async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

/// Write via a temporary sibling and rename
pub async fn write_atomic(path: &Path, contents: &str) -> PrecacheResult<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(TEMP_SUFFIX);
    let temp = PathBuf::from(temp);

    fs::write(&temp, contents)
        .await
        .map_err(|e| PrecacheError::io(format!("writing {}", temp.display()), e))?;
    fs::rename(&temp, path)
        .await
        .map_err(|e| PrecacheError::io(format!("replacing {}", path.display()), e))
}
