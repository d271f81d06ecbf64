use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::types::ArticolWithReferences;

pub const EXPORT_FILE_NAME: &str = "articole_full.json";
pub const DOWNLOAD_FILE_NAME: &str = "downloadArticoleFull.json";

/// Writes the full Articol/Reference graph to `<dir>/articole_full.json`,
/// creating `dir` when missing and replacing any earlier export.
pub fn write_export(dir: &Path, graph: &[ArticolWithReferences]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating export dir {}", dir.display()))?;
    let path = dir.join(EXPORT_FILE_NAME);
    let json = serde_json::to_vec(graph).context("serializing export")?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    log::info!("📦 Exported {} articole to {}", graph.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_missing_dir_and_overwrites() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("exported");

        let path = write_export(&dir, &[]).unwrap();
        assert_eq!(path, dir.join(EXPORT_FILE_NAME));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");

        std::fs::write(&path, "stale").unwrap();
        write_export(&dir, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
