//! Class file discovery under a class directory.

use std::path::{Path, PathBuf};

/// Recursively collect `.class` files below `dir`, sorted
pub fn collect_class_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_in_dir(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_in_dir(dir: &Path, files: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            // META-INF and friends never hold test classes
            if entry.file_name().to_string_lossy().contains('-') {
                continue;
            }
            collect_in_dir(&path, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("class") {
            files.push(path);
        }
    }
    Ok(())
}

/// Internal class name (`com/acme/FooTest`) of a class file below `root`
pub fn internal_name(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?.with_extension("");
    let segments: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(segments.join("/"))
}
