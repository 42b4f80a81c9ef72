use std::{fs, path::Path};

use anyhow::{Context, Result};

/// Create or overwrite a text file, creating missing parent directories.
/// Filesystem failures are fatal to the run and are not retried.
pub fn write_text_to_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory `{}`", parent.display()))?;
        }
    }
    fs::write(path, content).with_context(|| format!("failed to write `{}`", path.display()))
}

#[cfg(test)]
mod tests {
    use super::write_text_to_file;

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/out.py");
        write_text_to_file(&path, "print('x')\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "print('x')\n");
    }

    #[test]
    fn overwrites_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.py");
        write_text_to_file(&path, "old").unwrap();
        write_text_to_file(&path, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }
}
