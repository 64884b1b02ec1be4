use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::{ProbeError, ProbeResult};

pub(crate) fn read_string(path: impl AsRef<Path>) -> ProbeResult<String> {
    let path = path.as_ref();

    let raw = std::fs::read_to_string(path).map_err(|e| ProbeError::io(path, e))?;
    Ok(raw.trim().to_string())
}

pub(crate) fn read_i64(path: impl AsRef<Path>) -> ProbeResult<i64> {
    let path = path.as_ref();
    let raw = read_string(path)?;

    raw.parse()
        .map_err(|e| ProbeError::parse("sysfs integer", format!("{}: {e}", path.display())))
}

/// Reads an attribute that may legitimately be missing or root-only.
///
/// Missing, unreadable and placeholder values all become an empty string.
pub(crate) fn read_attr(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();

    match read_string(path) {
        Ok(value) if !is_placeholder(&value) => value,
        Ok(_) => String::new(),
        Err(e) => {
            tracing::trace!("{e}");
            String::new()
        }
    }
}

/// Firmware tables are full of filler strings
pub(crate) fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || value.eq_ignore_ascii_case("unknown")
        || value.eq_ignore_ascii_case("not specified")
        || value.eq_ignore_ascii_case("to be filled by o.e.m.")
        || value.eq_ignore_ascii_case("default string")
}

pub(crate) fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// Immediate subdirectories of `root`, sorted by name. A missing `root` yields
/// nothing.
pub(crate) fn child_dirs(root: impl AsRef<Path>) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter();

    walker
        .filter_map(|entry| entry.ok())
        .filter(|entry| !is_hidden(entry) && entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn read_attr_treats_filler_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("board_serial"), "Default string\n").unwrap();
        fs::write(temp_dir.path().join("board_name"), "PRIME X570-PRO\n").unwrap();

        assert_eq!(read_attr(temp_dir.path().join("board_serial")), "");
        assert_eq!(read_attr(temp_dir.path().join("board_name")), "PRIME X570-PRO");
        assert_eq!(read_attr(temp_dir.path().join("missing")), "");
    }

    #[test]
    fn child_dirs_skips_files_and_hidden_entries() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("card1")).unwrap();
        fs::create_dir(temp_dir.path().join("card0")).unwrap();
        fs::create_dir(temp_dir.path().join(".cache")).unwrap();
        fs::write(temp_dir.path().join("version"), "1").unwrap();

        let names: Vec<String> = child_dirs(temp_dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["card0", "card1"]);
    }

    #[test]
    fn read_i64_reports_unparseable_values() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("ifindex"), "two\n").unwrap();

        assert!(matches!(
            read_i64(temp_dir.path().join("ifindex")),
            Err(ProbeError::Parse { .. })
        ));
    }
}
