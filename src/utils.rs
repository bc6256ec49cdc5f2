//! Small helpers shared by the registry, the snapshot store and the logs.
//!
//! - Taxonomy list flattening and re-expansion
//! - Whole-file replacement through a temporary sibling file
//! - String truncation for log previews and listings

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Split a comma-separated taxonomy column into trimmed values.
///
/// Every segment is kept, empty ones included, so the result always has at
/// least one element and `split_taxonomy(&join_taxonomy(v)) == v` for
/// trimmed values.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(split_taxonomy(" IoT , Energy"), vec!["IoT", "Energy"]);
/// assert_eq!(split_taxonomy(""), vec![""]);
/// ```
pub fn split_taxonomy(raw: &str) -> Vec<String> {
    raw.split(',').map(|value| value.trim().to_string()).collect()
}

/// Flatten a taxonomy list back into its column form.
pub fn join_taxonomy(values: &[String]) -> String {
    values.join(",")
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary)
/// with `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Shorten text for display, ending in `…` when cut.
///
/// The result holds at most `max` bytes of `s` (on a character boundary),
/// preferring to cut at the last whitespace so words stay whole.
pub fn truncate_for_display(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    let head = &s[..cut];
    let head = match head.rfind(char::is_whitespace) {
        Some(space) if space > 0 => &head[..space],
        _ => head,
    };
    format!("{}…", head.trim_end())
}

/// Replace the contents of `path` as a single step.
///
/// `write` fills a temporary file next to `path`; the temporary file is then
/// renamed over the target, so readers see either the previous file or the
/// complete new one. Parent directories are created as needed.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn replace_file<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut fs::File) -> io::Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_sibling(path);
    let result = fs::File::create(&tmp_path).and_then(|mut file| {
        write(&mut file)?;
        file.flush()?;
        file.sync_all()
    });

    if let Err(e) = result.and_then(|_| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    debug!("Replaced file");
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_taxonomy_trims() {
        assert_eq!(
            split_taxonomy(" IoT ,Smart Home,  Energy "),
            vec!["IoT", "Smart Home", "Energy"]
        );
    }

    #[test]
    fn test_split_taxonomy_keeps_empty_segments() {
        assert_eq!(split_taxonomy(""), vec![""]);
        assert_eq!(split_taxonomy(" , "), vec!["", ""]);
        assert_eq!(split_taxonomy("IoT, ,Energy"), vec!["IoT", "", "Energy"]);
    }

    #[test]
    fn test_join_taxonomy() {
        let values = vec!["IoT".to_string(), "Energy".to_string()];
        assert_eq!(join_taxonomy(&values), "IoT,Energy");
        assert_eq!(split_taxonomy(&join_taxonomy(&values)), values);
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let result = truncate_for_log("ééééé", 3);
        assert!(result.starts_with('é'));
        assert!(result.contains("(+8 bytes)"));
    }

    #[test]
    fn test_truncate_for_display() {
        assert_eq!(truncate_for_display("short", 10), "short");
        assert_eq!(
            truncate_for_display("Utilities roll out smart meters", 20),
            "Utilities roll out…"
        );
        assert_eq!(truncate_for_display("ééééé", 3), "é…");
        assert!(!truncate_for_display(&"word ".repeat(200), 50).contains("bytes"));
    }

    #[test]
    fn test_replace_file_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        replace_file(&path, |f| f.write_all(b"first version, longer")).unwrap();
        replace_file(&path, |f| f.write_all(b"second")).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_replace_file_keeps_old_contents_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "original").unwrap();

        let err = replace_file(&path, |_| Err(io::Error::other("boom")));
        assert!(err.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
    }
}
