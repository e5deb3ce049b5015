use glob::{glob_with, MatchOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::warn;

/// Cell values treated as missing, besides the empty string.
pub const MISSING_SENTINELS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
    "#NA",
];

static NULL_REGEX: Lazy<Regex> = Lazy::new(|| {
    let alts: Vec<String> = MISSING_SENTINELS.iter().map(|s| regex::escape(s)).collect();
    Regex::new(&format!(r"^\s*(?:{})?\s*$", alts.join("|"))).expect("static null regex")
});

/// Regex handed to the CSV reader so sentinel cells load as null.
pub fn null_regex() -> Regex {
    NULL_REGEX.clone()
}

/// True for blank cells and the missing-value sentinels.
pub fn is_missing(raw: &str) -> bool {
    let s = raw.trim();
    s.is_empty() || MISSING_SENTINELS.contains(&s)
}

/// Names of the `*.csv` files directly inside `dir`, sorted.
pub fn list_csv_files(dir: &Path) -> Vec<String> {
    let pattern = dir.join("*.csv");
    let opts = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let mut names: Vec<String> = match glob_with(&pattern.to_string_lossy(), opts) {
        Ok(paths) => paths
            .filter_map(Result::ok)
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect(),
        Err(e) => {
            warn!(dir = %dir.display(), "cannot list csv files: {}", e);
            Vec::new()
        }
    };
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn sentinels_are_missing() {
        for s in ["", "  ", "NA", " NaN ", "null", "<NA>", "#N/A"] {
            assert!(is_missing(s), "{s:?}");
            assert!(null_regex().is_match(s), "{s:?}");
        }
    }

    #[test]
    fn real_values_are_kept() {
        for s in ["0", "sao paulo", "NAN-1", "none of them", "n"] {
            assert!(!is_missing(s), "{s:?}");
            assert!(!null_regex().is_match(s), "{s:?}");
        }
    }

    #[test]
    fn lists_only_csv_files() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("b.csv"), "")?;
        fs::write(dir.path().join("A.CSV"), "")?;
        fs::write(dir.path().join("notes.txt"), "")?;
        assert_eq!(list_csv_files(dir.path()), vec!["A.CSV", "b.csv"]);
        Ok(())
    }
}
