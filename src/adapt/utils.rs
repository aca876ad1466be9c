use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::error::{MigrationError, Result};

/// Two-digit years at or above this belong to the 1900s.
const CENTURY_PIVOT: u32 = 90;

static SPAN_YEARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})\D*(\d{4})").expect("span regex is valid"));

/// `"04"` → `"2004"`, `"97"` → `"1997"`.
pub fn expand_two_digit_year(yy: &str) -> Option<String> {
    if yy.len() != 2 || !yy.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let n: u32 = yy.parse().ok()?;
    let century = if n >= CENTURY_PIVOT { 1900 } else { 2000 };
    Some(format!("{:04}", century + n))
}

pub fn file_stem(path: &Path) -> Result<&str> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| MigrationError::UnrecognizedFileName {
            path: path.to_path_buf(),
        })
}

/// Last `n` characters of the file stem, e.g. `"0405"` for `county0405.zip`.
pub fn stem_suffix(path: &Path, n: usize) -> Result<String> {
    let stem = file_stem(path)?;
    let chars: Vec<char> = stem.chars().collect();
    if chars.len() < n {
        return Err(MigrationError::UnrecognizedFileName {
            path: path.to_path_buf(),
        });
    }
    Ok(chars[chars.len() - n..].iter().collect())
}

/// Destination year from the last two digits of the file stem
/// (`countyinflow1112.csv` → `2012`).
pub fn year_from_stem_suffix(path: &Path) -> Result<String> {
    let yy = stem_suffix(path, 2)?;
    expand_two_digit_year(&yy).ok_or_else(|| MigrationError::UnrecognizedFileName {
        path: path.to_path_buf(),
    })
}

/// The two four-digit boundary years embedded in a span archive's name
/// (`county_migration_1995_1996.zip` → `(1995, 1996)`).
pub fn span_years(path: &Path) -> Result<(u32, u32)> {
    let stem = file_stem(path)?;
    SPAN_YEARS
        .captures(stem)
        .and_then(|c| Some((c[1].parse().ok()?, c[2].parse().ok()?)))
        .ok_or_else(|| MigrationError::UnrecognizedFileName {
            path: path.to_path_buf(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_with_century_pivot() {
        assert_eq!(expand_two_digit_year("04").as_deref(), Some("2004"));
        assert_eq!(expand_two_digit_year("89").as_deref(), Some("2089"));
        assert_eq!(expand_two_digit_year("97").as_deref(), Some("1997"));
        assert_eq!(expand_two_digit_year("9").as_deref(), None);
        assert_eq!(expand_two_digit_year("x1").as_deref(), None);
    }

    #[test]
    fn year_from_suffix() -> anyhow::Result<()> {
        assert_eq!(
            year_from_stem_suffix(Path::new("data/format3/countyinflow1112.csv"))?,
            "2012"
        );
        assert_eq!(year_from_stem_suffix(Path::new("county0405.zip"))?, "2005");
        assert!(year_from_stem_suffix(Path::new("inflow.csv")).is_err());
        Ok(())
    }

    #[test]
    fn stem_suffix_slug() -> anyhow::Result<()> {
        assert_eq!(stem_suffix(Path::new("data/format2/county0405.zip"), 4)?, "0405");
        assert!(stem_suffix(Path::new("a.zip"), 4).is_err());
        Ok(())
    }

    #[test]
    fn span_years_from_name() -> anyhow::Result<()> {
        assert_eq!(
            span_years(Path::new("county_migration_1995_1996.zip"))?,
            (1995, 1996)
        );
        assert_eq!(span_years(Path::new("1999to2000.zip"))?, (1999, 2000));
        assert!(span_years(Path::new("county0405.zip")).is_err());
        Ok(())
    }
}
