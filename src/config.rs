// ⚙️ Configuration for the `apd` command line
// JSON file, located by `--config` or the `APD_CONFIG` environment variable.

use crate::document::{Document, LineEnding};
use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Line ending used when writing a document back out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEndingChoice {
    /// Keep whatever the input used
    #[default]
    Auto,
    Lf,
    Crlf,
}

impl LineEndingChoice {
    pub fn apply(&self, doc: &mut Document) {
        match self {
            LineEndingChoice::Auto => {}
            LineEndingChoice::Lf => doc.set_line_ending(LineEnding::Lf),
            LineEndingChoice::Crlf => doc.set_line_ending(LineEnding::CrLf),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApdConfig {
    /// Employment period written on category-18 duplicates
    #[serde(default = "default_split_from")]
    pub split_from: NaiveDate,

    #[serde(default = "default_split_to")]
    pub split_to: NaiveDate,

    /// `check` exits non-zero when header totals disagree
    #[serde(default)]
    pub fail_on_discrepancy: bool,

    #[serde(default)]
    pub line_ending: LineEndingChoice,
}

impl Default for ApdConfig {
    fn default() -> Self {
        Self {
            split_from: default_split_from(),
            split_to: default_split_to(),
            fail_on_discrepancy: false,
            line_ending: LineEndingChoice::Auto,
        }
    }
}

impl ApdConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded config");
        Self::from_json(&text)
    }

    /// Config file if one was given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }
}

fn default_split_from() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 3, 15).unwrap_or(NaiveDate::MIN)
}

fn default_split_to() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 3, 31).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::apd_catalog;
    use crate::document::tests::sample_text;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ApdConfig::default();
        assert_eq!(config.split_from, NaiveDate::from_ymd_opt(2020, 3, 15).unwrap());
        assert_eq!(config.split_to, NaiveDate::from_ymd_opt(2020, 3, 31).unwrap());
        assert!(!config.fail_on_discrepancy);
        assert_eq!(config.line_ending, LineEndingChoice::Auto);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ApdConfig::from_json(r#"{"fail_on_discrepancy": true, "line_ending": "crlf"}"#).unwrap();
        assert!(config.fail_on_discrepancy);
        assert_eq!(config.line_ending, LineEndingChoice::Crlf);
        assert_eq!(config.split_from, NaiveDate::from_ymd_opt(2020, 3, 15).unwrap());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"split_from": "2021-01-01", "split_to": "2021-01-31"}}"#).unwrap();

        let config = ApdConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.split_from, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(config.split_to, NaiveDate::from_ymd_opt(2021, 1, 31).unwrap());
    }

    #[test]
    fn test_load_without_file_is_default() {
        assert_eq!(ApdConfig::load(None).unwrap(), ApdConfig::default());
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(ApdConfig::from_json("{not json").is_err());
    }

    #[test]
    fn test_line_ending_override() {
        let mut doc = Document::parse(apd_catalog().unwrap(), &sample_text()).unwrap();
        LineEndingChoice::Crlf.apply(&mut doc);
        assert!(doc.render().unwrap().contains("\r\nEOF"));
        LineEndingChoice::Auto.apply(&mut doc);
        assert_eq!(doc.line_ending(), LineEnding::CrLf);
    }
}
