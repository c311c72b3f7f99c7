use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration: per-sheet column layouts plus batch settings.
///
/// Parse with [`CheckConfig::from_toml`]; it normalizes column keys and
/// validates the result.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckConfig {
    #[serde(rename = "sheets_config", alias = "sheets", default)]
    pub sheets: BTreeMap<String, SheetConfig>,
    /// Save the workbook after this many processed rows. 0 disables
    /// checkpoints (the end-of-sheet and end-of-run saves still happen).
    #[serde(default = "default_numrec_before_save")]
    pub numrec_before_save: usize,
    /// Rows checked within this many days are skipped. 0 never skips.
    #[serde(default = "default_skip_days")]
    pub skip_days: u32,
    /// Per-registry endpoint overrides keyed by registry name.
    #[serde(default)]
    pub registries: BTreeMap<String, RegistrySettings>,
}

fn default_numrec_before_save() -> usize {
    20
}

fn default_skip_days() -> u32 {
    7
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            sheets: BTreeMap::new(),
            numrec_before_save: default_numrec_before_save(),
            skip_days: default_skip_days(),
            registries: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrySettings {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Sheet layout
// ---------------------------------------------------------------------------

/// How a `sheets_config` key is compared against workbook sheet names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetMatch {
    /// Key must appear somewhere in the sheet name (case-insensitive).
    #[default]
    Contains,
    /// Key must equal the sheet name (case-insensitive).
    Exact,
}

/// Column layout for one sheet pattern. All indices are zero-based.
///
/// In TOML every logical column is written `<name>_index`
/// (`license_index = 1`); `licence_index` is accepted as a spelling of
/// `license_index`.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetConfig {
    pub status_index: usize,
    pub last_checked_index: usize,
    /// Leading header cell that marks the header row (e.g. "surname").
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default, rename = "match")]
    pub match_mode: SheetMatch,
    #[serde(flatten)]
    columns: BTreeMap<String, usize>,
}

impl SheetConfig {
    pub fn new(status_index: usize, last_checked_index: usize) -> Self {
        Self {
            status_index,
            last_checked_index,
            header: None,
            match_mode: SheetMatch::Contains,
            columns: BTreeMap::new(),
        }
    }

    pub fn with_column(mut self, name: &str, index: usize) -> Self {
        self.columns.insert(name.to_string(), index);
        self
    }

    pub fn with_header(mut self, sentinel: &str) -> Self {
        self.header = Some(sentinel.to_string());
        self
    }

    /// Index of a logical column (`license`, `surname`, ...).
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    pub fn columns(&self) -> &BTreeMap<String, usize> {
        &self.columns
    }

    fn normalize_columns(&mut self, key: &str) -> Result<(), ReconError> {
        let raw = std::mem::take(&mut self.columns);
        for (name, index) in raw {
            let logical = name.strip_suffix("_index").ok_or_else(|| {
                ReconError::ConfigValidation(format!(
                    "sheet '{key}': unknown key '{name}' (column keys end in _index)"
                ))
            })?;
            let logical = match logical {
                "licence" => "license",
                other => other,
            };
            if self.columns.insert(logical.to_string(), index).is_some() {
                return Err(ReconError::ConfigValidation(format!(
                    "sheet '{key}': column '{logical}' given twice"
                )));
            }
        }
        Ok(())
    }

    fn validate(&self, key: &str) -> Result<(), ReconError> {
        if self.status_index == self.last_checked_index {
            return Err(ReconError::ConfigValidation(format!(
                "sheet '{key}': status_index and last_checked_index are both {}",
                self.status_index
            )));
        }
        for (name, &index) in &self.columns {
            if index == self.status_index || index == self.last_checked_index {
                return Err(ReconError::ConfigValidation(format!(
                    "sheet '{key}': column '{name}' shares index {index} with a control column"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl CheckConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let mut config: CheckConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        for (key, sheet) in config.sheets.iter_mut() {
            sheet.normalize_columns(key)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        for (key, sheet) in &self.sheets {
            if key.trim().is_empty() {
                return Err(ReconError::ConfigValidation(
                    "sheet keys must not be empty".into(),
                ));
            }
            sheet.validate(key)?;
        }
        Ok(())
    }

    /// Find the layout for a workbook sheet. An exact (case-insensitive)
    /// key wins; otherwise the longest `contains` key found in the name.
    pub fn sheet_config_for(&self, sheet_name: &str) -> Option<(&str, &SheetConfig)> {
        let name = sheet_name.trim().to_lowercase();

        if let Some((key, cfg)) = self
            .sheets
            .iter()
            .find(|(key, _)| key.trim().to_lowercase() == name)
        {
            return Some((key.as_str(), cfg));
        }

        self.sheets
            .iter()
            .filter(|(key, cfg)| {
                cfg.match_mode == SheetMatch::Contains && name.contains(&key.trim().to_lowercase())
            })
            .max_by_key(|(key, _)| key.trim().len())
            .map(|(key, cfg)| (key.as_str(), cfg))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
numrec_before_save = 5
skip_days = 14

[sheets_config."QBCC Individual"]
license_index = 1
status_index = 2
last_checked_index = 3

[sheets_config.qbcc]
licence_index = 0
status_index = 4
last_checked_index = 5

[sheets_config.Surveyors]
header = "surname"
surname_index = 0
first_name_index = 1
company_index = 2
status_index = 5
last_checked_index = 6
match = "exact"

[registries.pool-safety]
base_url = "http://localhost:9999"
timeout_secs = 5
"#;

    #[test]
    fn parse_sample() {
        let config = CheckConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.numrec_before_save, 5);
        assert_eq!(config.skip_days, 14);
        assert_eq!(config.sheets.len(), 3);

        let qbcc = &config.sheets["QBCC Individual"];
        assert_eq!(qbcc.column("license"), Some(1));
        assert_eq!(qbcc.status_index, 2);
        assert_eq!(qbcc.last_checked_index, 3);

        let surveyors = &config.sheets["Surveyors"];
        assert_eq!(surveyors.header.as_deref(), Some("surname"));
        assert_eq!(surveyors.match_mode, SheetMatch::Exact);
        assert_eq!(surveyors.column("first_name"), Some(1));
        assert_eq!(surveyors.column("company"), Some(2));

        let pool = &config.registries["pool-safety"];
        assert_eq!(pool.base_url.as_deref(), Some("http://localhost:9999"));
        assert_eq!(pool.timeout_secs, Some(5));
    }

    #[test]
    fn licence_spelling_maps_to_license() {
        let config = CheckConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.sheets["qbcc"].column("license"), Some(0));
        assert_eq!(config.sheets["qbcc"].column("licence"), None);
    }

    #[test]
    fn defaults_apply() {
        let config = CheckConfig::from_toml("").unwrap();
        assert_eq!(config.numrec_before_save, 20);
        assert_eq!(config.skip_days, 7);
        assert!(config.sheets.is_empty());
    }

    #[test]
    fn sheets_alias_accepted() {
        let config = CheckConfig::from_toml(
            r#"
[sheets.Engineers]
registration_index = 0
status_index = 1
last_checked_index = 2
"#,
        )
        .unwrap();
        assert_eq!(config.sheets["Engineers"].column("registration"), Some(0));
    }

    #[test]
    fn exact_key_beats_contains_key() {
        let config = CheckConfig::from_toml(SAMPLE).unwrap();
        let (key, _) = config.sheet_config_for("qbcc individual").unwrap();
        assert_eq!(key, "QBCC Individual");

        let (key, _) = config.sheet_config_for("QBCC Company List").unwrap();
        assert_eq!(key, "qbcc");
    }

    #[test]
    fn exact_mode_key_does_not_match_substring() {
        let config = CheckConfig::from_toml(SAMPLE).unwrap();
        assert!(config.sheet_config_for("Surveyors 2026").is_none());
        assert!(config.sheet_config_for("SURVEYORS").is_some());
    }

    #[test]
    fn reject_missing_control_column() {
        let err = CheckConfig::from_toml(
            r#"
[sheets_config.Architects]
registration_index = 0
status_index = 1
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)), "{err}");
    }

    #[test]
    fn reject_key_without_index_suffix() {
        let err = CheckConfig::from_toml(
            r#"
[sheets_config.Architects]
registration = 0
status_index = 1
last_checked_index = 2
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown key 'registration'"), "{err}");
    }

    #[test]
    fn reject_clashing_indices() {
        let err = CheckConfig::from_toml(
            r#"
[sheets_config.Architects]
registration_index = 1
status_index = 1
last_checked_index = 2
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("shares index 1"), "{err}");

        let err = CheckConfig::from_toml(
            r#"
[sheets_config.Architects]
status_index = 2
last_checked_index = 2
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("are both 2"), "{err}");
    }

    #[test]
    fn reject_bad_types() {
        let err = CheckConfig::from_toml("skip_days = \"soon\"").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }
}
