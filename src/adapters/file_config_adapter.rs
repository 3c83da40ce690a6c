//! INI file configuration adapter.
//!
//! Section and key names are case-insensitive (`configparser` lowercases
//! them), so ticker keys in `[allocations]` and `[price_targets]` come back
//! lowercase and are uppercased by the domain. A key written without `=`
//! reads as an empty value, which the domain rejects.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get_map_ref()
            .get(&section.to_lowercase())?
            .get(&key.to_lowercase())
            .map(|v| v.clone().unwrap_or_default())
    }

    fn get_section(&self, section: &str) -> BTreeMap<String, String> {
        self.config
            .get_map_ref()
            .get(&section.to_lowercase())
            .map(|entries| {
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone().unwrap_or_default()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[portfolio]
starting_cash = 100000
max_positions = 8
buy_slippage_multiplier = 1.015
tickers = AAPL,MSFT

[allocations]
AAPL = 15
MSFT = 12.5

[price_targets]
AAPL = 140.0, 160.0
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn reads_string_values() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("portfolio", "max_positions"),
            Some("8".to_string())
        );
        assert_eq!(
            adapter.get_string("portfolio", "tickers"),
            Some("AAPL,MSFT".to_string())
        );
    }

    #[test]
    fn missing_keys_are_none() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("portfolio", "missing"), None);
        assert_eq!(adapter.get_string("quality", "missing"), None);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("PORTFOLIO", "Starting_Cash"),
            Some("100000".to_string())
        );
    }

    #[test]
    fn section_map_is_lowercased() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        let allocations = adapter.get_section("allocations");
        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations.get("aapl"), Some(&"15".to_string()));
        assert_eq!(allocations.get("msft"), Some(&"12.5".to_string()));

        let targets = adapter.get_section("PRICE_TARGETS");
        assert_eq!(targets.get("aapl"), Some(&"140.0, 160.0".to_string()));
    }

    #[test]
    fn valueless_keys_read_as_empty() {
        let adapter =
            FileConfigAdapter::from_string("[portfolio]\nstarting_cash =\n\n[allocations]\nAAPL\nMSFT = 12\n")
                .unwrap();
        assert_eq!(adapter.get_string("portfolio", "starting_cash"), Some(String::new()));
        assert_eq!(adapter.get_string("allocations", "aapl"), Some(String::new()));
        let allocations = adapter.get_section("allocations");
        assert_eq!(allocations.get("aapl"), Some(&String::new()));
        assert_eq!(allocations.get("msft"), Some(&"12".to_string()));
    }

    #[test]
    fn absent_section_is_empty() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert!(adapter.get_section("fill_tiers").is_empty());
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config(SAMPLE);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("portfolio", "starting_cash"),
            Some("100000".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(result.is_err());
    }
}
