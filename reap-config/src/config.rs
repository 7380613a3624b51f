use std::{
    fs,
    io::{self, BufRead},
    path,
};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
    #[error("Line parsing error: {0}")]
    LineParse(String),
    #[error("Missing config field: {0}")]
    MissingField(String),
}

/// Application context that carries a YAML configuration.
///
/// Acquisition binaries implement this on their context struct to get
/// config loading and dot-notation lookup for free.
pub trait Configurable {
    fn config(&self) -> &serde_yaml::Value;

    fn load_config(
        config_file_path: impl AsRef<path::Path>,
    ) -> Result<serde_yaml::Value, ConfigError> {
        let content: String = fs::read_to_string(config_file_path)?;
        let config: serde_yaml::Value = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load a plain-text file as one string per line, e.g. a user-agent
    /// list for a crawl spider.
    fn load_text_file_lines(
        file_path: impl AsRef<path::Path>,
    ) -> Result<Vec<String>, ConfigError> {
        let file = fs::File::open(file_path)?;
        let lines = io::BufReader::new(file)
            .lines()
            .map(|l| l.map_err(|e| ConfigError::LineParse(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }

    /// Extract a value using dot notation, i.e. "acquisition.concurrency".
    fn get_config_value(&self, key: &str) -> Option<&serde_yaml::Value> {
        let keys: Vec<&str> = key.split('.').collect();
        Self::get_value_recursive(self.config(), &keys)
    }

    fn get_value_recursive<'a>(
        config: &'a serde_yaml::Value,
        keys: &[&str],
    ) -> Option<&'a serde_yaml::Value> {
        if keys.is_empty() {
            return None;
        };

        match config {
            serde_yaml::Value::Mapping(map) => {
                let key = keys[0];
                let remaining_keys = &keys[1..];

                if let Some(value) =
                    map.get(serde_yaml::Value::String(key.to_string()))
                {
                    if remaining_keys.is_empty() {
                        Some(value)
                    } else {
                        Self::get_value_recursive(value, remaining_keys)
                    }
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const ACQUISITION_YAML: &str = r#"
acquisition:
  concurrency: 4
  item_budget: 200
providers:
  - name: attom
    requests_per_minute: 30
validation:
  price_min: 10000
"#;

    struct AcquisitionApp {
        config: serde_yaml::Value,
        user_agents: Option<Vec<String>>,
    }

    impl Configurable for AcquisitionApp {
        fn config(&self) -> &serde_yaml::Value {
            &self.config
        }
    }

    impl AcquisitionApp {
        fn from_str(yaml: &str) -> Self {
            Self {
                config: serde_yaml::from_str(yaml).unwrap(),
                user_agents: None,
            }
        }
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("acquisition.yml");
        let mut file = File::create(&config_path).unwrap();
        write!(file, "{ACQUISITION_YAML}").unwrap();

        let config = AcquisitionApp::load_config(&config_path).unwrap();
        assert_eq!(config["acquisition"]["concurrency"].as_u64(), Some(4));
        assert_eq!(config["validation"]["price_min"].as_u64(), Some(10000));
    }

    #[test]
    fn test_load_config_invalid_yaml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("broken.yml");
        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "invalid: : yaml: content").unwrap();

        let config = AcquisitionApp::load_config(&config_path);
        assert!(matches!(config, Err(ConfigError::YamlParse(_))));
    }

    #[test]
    fn test_dot_notation_lookup() {
        let app = AcquisitionApp::from_str(ACQUISITION_YAML);

        assert_eq!(
            app.get_config_value("acquisition.item_budget")
                .and_then(|v| v.as_u64()),
            Some(200)
        );
        assert_eq!(app.get_config_value("acquisition.missing"), None);
        assert_eq!(app.get_config_value("missing"), None);
        assert_eq!(app.get_config_value(""), None);
    }

    #[test]
    fn test_load_text_file_lines() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("user_agents.txt");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "agent-one/1.0\nagent-two/2.0").unwrap();

        let mut app = AcquisitionApp::from_str(ACQUISITION_YAML);
        app.user_agents = AcquisitionApp::load_text_file_lines(&file_path).ok();

        assert_eq!(
            app.user_agents,
            Some(vec!["agent-one/1.0".to_string(), "agent-two/2.0".to_string()])
        );
    }
}
