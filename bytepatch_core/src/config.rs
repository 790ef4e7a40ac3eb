use crate::pattern::TextEncoding;
use crate::planner::ZeroMatchPolicy;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct EncodingSettings {
    #[serde(default)]
    pub scheme: TextEncoding,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct PolicySettings {
    #[serde(default)]
    pub zero_match: ZeroMatchPolicy,
    #[serde(default = "default_null_terminate")]
    pub null_terminate: bool,
    #[serde(default)]
    pub allow_overflow: bool,
}

pub fn default_null_terminate() -> bool {
    true
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            zero_match: ZeroMatchPolicy::default(),
            null_terminate: default_null_terminate(),
            allow_overflow: false,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct OutputSettings {
    /// Copy the original file to `<file>.bak` before committing.
    #[serde(default)]
    pub backup: bool,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct BytepatchConfig {
    #[serde(default)]
    pub encoding: EncodingSettings,
    #[serde(default)]
    pub policy: PolicySettings,
    #[serde(default)]
    pub output: OutputSettings,
}

impl BytepatchConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file at {:?}: {}", path, e))?;

        Self::from_toml_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse TOML from config file {:?}: {}", path, e)
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = BytepatchConfig::from_toml_str("").unwrap();
        assert_eq!(config, BytepatchConfig::default());
        assert_eq!(config.encoding.scheme, TextEncoding::Utf8);
        assert_eq!(config.policy.zero_match, ZeroMatchPolicy::Silent);
        assert!(config.policy.null_terminate);
        assert!(!config.policy.allow_overflow);
        assert!(!config.output.backup);
    }

    #[test]
    fn parses_every_section() {
        let config = BytepatchConfig::from_toml_str(
            r#"
            [encoding]
            scheme = "hex"

            [policy]
            zero-match = "report"
            null-terminate = false
            allow-overflow = true

            [output]
            backup = true
            "#,
        )
        .unwrap();
        assert_eq!(config.encoding.scheme, TextEncoding::Hex);
        assert_eq!(config.policy.zero_match, ZeroMatchPolicy::Report);
        assert!(!config.policy.null_terminate);
        assert!(config.policy.allow_overflow);
        assert!(config.output.backup);
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(BytepatchConfig::from_toml_str("[policy]\nallow_overflow = true\n").is_err());
        assert!(BytepatchConfig::from_toml_str("[encoding]\nscheme = \"ebcdic\"\n").is_err());
    }

    #[test]
    fn load_from_file_reports_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("bytepatch.toml");
        let err = BytepatchConfig::load_from_file(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));

        std::fs::write(&missing, "[policy\n").unwrap();
        let err = BytepatchConfig::load_from_file(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));

        std::fs::write(&missing, "[encoding]\nscheme = \"latin1\"\n").unwrap();
        let config = BytepatchConfig::load_from_file(&missing).unwrap();
        assert_eq!(config.encoding.scheme, TextEncoding::Latin1);
    }
}
