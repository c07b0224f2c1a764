//! Account/region selection for the CLI
//!
//! Explicit values (flags or `LAB_ACCOUNT`/`LAB_REGION`, both surfaced by
//! clap) win over a TOML config file.

use anyhow::{bail, Context};
use serde::Deserialize;
use stackgraph_core::StackConfig;
use std::path::Path;

/// Build a [`StackConfig`] from explicit values and an optional TOML file
///
/// # Errors
/// Unreadable or invalid config file, missing account/region, or values
/// rejected by [`StackConfig::validate`].
pub fn load_config(
    account: Option<&str>,
    region: Option<&str>,
    file: Option<&Path>,
) -> anyhow::Result<StackConfig> {
    let from_file = match file {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            let parsed: FileConfig = toml::from_str(&source)
                .with_context(|| format!("parsing config file {}", path.display()))?;
            Some(parsed)
        }
        None => None,
    };

    let account = account
        .map(str::to_string)
        .or_else(|| from_file.as_ref().and_then(|f| f.account.clone()));
    let region = region
        .map(str::to_string)
        .or_else(|| from_file.as_ref().and_then(|f| f.region.clone()));

    let (Some(account), Some(region)) = (account, region) else {
        bail!("account and region are required (flags, LAB_ACCOUNT/LAB_REGION, or --config)");
    };

    StackConfig::new(account, region).context("invalid stack configuration")
}

/// Config file shape; either key may be left to flags or environment
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    account: Option<String>,
    region: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn explicit_values() {
        let config = load_config(Some("123456789012"), Some("us-east-2"), None).unwrap();
        assert_eq!(config.region, "us-east-2");
    }

    #[test]
    fn missing_values_are_reported() {
        let err = load_config(Some("123456789012"), None, None).unwrap_err();
        assert!(err.to_string().contains("account and region are required"));
    }

    #[test]
    fn file_supplies_defaults() {
        let file = write_config("account = \"123456789012\"\nregion = \"ap-south-1\"\n");
        let config = load_config(None, None, Some(file.path())).unwrap();
        assert_eq!(config.account, "123456789012");
        assert_eq!(config.region, "ap-south-1");
    }

    #[test]
    fn flags_override_file() {
        let file = write_config("account = \"123456789012\"\nregion = \"ap-south-1\"\n");
        let config = load_config(None, Some("eu-central-1"), Some(file.path())).unwrap();
        assert_eq!(config.region, "eu-central-1");
    }

    #[test]
    fn partial_file_combines_with_flags() {
        let file = write_config("region = \"sa-east-1\"\n");
        let config = load_config(Some("123456789012"), None, Some(file.path())).unwrap();
        assert_eq!(config.region, "sa-east-1");
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let file = write_config("acount = \"123456789012\"\n");
        let err = load_config(None, Some("us-east-1"), Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config file"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = load_config(Some("12"), Some("us-east-1"), None).unwrap_err();
        assert!(format!("{err:#}").contains("12 digits"));
    }
}
