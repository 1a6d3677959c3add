//! Reading a project's `global.json`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{PlanError, Result};

/// The parts of `global.json` the engine cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalJson {
    #[serde(default)]
    pub sdk: Option<SdkSection>,
}

/// The `sdk` section of `global.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkSection {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub roll_forward: Option<String>,
    #[serde(default)]
    pub allow_prerelease: Option<bool>,
}

impl GlobalJson {
    /// Parse `global.json` content.
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| PlanError::MalformedPolicyConfig {
            message: e.to_string(),
        })
    }

    /// Read and parse a `global.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| PlanError::MalformedPolicyConfig {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;

        Self::parse(&content).map_err(|e| match e {
            PlanError::MalformedPolicyConfig { message } => PlanError::MalformedPolicyConfig {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_full_sdk_section() {
        let global = GlobalJson::parse(
            r#"{"sdk": {"version": "8.0.100", "rollForward": "latestPatch", "allowPrerelease": true}}"#,
        )
        .unwrap();

        let sdk = global.sdk.unwrap();
        assert_eq!(sdk.version.as_deref(), Some("8.0.100"));
        assert_eq!(sdk.roll_forward.as_deref(), Some("latestPatch"));
        assert_eq!(sdk.allow_prerelease, Some(true));
    }

    #[test]
    fn ignores_unrelated_sections() {
        let global =
            GlobalJson::parse(r#"{"msbuild-sdks": {"Foo": "1.0"}, "sdk": {"version": "9.0.100"}}"#)
                .unwrap();
        assert_eq!(global.sdk.unwrap().roll_forward, None);
    }

    #[test]
    fn type_errors_are_malformed_policy() {
        let err = GlobalJson::parse(r#"{"sdk": {"rollForward": 3}}"#).unwrap_err();
        assert!(matches!(err, PlanError::MalformedPolicyConfig { .. }));
    }

    #[test]
    fn load_reads_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("global.json");
        fs::write(&path, r#"{"sdk": {"version": "8.0.100"}}"#).unwrap();

        let global = GlobalJson::load(&path).unwrap();
        assert_eq!(global.sdk.unwrap().version.as_deref(), Some("8.0.100"));
    }

    #[test]
    fn load_missing_file_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("global.json");

        let err = GlobalJson::load(&path).unwrap_err();
        assert!(err.to_string().contains("global.json"));
    }
}
