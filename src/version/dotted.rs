//! .NET version strings with more than three numeric components.
//!
//! `semver` only knows `major.minor.patch`. Components past the third
//! (`8.0.100.1`) are carried as numeric build metadata, which compares
//! numerically and sorts after the bare three-part version, and are written
//! back in dotted form.

use semver::{BuildMetadata, Version};
use serde::{Deserialize, Deserializer, Serializer};

/// Parse a catalog or request version string.
///
/// Accepts anything `semver` accepts, plus four or more dotted numeric
/// components.
pub fn parse_version(raw: &str) -> Option<Version> {
    let raw = raw.trim();
    if let Ok(version) = Version::parse(raw) {
        return Some(version);
    }

    let parts: Vec<&str> = raw.split('.').collect();
    if parts.len() < 4
        || !parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let mut version = Version::new(
        parts[0].parse().ok()?,
        parts[1].parse().ok()?,
        parts[2].parse().ok()?,
    );
    version.build = BuildMetadata::new(&parts[3..].join(".")).ok()?;
    Some(version)
}

/// Render a version the way .NET writes it.
pub fn format_version(version: &Version) -> String {
    let dotted_tail = version.pre.is_empty()
        && !version.build.is_empty()
        && version
            .build
            .as_str()
            .split('.')
            .all(|p| p.bytes().all(|b| b.is_ascii_digit()));

    if dotted_tail {
        format!(
            "{}.{}.{}.{}",
            version.major, version.minor, version.patch, version.build
        )
    } else {
        version.to_string()
    }
}

fn parse_error<E: serde::de::Error>(raw: &str) -> E {
    E::custom(format!("invalid version '{}'", raw))
}

/// `#[serde(with = "...")]` for a single version.
pub mod as_dotted {
    use super::*;

    pub fn serialize<S: Serializer>(version: &Version, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_version(version))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Version, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_version(&raw).ok_or_else(|| parse_error(&raw))
    }
}

/// `#[serde(with = "...")]` for a list of versions.
pub mod as_dotted_list {
    use super::*;

    pub fn serialize<S: Serializer>(
        versions: &[Version],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(versions.iter().map(format_version))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Version>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|raw| parse_version(raw).ok_or_else(|| parse_error(raw)))
            .collect()
    }
}

/// `#[serde(serialize_with = "...")]` for an optional version.
pub fn serialize_opt<S: Serializer>(
    version: &Option<Version>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match version {
        Some(version) => serializer.serialize_some(&format_version(version)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_part_and_prerelease_use_semver() {
        assert_eq!(parse_version("8.0.100"), Some(Version::new(8, 0, 100)));
        let rc = parse_version("10.0.100-rc.1.25451.107").unwrap();
        assert_eq!(format_version(&rc), "10.0.100-rc.1.25451.107");
    }

    #[test]
    fn fourth_component_orders_between_patches() {
        let base = parse_version("8.0.100").unwrap();
        let one = parse_version("8.0.100.1").unwrap();
        let ten = parse_version("8.0.100.10").unwrap();
        let next = parse_version("8.0.101").unwrap();

        assert!(base < one);
        assert!(one < ten);
        assert!(ten < next);
        assert_eq!(format_version(&ten), "8.0.100.10");
    }

    #[test]
    fn five_components_keep_every_part() {
        let version = parse_version("4.7.2.3062.1").unwrap();
        assert_eq!(version.patch, 2);
        assert_eq!(format_version(&version), "4.7.2.3062.1");
    }

    #[test]
    fn rejects_non_numeric_extra_components() {
        for raw in ["8.0", "8.0.x", "8.0.100.x", "8.0.100.", "8..0.100", "8.0.1xx.1"] {
            assert!(parse_version(raw).is_none(), "{raw} should be rejected");
        }
    }

    #[test]
    fn serializes_in_dotted_form() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Pinned {
            #[serde(with = "as_dotted")]
            version: Version,
            #[serde(with = "as_dotted_list")]
            all: Vec<Version>,
        }

        let pinned: Pinned =
            serde_json::from_str(r#"{"version": "8.0.100.1", "all": ["8.0.100", "9.0.1.2"]}"#)
                .unwrap();
        let json = serde_json::to_value(&pinned).unwrap();

        assert_eq!(json["version"], "8.0.100.1");
        assert_eq!(json["all"][1], "9.0.1.2");
        assert!(serde_json::from_str::<Pinned>(r#"{"version": "x", "all": []}"#).is_err());
    }
}
