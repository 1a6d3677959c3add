//! Stable keys for caching installed toolchains.

use sha2::{Digest, Sha256};

use super::InstallPlan;
use crate::version::format_version;

/// Key identifying a plan on one platform.
///
/// Formatted as `<platform>-<arch>-<12 hex>`. The hash covers the sorted
/// `type:version` items, so entry order within the plan does not matter.
pub fn generate_cache_key(plan: &InstallPlan, platform: &str, arch: &str) -> String {
    let mut items: Vec<String> = plan
        .items()
        .map(|item| format!("{}:{}", item.artifact, format_version(&item.version)))
        .collect();
    items.sort();

    let hash = hex::encode(Sha256::digest(items.join("\n").as_bytes()));
    format!("{}-{}-{}", platform, arch, &hash[..12])
}
