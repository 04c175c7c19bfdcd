//! License Record Types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// License status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    Active,
    Inactive,
    Invalid,
}

impl LicenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::Active => "active",
            LicenseStatus::Inactive => "inactive",
            LicenseStatus::Invalid => "invalid",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "active" => LicenseStatus::Active,
            "inactive" => LicenseStatus::Inactive,
            _ => LicenseStatus::Invalid,
        }
    }
}

/// Row of `vortex_license_data`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub id: i64,
    pub license_key: String,
    pub status: LicenseStatus,
    pub expiration_date: DateTime<Utc>,
    pub site_url: String,
    pub activation_date: DateTime<Utc>,
    pub last_check: DateTime<Utc>,
    pub features: serde_json::Value,
}

impl LicenseRecord {
    /// Key with all but the last group masked, for display and logs
    pub fn masked_key(&self) -> String {
        mask_license_key(&self.license_key)
    }
}

static LICENSE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z0-9]{4}(-[A-Z0-9]{4}){3}$").expect("Invalid license regex")
});

/// `XXXX-XXXX-XXXX-XXXX`, uppercase alphanumerics
pub fn is_valid_license_format(key: &str) -> bool {
    LICENSE_PATTERN.is_match(key)
}

/// `XXXX-XXXX-XXXX-ABCD` -> `****-****-****-ABCD`
pub fn mask_license_key(key: &str) -> String {
    match key.rsplit_once('-') {
        Some((head, tail)) => {
            let masked: String = head.chars().map(|c| if c == '-' { '-' } else { '*' }).collect();
            format!("{masked}-{tail}")
        }
        None => "*".repeat(key.len()),
    }
}

/// Feature flags granted by an active license
pub fn default_features() -> serde_json::Value {
    serde_json::json!({
        "ai_agents": true,
        "blockchain_integration": false,
        "advanced_analytics": false,
        "premium_templates": false,
        "api_access": false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_license_format() {
        assert!(is_valid_license_format("AB12-CD34-EF56-GH78"));
        assert!(!is_valid_license_format("ab12-cd34-ef56-gh78"));
        assert!(!is_valid_license_format("AB12-CD34-EF56"));
        assert!(!is_valid_license_format("AB12CD34EF56GH78"));
        assert!(!is_valid_license_format(""));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask_license_key("AB12-CD34-EF56-GH78"), "****-****-****-GH78");
        assert_eq!(mask_license_key("ABCD"), "****");
    }
}
