use crate::core::estimate::{BaselineProfile, FallbackProfiles};
use crate::domain::model::{FoodCategory, VenueCategory, VenueDescriptor};
use crate::utils::error::{NutritionError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_unique_keys, validate_url,
    Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

const MENU_BASE_URL: &str = "https://umassdining.com/locations-menus";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionConfig {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default = "default_venues")]
    pub venues: Vec<VenueDescriptor>,
    /// Per-category overrides of the built-in estimate profiles.
    #[serde(default)]
    pub fallback: BTreeMap<String, BaselineProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_seconds: u64,
    pub min_delay_ms: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            min_delay_ms: 1000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// `ttl_seconds = 0` turns the result cache off.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_results: 50 }
    }
}

fn venue(key: &str, display_name: &str, category: VenueCategory, is_open: bool) -> VenueDescriptor {
    let slug = key.replace('_', "-");
    VenueDescriptor::new(
        key,
        display_name,
        category,
        &format!("{}/{}/menu", MENU_BASE_URL, slug),
        is_open,
    )
}

/// The four dining commons, then the campus-center eateries. Eatery menu
/// pages are unconfirmed so they ship closed.
pub fn default_venues() -> Vec<VenueDescriptor> {
    use VenueCategory::{DiningCommons, Eatery};

    vec![
        venue("berkshire", "Berkshire Dining Commons", DiningCommons, true),
        venue("franklin", "Franklin Dining Commons", DiningCommons, true),
        venue("worcester", "Worcester Dining Commons", DiningCommons, true),
        venue("hampshire", "Hampshire Dining Commons", DiningCommons, true),
        venue("peoples_organic_coffee", "People's Organic Coffee", Eatery, false)
            .with_aliases(&["peoples"]),
        venue("harvest_market", "Harvest Market", Eatery, false).with_aliases(&["harvest"]),
        venue("tavola", "Tavola", Eatery, false),
        venue("yum_bakery", "Yum! Bakery", Eatery, false).with_aliases(&["yum"]),
        venue("green_fields", "Green Fields", Eatery, false),
        venue("tamales", "Tamales", Eatery, false),
        venue("wasabi", "Wasabi", Eatery, false),
        venue("deli_delish", "Deli Delish", Eatery, false).with_aliases(&["deli"]),
        venue("star_ginger", "Star Ginger", Eatery, false),
        venue("grill", "The Grill", Eatery, false),
    ]
}

impl Default for NutritionConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            cache: CacheConfig::default(),
            search: SearchConfig::default(),
            venues: default_venues(),
            fallback: BTreeMap::new(),
        }
    }
}

impl NutritionConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(NutritionError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| NutritionError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are
    /// left as written so validation can point at them.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// Built-in estimate profiles with this file's overrides applied.
    pub fn fallback_profiles(&self) -> Result<FallbackProfiles> {
        let mut overrides = BTreeMap::new();
        for (name, profile) in &self.fallback {
            let category = FoodCategory::from_name(name).ok_or_else(|| {
                NutritionError::InvalidConfigValueError {
                    field: "fallback".to_string(),
                    value: name.clone(),
                    reason: format!(
                        "Unknown food category. Valid categories: {}",
                        FoodCategory::ALL.map(|c| c.as_str()).join(", ")
                    ),
                }
            })?;
            overrides.insert(category, profile.clone());
        }
        Ok(FallbackProfiles::with_overrides(overrides))
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_positive_number("fetch.timeout_seconds", self.fetch.timeout_seconds, 1)?;
        validate_non_empty_string("fetch.user_agent", &self.fetch.user_agent)?;
        validate_positive_number("search.max_results", self.search.max_results as u64, 1)?;

        if self.venues.is_empty() {
            return Err(NutritionError::MissingConfigError {
                field: "venues".to_string(),
            });
        }
        validate_unique_keys("venues.key", self.venues.iter().map(|v| v.key.as_str()))?;
        for venue in &self.venues {
            validate_non_empty_string("venues.key", &venue.key)?;
            validate_non_empty_string(
                &format!("venues.{}.display_name", venue.key),
                &venue.display_name,
            )?;
            validate_url(
                &format!("venues.{}.menu_source_ref", venue.key),
                &venue.menu_source_ref,
            )?;
        }

        self.fallback_profiles()?.validate()
    }

    pub fn open_venue_count(&self) -> usize {
        self.venues.iter().filter(|v| v.is_open).count()
    }
}

impl Validate for NutritionConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = NutritionConfig::from_toml_str("").unwrap();

        assert_eq!(config.venues.len(), 14);
        assert_eq!(config.open_venue_count(), 4);
        assert_eq!(config.fetch.timeout_seconds, 15);
        assert_eq!(config.fetch.min_delay_ms, 1000);
        assert_eq!(config.search.max_results, 50);
        assert_eq!(config.cache.ttl_seconds, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_venues_and_sections() {
        let toml_content = r#"
[fetch]
timeout_seconds = 5
min_delay_ms = 0

[search]
max_results = 10

[[venues]]
key = "worcester"
display_name = "Worcester Dining Commons"
category = "dining_commons"
menu_source_ref = "http://localhost:9000/worcester"

[[venues]]
key = "harvest_market"
display_name = "Harvest Market"
category = "eatery"
menu_source_ref = "http://localhost:9000/harvest"
is_open = false
aliases = ["harvest"]
"#;

        let config = NutritionConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.fetch.timeout_seconds, 5);
        assert_eq!(config.fetch.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.venues.len(), 2);
        assert!(config.venues[0].is_open);
        assert!(!config.venues[1].is_open);
        assert_eq!(config.venues[1].aliases, vec!["harvest".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("DINING_TEST_MENU_HOST", "http://menus.test");

        let toml_content = r#"
[[venues]]
key = "franklin"
display_name = "Franklin"
category = "dining_commons"
menu_source_ref = "${DINING_TEST_MENU_HOST}/franklin"
"#;

        let config = NutritionConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.venues[0].menu_source_ref, "http://menus.test/franklin");

        std::env::remove_var("DINING_TEST_MENU_HOST");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[[venues]]
key = "franklin"
display_name = "Franklin"
category = "dining_commons"
menu_source_ref = "not-a-url"
"#;
        let config = NutritionConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let mut config = NutritionConfig::default();
        config.venues.push(config.venues[0].clone());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fallback_overrides() {
        let toml_content = r#"
[fallback.soup]
serving_size = "12 oz"
calories = 220
total_fat = 8
saturated_fat = 3
trans_fat = 0
cholesterol = 20
sodium = 900
total_carbohydrates = 24
dietary_fiber = 3
total_sugars = 4
protein = 10
"#;

        let config = NutritionConfig::from_toml_str(toml_content).unwrap();
        let profiles = config.fallback_profiles().unwrap();
        assert_eq!(profiles.get(FoodCategory::Soup).calories, 220);
        assert_eq!(profiles.get(FoodCategory::Soup).serving_size, "12 oz");
        assert!(config.validate().is_ok());

        let unknown = toml_content.replace("[fallback.soup]", "[fallback.casserole]");
        let config = NutritionConfig::from_toml_str(&unknown).unwrap();
        assert!(config.fallback_profiles().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[cache]\nttl_seconds = 300\n")
            .unwrap();

        let config = NutritionConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.venues.len(), 14);
    }
}
