use crate::domain::model::VenueDescriptor;
use crate::utils::error::{NutritionError, Result};

/// Static venue lookup, built once from configuration.
#[derive(Debug, Clone)]
pub struct LocationRegistry {
    venues: Vec<VenueDescriptor>,
}

fn normalize_key(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

impl LocationRegistry {
    pub fn new(venues: Vec<VenueDescriptor>) -> Self {
        Self { venues }
    }

    /// Resolves a key, display name or alias. Free-form names such as
    /// "Worcester Dining Commons" resolve when they contain a known key.
    pub fn resolve(&self, name: &str) -> Result<&VenueDescriptor> {
        let wanted = normalize_key(name);

        if !wanted.is_empty() {
            let exact = self
                .venues
                .iter()
                .find(|v| v.key == wanted)
                .or_else(|| {
                    self.venues
                        .iter()
                        .find(|v| normalize_key(&v.display_name) == wanted)
                })
                .or_else(|| {
                    self.venues
                        .iter()
                        .find(|v| v.aliases.iter().any(|a| normalize_key(a) == wanted))
                });
            if let Some(venue) = exact {
                return Ok(venue);
            }

            // Longest match first so "harvest_market" beats "harvest".
            let padded = format!("_{}_", wanted);
            let mut contained: Option<(&VenueDescriptor, usize)> = None;
            for venue in &self.venues {
                let names = std::iter::once(venue.key.as_str())
                    .chain(venue.aliases.iter().map(String::as_str));
                for candidate in names {
                    let candidate = normalize_key(candidate);
                    if candidate.is_empty() || !padded.contains(&format!("_{}_", candidate)) {
                        continue;
                    }
                    if contained.map_or(true, |(_, len)| candidate.len() > len) {
                        contained = Some((venue, candidate.len()));
                    }
                }
            }
            if let Some((venue, _)) = contained {
                return Ok(venue);
            }
        }

        Err(NutritionError::VenueNotFound {
            name: name.to_string(),
            available: self.keys(),
        })
    }

    pub fn list_open(&self) -> Vec<&VenueDescriptor> {
        self.venues.iter().filter(|v| v.is_open).collect()
    }

    pub fn all(&self) -> &[VenueDescriptor] {
        &self.venues
    }

    pub fn keys(&self) -> Vec<String> {
        self.venues.iter().map(|v| v.key.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::VenueCategory;

    fn registry() -> LocationRegistry {
        LocationRegistry::new(vec![
            VenueDescriptor::new(
                "worcester",
                "Worcester Dining Commons",
                VenueCategory::DiningCommons,
                "https://umassdining.com/locations-menus/worcester/menu",
                true,
            ),
            VenueDescriptor::new(
                "harvest_market",
                "Harvest Market",
                VenueCategory::Eatery,
                "https://umassdining.com/locations-menus/harvest-market/menu",
                false,
            )
            .with_aliases(&["harvest"]),
        ])
    }

    #[test]
    fn test_resolve_by_key_and_display_name() {
        let registry = registry();
        assert_eq!(registry.resolve("worcester").unwrap().key, "worcester");
        assert_eq!(registry.resolve("Worcester").unwrap().key, "worcester");
        assert_eq!(registry.resolve("Harvest Market").unwrap().key, "harvest_market");
        assert_eq!(registry.resolve("harvest-market").unwrap().key, "harvest_market");
    }

    #[test]
    fn test_resolve_by_alias_and_containment() {
        let registry = registry();
        assert_eq!(registry.resolve("harvest").unwrap().key, "harvest_market");
        assert_eq!(
            registry.resolve("Worcester Dining Commons Lunch").unwrap().key,
            "worcester"
        );
    }

    #[test]
    fn test_resolve_unknown_is_not_found() {
        let registry = registry();
        match registry.resolve("atlantis") {
            Err(NutritionError::VenueNotFound { name, available }) => {
                assert_eq!(name, "atlantis");
                assert_eq!(available, vec!["worcester", "harvest_market"]);
            }
            other => panic!("expected VenueNotFound, got {:?}", other.map(|v| &v.key)),
        }
        assert!(registry.resolve("   ").is_err());
    }

    #[test]
    fn test_list_open_filters_closed_venues() {
        let registry = registry();
        let open: Vec<_> = registry.list_open().iter().map(|v| v.key.as_str()).collect();
        assert_eq!(open, vec!["worcester"]);
        assert_eq!(registry.all().len(), 2);
    }
}
