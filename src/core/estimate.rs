use crate::domain::model::{FoodCategory, NutrientField, NutritionRecord, Provenance};
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_range, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Typical per-serving values for one food category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineProfile {
    pub serving_size: String,
    pub calories: u32,
    pub total_fat: f64,
    pub saturated_fat: f64,
    pub trans_fat: f64,
    pub cholesterol: f64,
    pub sodium: f64,
    pub total_carbohydrates: f64,
    pub dietary_fiber: f64,
    pub total_sugars: f64,
    pub protein: f64,
}

impl BaselineProfile {
    /// `values` follows `NutrientField::ALL` after calories.
    fn from_values(serving_size: &str, calories: u32, values: [f64; 9]) -> Self {
        let [
            total_fat,
            saturated_fat,
            trans_fat,
            cholesterol,
            sodium,
            total_carbohydrates,
            dietary_fiber,
            total_sugars,
            protein,
        ] = values;
        Self {
            serving_size: serving_size.to_string(),
            calories,
            total_fat,
            saturated_fat,
            trans_fat,
            cholesterol,
            sodium,
            total_carbohydrates,
            dietary_fiber,
            total_sugars,
            protein,
        }
    }

    fn value(&self, field: NutrientField) -> f64 {
        match field {
            NutrientField::Calories => f64::from(self.calories),
            NutrientField::TotalFat => self.total_fat,
            NutrientField::SaturatedFat => self.saturated_fat,
            NutrientField::TransFat => self.trans_fat,
            NutrientField::Cholesterol => self.cholesterol,
            NutrientField::Sodium => self.sodium,
            NutrientField::TotalCarbohydrates => self.total_carbohydrates,
            NutrientField::DietaryFiber => self.dietary_fiber,
            NutrientField::TotalSugars => self.total_sugars,
            NutrientField::Protein => self.protein,
        }
    }

    pub fn default_for(category: FoodCategory) -> Self {
        match category {
            FoodCategory::Entree => Self::from_values(
                "1 entree",
                450,
                [18.0, 6.0, 0.0, 70.0, 800.0, 40.0, 3.0, 5.0, 28.0],
            ),
            FoodCategory::Side => {
                Self::from_values("1/2 cup", 180, [7.0, 2.0, 0.0, 5.0, 300.0, 25.0, 3.0, 2.0, 4.0])
            }
            FoodCategory::Salad => {
                Self::from_values("1 bowl", 150, [9.0, 2.0, 0.0, 10.0, 250.0, 12.0, 4.0, 5.0, 5.0])
            }
            FoodCategory::Soup => {
                Self::from_values("8 oz", 160, [6.0, 2.0, 0.0, 15.0, 750.0, 18.0, 2.0, 3.0, 7.0])
            }
            FoodCategory::Dessert => Self::from_values(
                "1 piece",
                350,
                [15.0, 8.0, 0.0, 40.0, 200.0, 50.0, 1.0, 32.0, 4.0],
            ),
            FoodCategory::Beverage => {
                Self::from_values("12 fl oz", 120, [0.0, 0.0, 0.0, 0.0, 20.0, 30.0, 0.0, 28.0, 0.5])
            }
            FoodCategory::Breakfast => Self::from_values(
                "1 plate",
                300,
                [14.0, 5.0, 0.0, 180.0, 500.0, 28.0, 2.0, 6.0, 14.0],
            ),
        }
    }
}

/// Category -> baseline table, initialised once and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackProfiles {
    profiles: BTreeMap<FoodCategory, BaselineProfile>,
}

impl Default for FallbackProfiles {
    fn default() -> Self {
        Self::with_overrides(BTreeMap::new())
    }
}

impl FallbackProfiles {
    /// Built-in profiles with the given categories replaced.
    pub fn with_overrides(overrides: BTreeMap<FoodCategory, BaselineProfile>) -> Self {
        let mut profiles: BTreeMap<FoodCategory, BaselineProfile> = FoodCategory::ALL
            .iter()
            .map(|c| (*c, BaselineProfile::default_for(*c)))
            .collect();
        profiles.extend(overrides);
        Self { profiles }
    }

    pub fn get(&self, category: FoodCategory) -> &BaselineProfile {
        // Every category is populated in `with_overrides`.
        &self.profiles[&category]
    }
}

impl Validate for FallbackProfiles {
    fn validate(&self) -> Result<()> {
        for (category, profile) in &self.profiles {
            let prefix = format!("fallback.{}", category.as_str());
            validate_non_empty_string(&format!("{}.serving_size", prefix), &profile.serving_size)?;
            for field in NutrientField::ALL {
                let (min, max) = field.plausible_range();
                validate_range(
                    &format!("{}.{}", prefix, field.as_str()),
                    profile.value(field),
                    min,
                    max,
                )?;
            }
        }
        Ok(())
    }
}

/// Produces approximate records when a venue yields nothing usable.
#[derive(Debug, Clone, Default)]
pub struct FallbackEstimator {
    profiles: FallbackProfiles,
}

impl FallbackEstimator {
    pub fn new(profiles: FallbackProfiles) -> Self {
        Self { profiles }
    }

    pub fn estimate(&self, food_name: &str, category: FoodCategory) -> NutritionRecord {
        let profile = self.profiles.get(category);
        let mut record = NutritionRecord::new(food_name.trim(), None, Provenance::Estimated);
        record.serving_size = Some(profile.serving_size.clone());
        for field in NutrientField::ALL {
            record.set(field, profile.value(field));
        }
        tracing::debug!("Estimated '{}' as {:?}", food_name, category);
        record
    }

    /// Classifies the name first, then estimates.
    pub fn estimate_for(&self, food_name: &str, venue: Option<&str>) -> NutritionRecord {
        let mut record = self.estimate(food_name, FoodCategory::classify(food_name));
        record.venue = venue.map(str::to_string);
        record
    }
}
