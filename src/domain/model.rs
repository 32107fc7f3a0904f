use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The ten numeric nutrition facts a record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientField {
    Calories,
    TotalFat,
    SaturatedFat,
    TransFat,
    Cholesterol,
    Sodium,
    TotalCarbohydrates,
    DietaryFiber,
    TotalSugars,
    Protein,
}

impl NutrientField {
    pub const ALL: [NutrientField; 10] = [
        NutrientField::Calories,
        NutrientField::TotalFat,
        NutrientField::SaturatedFat,
        NutrientField::TransFat,
        NutrientField::Cholesterol,
        NutrientField::Sodium,
        NutrientField::TotalCarbohydrates,
        NutrientField::DietaryFiber,
        NutrientField::TotalSugars,
        NutrientField::Protein,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientField::Calories => "calories",
            NutrientField::TotalFat => "total_fat",
            NutrientField::SaturatedFat => "saturated_fat",
            NutrientField::TransFat => "trans_fat",
            NutrientField::Cholesterol => "cholesterol",
            NutrientField::Sodium => "sodium",
            NutrientField::TotalCarbohydrates => "total_carbohydrates",
            NutrientField::DietaryFiber => "dietary_fiber",
            NutrientField::TotalSugars => "total_sugars",
            NutrientField::Protein => "protein",
        }
    }

    /// Inclusive plausibility range. Values outside it are parse noise.
    pub fn plausible_range(&self) -> (f64, f64) {
        match self {
            NutrientField::Calories => (0.0, 5000.0),
            NutrientField::TotalFat => (0.0, 500.0),
            NutrientField::SaturatedFat => (0.0, 300.0),
            NutrientField::TransFat => (0.0, 100.0),
            NutrientField::Cholesterol => (0.0, 3000.0),
            NutrientField::Sodium => (0.0, 20000.0),
            NutrientField::TotalCarbohydrates => (0.0, 1000.0),
            NutrientField::DietaryFiber => (0.0, 200.0),
            NutrientField::TotalSugars => (0.0, 800.0),
            NutrientField::Protein => (0.0, 500.0),
        }
    }

    pub fn is_plausible(&self, value: f64) -> bool {
        let (min, max) = self.plausible_range();
        value.is_finite() && value >= min && value <= max
    }

    /// Maps a human label such as "Total Fat", "Sat. Fat:" or "Calories (kcal)".
    pub fn from_label(label: &str) -> Option<Self> {
        let mut cleaned = label.to_lowercase();
        if let Some(open) = cleaned.find('(') {
            cleaned.truncate(open);
        }
        let cleaned = cleaned
            .trim()
            .trim_end_matches(':')
            .replace('.', " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let field = match cleaned.as_str() {
            "calories" | "calorie" | "cal" | "cals" | "kcal" | "energy" => NutrientField::Calories,
            "total fat" | "fat" => NutrientField::TotalFat,
            "saturated fat" | "sat fat" | "saturated" => NutrientField::SaturatedFat,
            "trans fat" | "trans" => NutrientField::TransFat,
            "cholesterol" | "chol" => NutrientField::Cholesterol,
            "sodium" | "salt" => NutrientField::Sodium,
            "total carbohydrates" | "total carbohydrate" | "total carbs" | "total carb"
            | "carbohydrates" | "carbohydrate" | "carbs" | "carb" => {
                NutrientField::TotalCarbohydrates
            }
            "dietary fiber" | "dietary fibre" | "fiber" | "fibre" => NutrientField::DietaryFiber,
            "total sugars" | "total sugar" | "sugars" | "sugar" => NutrientField::TotalSugars,
            "protein" | "proteins" => NutrientField::Protein,
            _ => return None,
        };
        Some(field)
    }
}

/// Whether a record was read off a menu page or estimated from heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    #[default]
    Extracted,
    Estimated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionRecord {
    pub name: String,
    pub venue: Option<String>,
    pub serving_size: Option<String>,
    pub calories: Option<u32>,
    pub total_fat: Option<f64>,
    pub saturated_fat: Option<f64>,
    pub trans_fat: Option<f64>,
    pub cholesterol: Option<f64>,
    pub sodium: Option<f64>,
    pub total_carbohydrates: Option<f64>,
    pub dietary_fiber: Option<f64>,
    pub total_sugars: Option<f64>,
    pub protein: Option<f64>,
    pub provenance: Provenance,
}

impl NutritionRecord {
    pub fn new(name: impl Into<String>, venue: Option<String>, provenance: Provenance) -> Self {
        Self {
            name: name.into(),
            venue,
            serving_size: None,
            calories: None,
            total_fat: None,
            saturated_fat: None,
            trans_fat: None,
            cholesterol: None,
            sodium: None,
            total_carbohydrates: None,
            dietary_fiber: None,
            total_sugars: None,
            protein: None,
            provenance,
        }
    }

    pub fn get(&self, field: NutrientField) -> Option<f64> {
        match field {
            NutrientField::Calories => self.calories.map(f64::from),
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

    /// Stores a value as-is; range checks belong to the normalizer.
    pub fn set(&mut self, field: NutrientField, value: f64) {
        match field {
            NutrientField::Calories => self.calories = Some(value.round() as u32),
            NutrientField::TotalFat => self.total_fat = Some(value),
            NutrientField::SaturatedFat => self.saturated_fat = Some(value),
            NutrientField::TransFat => self.trans_fat = Some(value),
            NutrientField::Cholesterol => self.cholesterol = Some(value),
            NutrientField::Sodium => self.sodium = Some(value),
            NutrientField::TotalCarbohydrates => self.total_carbohydrates = Some(value),
            NutrientField::DietaryFiber => self.dietary_fiber = Some(value),
            NutrientField::TotalSugars => self.total_sugars = Some(value),
            NutrientField::Protein => self.protein = Some(value),
        }
    }

    pub fn has_nutrition(&self) -> bool {
        NutrientField::ALL.iter().any(|f| self.get(*f).is_some())
    }

    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && self.has_nutrition()
    }

    /// Fills fields this record lacks from `other`; existing values win.
    pub fn merge_missing(&mut self, other: &NutritionRecord) -> bool {
        let mut changed = false;
        for field in NutrientField::ALL {
            if self.get(field).is_none() {
                if let Some(value) = other.get(field) {
                    self.set(field, value);
                    changed = true;
                }
            }
        }
        if self.serving_size.is_none() && other.serving_size.is_some() {
            self.serving_size = other.serving_size.clone();
            changed = true;
        }
        changed
    }

    pub fn is_estimated(&self) -> bool {
        self.provenance == Provenance::Estimated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueCategory {
    DiningCommons,
    Eatery,
}

fn default_open() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueDescriptor {
    pub key: String,
    pub display_name: String,
    pub category: VenueCategory,
    pub menu_source_ref: String,
    #[serde(default = "default_open")]
    pub is_open: bool,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl VenueDescriptor {
    pub fn new(
        key: &str,
        display_name: &str,
        category: VenueCategory,
        menu_source_ref: &str,
        is_open: bool,
    ) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            category,
            menu_source_ref: menu_source_ref.to_string(),
            is_open,
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Table,
    Card,
    TextPattern,
}

/// One item as a strategy saw it, before any numeric parsing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawCandidate {
    pub name: String,
    pub serving_size: Option<String>,
    pub fields: Vec<(NutrientField, String)>,
}

impl RawCandidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            serving_size: None,
            fields: Vec::new(),
        }
    }

    /// Keeps the first value seen for each field.
    pub fn push(&mut self, field: NutrientField, raw: impl Into<String>) {
        if !self.fields.iter().any(|(f, _)| *f == field) {
            self.fields.push((field, raw.into()));
        }
    }

    pub fn raw(&self, field: NutrientField) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, raw)| raw.as_str())
    }

    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub venue: String,
    pub candidates: Vec<RawCandidate>,
    pub strategy: Option<StrategyKind>,
    pub timestamp: DateTime<Utc>,
}

/// Food profile buckets used by the fallback estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodCategory {
    Entree,
    Side,
    Salad,
    Soup,
    Dessert,
    Beverage,
    Breakfast,
}

impl FoodCategory {
    pub const ALL: [FoodCategory; 7] = [
        FoodCategory::Entree,
        FoodCategory::Side,
        FoodCategory::Salad,
        FoodCategory::Soup,
        FoodCategory::Dessert,
        FoodCategory::Beverage,
        FoodCategory::Breakfast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FoodCategory::Entree => "entree",
            FoodCategory::Side => "side",
            FoodCategory::Salad => "salad",
            FoodCategory::Soup => "soup",
            FoodCategory::Dessert => "dessert",
            FoodCategory::Beverage => "beverage",
            FoodCategory::Breakfast => "breakfast",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Keyword match on the item name; checked in order, entree otherwise.
    pub fn classify(food_name: &str) -> Self {
        const RULES: &[(FoodCategory, &[&str])] = &[
            (
                FoodCategory::Beverage,
                &[
                    "coffee", "tea", "latte", "espresso", "cappuccino", "juice", "soda",
                    "smoothie", "milk", "lemonade", "cocoa", "water", "drink",
                ],
            ),
            (
                FoodCategory::Soup,
                &["soup", "chowder", "bisque", "chili", "stew", "broth"],
            ),
            (FoodCategory::Salad, &["salad", "slaw"]),
            (
                FoodCategory::Dessert,
                &[
                    "cookie", "cake", "brownie", "pie", "ice cream", "pudding", "donut",
                    "doughnut", "pastry", "muffin", "cupcake", "gelato", "dessert",
                ],
            ),
            (
                FoodCategory::Breakfast,
                &[
                    "pancake", "waffle", "omelet", "omelette", "egg", "bacon", "oatmeal",
                    "bagel", "french toast", "cereal", "hash brown", "granola",
                ],
            ),
            (
                FoodCategory::Side,
                &[
                    "fries", "rice", "potato", "vegetable", "veggies", "beans", "bread",
                    "roll", "corn", "chips", "side", "steamed", "roasted",
                ],
            ),
        ];

        let words: Vec<String> = food_name
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        let joined = words.join(" ");

        let matches = |keyword: &str| {
            if keyword.contains(' ') {
                joined.contains(keyword)
            } else {
                words.iter().any(|w| {
                    w == keyword
                        || w.strip_suffix('s') == Some(keyword)
                        || w.strip_suffix("es") == Some(keyword)
                })
            }
        };

        RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| matches(k)))
            .map(|(category, _)| *category)
            .unwrap_or(FoodCategory::Entree)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum NoDataReason {
    /// The page was fetched but no strategy produced a valid record.
    EmptyExtraction,
    /// Every venue consulted failed to respond.
    UpstreamUnavailable(String),
    /// Records exist but none matched the query.
    NoMatches,
    BlankQuery,
}

/// Field-level drops and merges seen during normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    pub unparseable: usize,
    pub out_of_range: usize,
    pub duplicates_merged: usize,
    pub invalid_candidates: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationReport {
    pub venue: String,
    pub display_name: String,
    pub records: Vec<NutritionRecord>,
    pub strategy: Option<StrategyKind>,
    pub no_data: Option<NoDataReason>,
    pub stats: NormalizeStats,
}

impl LocationReport {
    pub fn has_estimates(&self) -> bool {
        self.records.iter().any(NutritionRecord::is_estimated)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VenueFailure {
    pub venue: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub venue: Option<String>,
    pub records: Vec<NutritionRecord>,
    pub failures: Vec<VenueFailure>,
    pub no_data: Option<NoDataReason>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum VenueOutcome {
    Completed(LocationReport),
    Failed { error: String, attempts: u32 },
    Skipped,
}

impl VenueOutcome {
    pub fn records(&self) -> &[NutritionRecord] {
        match self {
            VenueOutcome::Completed(report) => &report.records,
            _ => &[],
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            VenueOutcome::Completed(_) => "completed",
            VenueOutcome::Failed { .. } => "failed",
            VenueOutcome::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub venues: Vec<(String, VenueOutcome)>,
}

impl BatchReport {
    pub fn get(&self, venue: &str) -> Option<&VenueOutcome> {
        self.venues
            .iter()
            .find(|(key, _)| key == venue)
            .map(|(_, outcome)| outcome)
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    pub fn total_records(&self) -> usize {
        self.venues.iter().map(|(_, o)| o.records().len()).sum()
    }
}
