use serde::{Deserialize, Serialize};

/// A menu category as returned by the server. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub item_count: u32,
}

/// A menu item in a category listing. The list endpoint does not report
/// favorite status, so `is_favorite` defaults to false there and is kept
/// current locally after a confirmed favorite toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub is_favorite: bool,
}

/// Full detail for a single item, fetched lazily per selection and replaced
/// wholesale on each new selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemDetail {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: f64,
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub nutritional_info: Option<NutritionalInfo>,
    #[serde(default)]
    pub allergens: Vec<String>,
    /// Preparation time in minutes.
    pub preparation_time: u32,
    #[serde(default)]
    pub is_favorite: bool,
}

/// Macronutrients are grams, sodium is milligrams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionalInfo {
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub sugar: f64,
    pub sodium: f64,
}
