use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::meal_type::MealType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Entree,
    Side,
    Starch,
    Vegetable,
    Fruit,
    Bread,
    Cereal,
    Soup,
    Dessert,
    Condiment,
    Juice,
    Drink,
}

impl ItemCategory {
    pub const ALL: [ItemCategory; 12] = [
        ItemCategory::Entree,
        ItemCategory::Side,
        ItemCategory::Starch,
        ItemCategory::Vegetable,
        ItemCategory::Fruit,
        ItemCategory::Bread,
        ItemCategory::Cereal,
        ItemCategory::Soup,
        ItemCategory::Dessert,
        ItemCategory::Condiment,
        ItemCategory::Juice,
        ItemCategory::Drink,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::Entree => "entree",
            ItemCategory::Side => "side",
            ItemCategory::Starch => "starch",
            ItemCategory::Vegetable => "vegetable",
            ItemCategory::Fruit => "fruit",
            ItemCategory::Bread => "bread",
            ItemCategory::Cereal => "cereal",
            ItemCategory::Soup => "soup",
            ItemCategory::Dessert => "dessert",
            ItemCategory::Condiment => "condiment",
            ItemCategory::Juice => "juice",
            ItemCategory::Drink => "drink",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ItemCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ItemCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| {
                let valid: Vec<&str> = ItemCategory::ALL.iter().map(|c| c.as_str()).collect();
                format!(
                    "Invalid category '{}'. Valid options: {}",
                    s,
                    valid.join(", ")
                )
            })
    }
}

/// A catalog entry that can be selected for a patient's meal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub category: ItemCategory,
    pub ada_friendly: bool,
    /// `None` means the item may be served at any meal.
    pub meal_type: Option<MealType>,
    pub serving_size: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn new(name: impl Into<String>, category: ItemCategory) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category,
            ada_friendly: false,
            meal_type: None,
            serving_size: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn ada_friendly(mut self) -> Self {
        self.ada_friendly = true;
        self
    }

    pub fn with_meal_type(mut self, meal_type: MealType) -> Self {
        self.meal_type = Some(meal_type);
        self
    }

    pub fn with_serving_size(mut self, serving_size: impl Into<String>) -> Self {
        self.serving_size = Some(serving_size.into());
        self
    }

    pub fn served_at(&self, meal: MealType) -> bool {
        self.meal_type.map_or(true, |m| m == meal)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.category)?;
        if let Some(size) = &self.serving_size {
            write!(f, ", {}", size)?;
        }
        if self.ada_friendly {
            write!(f, " [ADA]")?;
        }
        Ok(())
    }
}

/// Catalog filter; every `None` field matches everything.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub category: Option<ItemCategory>,
    pub meal_type: Option<MealType>,
    pub ada_only: bool,
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        self.category.map_or(true, |c| c == item.category)
            && self.meal_type.map_or(true, |m| item.served_at(m))
            && (!self.ada_only || item.ada_friendly)
    }
}
