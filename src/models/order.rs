use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::item::ItemCategory;
use super::meal_type::MealType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub item_name: String,
    pub category: ItemCategory,
    pub quantity: i32,
}

impl OrderItem {
    pub fn new(item_name: impl Into<String>, category: ItemCategory) -> Self {
        Self {
            item_name: item_name.into(),
            category,
            quantity: 1,
        }
    }
}

impl fmt::Display for OrderItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quantity == 1 {
            write!(f, "{} ({})", self.item_name, self.category)
        } else {
            write!(f, "{}x {} ({})", self.quantity, self.item_name, self.category)
        }
    }
}

/// Order header plus line items for one patient's meal on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealOrder {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub meal: MealType,
    pub order_date: NaiveDate,
    pub finalized: bool,
    pub items: Vec<OrderItem>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl MealOrder {
    pub fn new(
        patient_id: Uuid,
        meal: MealType,
        order_date: NaiveDate,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            meal,
            order_date,
            finalized: false,
            items: Vec::new(),
            created_by: created_by.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_items(mut self, items: Vec<OrderItem>) -> Self {
        self.items = items;
        self
    }
}

impl fmt::Display for MealOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Order {}", self.id)?;
        writeln!(f, "Date: {}", self.order_date)?;
        writeln!(f, "Meal: {}", self.meal)?;
        writeln!(
            f,
            "Status: {}",
            if self.finalized { "finalized" } else { "open" }
        )?;
        writeln!(f, "Created by: {}", self.created_by)?;
        writeln!(f, "\nItems:")?;
        for item in &self.items {
            writeln!(f, "  - {}", item)?;
        }
        Ok(())
    }
}

/// Immutable record of an order as it was sent to the kitchen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedOrder {
    pub id: Uuid,
    pub order_id: Uuid,
    pub patient_name: String,
    pub wing: String,
    pub room_number: String,
    pub diet_type: String,
    pub ada_friendly: bool,
    pub meal: MealType,
    pub order_date: NaiveDate,
    pub items: Vec<OrderItem>,
    pub finalized_by: String,
    pub finalized_at: DateTime<Utc>,
}

impl fmt::Display for FinalizedOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}-{} ({}{})",
            self.order_date,
            self.meal,
            self.wing,
            self.room_number,
            self.diet_type,
            if self.ada_friendly { ", ADA" } else { "" }
        )?;
        write!(f, " {}: ", self.patient_name)?;
        let names: Vec<&str> = self.items.iter().map(|i| i.item_name.as_str()).collect();
        write!(f, "{}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_item_display_quantity() {
        let mut item = OrderItem::new("Toast", ItemCategory::Bread);
        assert_eq!(item.to_string(), "Toast (bread)");
        item.quantity = 2;
        assert_eq!(item.to_string(), "2x Toast (bread)");
    }

    #[test]
    fn test_new_order_is_open() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let order = MealOrder::new(Uuid::new_v4(), MealType::Lunch, date, "jdoe");
        assert!(!order.finalized);
        assert!(order.items.is_empty());
        assert_eq!(order.created_by, "jdoe");
    }
}
