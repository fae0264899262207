//! Standing menu used when staff have not made a selection for a patient.

use super::item::ItemCategory;
use super::meal_type::MealType;
use super::patient::MealSelection;

struct MenuEntry {
    meal: MealType,
    category: ItemCategory,
    regular: &'static [&'static str],
    /// Substitutions for ADA patients; `None` means the regular choice is fine.
    ada: Option<&'static [&'static str]>,
}

const MENU: &[MenuEntry] = &[
    MenuEntry {
        meal: MealType::Breakfast,
        category: ItemCategory::Entree,
        regular: &["Scrambled Eggs"],
        ada: None,
    },
    MenuEntry {
        meal: MealType::Breakfast,
        category: ItemCategory::Cereal,
        regular: &["Oatmeal"],
        ada: None,
    },
    MenuEntry {
        meal: MealType::Breakfast,
        category: ItemCategory::Bread,
        regular: &["White Toast"],
        ada: Some(&["Wheat Toast"]),
    },
    MenuEntry {
        meal: MealType::Breakfast,
        category: ItemCategory::Juice,
        regular: &["Orange Juice"],
        ada: Some(&["Tomato Juice"]),
    },
    MenuEntry {
        meal: MealType::Breakfast,
        category: ItemCategory::Drink,
        regular: &["Coffee"],
        ada: None,
    },
    MenuEntry {
        meal: MealType::Lunch,
        category: ItemCategory::Entree,
        regular: &["Turkey Sandwich"],
        ada: None,
    },
    MenuEntry {
        meal: MealType::Lunch,
        category: ItemCategory::Soup,
        regular: &["Chicken Noodle Soup"],
        ada: None,
    },
    MenuEntry {
        meal: MealType::Lunch,
        category: ItemCategory::Dessert,
        regular: &["Chocolate Pudding"],
        ada: Some(&["Sugar-Free Gelatin"]),
    },
    MenuEntry {
        meal: MealType::Lunch,
        category: ItemCategory::Juice,
        regular: &["Apple Juice"],
        ada: Some(&["Tomato Juice"]),
    },
    MenuEntry {
        meal: MealType::Lunch,
        category: ItemCategory::Drink,
        regular: &["Iced Tea"],
        ada: Some(&["Unsweetened Iced Tea"]),
    },
    MenuEntry {
        meal: MealType::Dinner,
        category: ItemCategory::Entree,
        regular: &["Baked Chicken"],
        ada: None,
    },
    MenuEntry {
        meal: MealType::Dinner,
        category: ItemCategory::Starch,
        regular: &["Mashed Potatoes"],
        ada: Some(&["Brown Rice"]),
    },
    MenuEntry {
        meal: MealType::Dinner,
        category: ItemCategory::Vegetable,
        regular: &["Green Beans"],
        ada: None,
    },
    MenuEntry {
        meal: MealType::Dinner,
        category: ItemCategory::Dessert,
        regular: &["Apple Pie"],
        ada: Some(&["Fresh Fruit Cup"]),
    },
    MenuEntry {
        meal: MealType::Dinner,
        category: ItemCategory::Drink,
        regular: &["Milk"],
        ada: Some(&["Skim Milk"]),
    },
];

pub struct DefaultMenu;

impl DefaultMenu {
    /// Default choices for a meal and category, or an empty slice if the
    /// menu has none.
    pub fn lookup(meal: MealType, category: ItemCategory, ada: bool) -> &'static [&'static str] {
        MENU.iter()
            .find(|e| e.meal == meal && e.category == category)
            .map(|e| match (ada, e.ada) {
                (true, Some(substitute)) => substitute,
                _ => e.regular,
            })
            .unwrap_or(&[])
    }

    /// The complete default selection for a meal, split into items, juices
    /// and drinks the way patient selections are stored.
    pub fn selection(meal: MealType, ada: bool) -> MealSelection {
        let mut selection = MealSelection::default();
        for category in ItemCategory::ALL {
            let names = Self::lookup(meal, category, ada)
                .iter()
                .map(|n| n.to_string());
            match category {
                ItemCategory::Juice => selection.juices.extend(names),
                ItemCategory::Drink => selection.drinks.extend(names),
                _ => selection.items.extend(names),
            }
        }
        selection
    }

    /// Every name on the menu with its category; used to seed a catalog.
    pub fn all_entries() -> Vec<(&'static str, ItemCategory, Option<MealType>, bool)> {
        let mut entries = Vec::new();
        for entry in MENU {
            let ada_default = entry.ada.is_none();
            for name in entry.regular {
                entries.push((*name, entry.category, Some(entry.meal), ada_default));
            }
            if let Some(substitutes) = entry.ada {
                for name in substitutes {
                    entries.push((*name, entry.category, Some(entry.meal), true));
                }
            }
        }
        entries
    }

    /// Categories and ADA flags the menu gives `name`, matched
    /// case-insensitively.
    pub fn find(name: &str) -> Vec<(ItemCategory, bool)> {
        let name = name.trim();
        Self::all_entries()
            .into_iter()
            .filter(|(n, ..)| n.eq_ignore_ascii_case(name))
            .map(|(_, category, _, ada)| (category, ada))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_regular_and_ada() {
        assert_eq!(
            DefaultMenu::lookup(MealType::Lunch, ItemCategory::Dessert, false),
            &["Chocolate Pudding"]
        );
        assert_eq!(
            DefaultMenu::lookup(MealType::Lunch, ItemCategory::Dessert, true),
            &["Sugar-Free Gelatin"]
        );
    }

    #[test]
    fn test_ada_lookup_falls_back_to_regular() {
        assert_eq!(
            DefaultMenu::lookup(MealType::Dinner, ItemCategory::Entree, true),
            &["Baked Chicken"]
        );
    }

    #[test]
    fn test_lookup_missing_category_is_empty() {
        assert!(DefaultMenu::lookup(MealType::Breakfast, ItemCategory::Soup, false).is_empty());
    }

    #[test]
    fn test_selection_splits_juices_and_drinks() {
        let selection = DefaultMenu::selection(MealType::Breakfast, false);
        assert_eq!(
            selection.items,
            vec!["Scrambled Eggs", "White Toast", "Oatmeal"]
        );
        assert_eq!(selection.juices, vec!["Orange Juice"]);
        assert_eq!(selection.drinks, vec!["Coffee"]);
        assert!(!selection.complete);
    }

    #[test]
    fn test_find_ignores_case() {
        assert_eq!(
            DefaultMenu::find(" brown rice "),
            vec![(ItemCategory::Starch, true)]
        );
        assert_eq!(
            DefaultMenu::find("Apple Pie"),
            vec![(ItemCategory::Dessert, false)]
        );
        assert!(DefaultMenu::find("Lobster").is_empty());
    }

    #[test]
    fn test_every_meal_has_defaults() {
        for meal in MealType::ALL {
            assert!(!DefaultMenu::selection(meal, true).is_empty());
        }
    }
}
