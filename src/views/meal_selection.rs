use std::collections::BTreeMap;

use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{Item, ItemCategory, ItemFilter, MealSelection, MealType, Patient};
use crate::services::{ItemService, PatientService};

/// Meal-selection screen for one patient and meal.
#[derive(Debug, Clone)]
pub struct MealSelectionView {
    patient: Patient,
    meal: MealType,
    catalog: BTreeMap<ItemCategory, Vec<Item>>,
    selection: MealSelection,
}

fn push_or_remove(list: &mut Vec<String>, name: &str) -> bool {
    if let Some(pos) = list.iter().position(|n| n.eq_ignore_ascii_case(name)) {
        list.remove(pos);
        false
    } else {
        list.push(name.to_string());
        true
    }
}

impl MealSelectionView {
    /// Catalog offered at `meal`, narrowed to ADA-friendly items for ADA
    /// patients.
    pub async fn load(
        patients: &PatientService,
        items: &ItemService,
        patient_id: Uuid,
        meal: MealType,
    ) -> ServiceResult<Self> {
        let patient = patients.get_patient(patient_id).await?;
        let filter = ItemFilter {
            category: None,
            meal_type: Some(meal),
            ada_only: patient.ada_friendly,
        };

        let mut catalog: BTreeMap<ItemCategory, Vec<Item>> = BTreeMap::new();
        for item in items.list_items(&filter).await? {
            catalog.entry(item.category).or_default().push(item);
        }

        Ok(Self {
            selection: patient.meal(meal).clone(),
            patient,
            meal,
            catalog,
        })
    }

    pub fn patient(&self) -> &Patient {
        &self.patient
    }

    pub fn meal(&self) -> MealType {
        self.meal
    }

    pub fn catalog(&self) -> &BTreeMap<ItemCategory, Vec<Item>> {
        &self.catalog
    }

    pub fn selection(&self) -> &MealSelection {
        &self.selection
    }

    pub fn is_complete(&self) -> bool {
        self.selection.complete
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selection
            .all_names()
            .any(|n| n.eq_ignore_ascii_case(name.trim()))
    }

    /// Select or deselect a catalog entry. Juices and drinks go to their own
    /// lists. Returns whether the entry is now selected.
    pub fn toggle(&mut self, name: &str) -> ServiceResult<bool> {
        let name = name.trim();
        let item = self
            .catalog
            .values()
            .flatten()
            .find(|i| i.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ServiceError::ItemNotFound(name.to_string()))?;

        let list = match item.category {
            ItemCategory::Juice => &mut self.selection.juices,
            ItemCategory::Drink => &mut self.selection.drinks,
            _ => &mut self.selection.items,
        };
        Ok(push_or_remove(list, &item.name))
    }

    pub fn clear(&mut self) {
        self.selection = MealSelection {
            complete: self.selection.complete,
            ..Default::default()
        };
    }

    /// Persist the working selection and pick up the stored result.
    pub async fn save(&mut self, patients: &PatientService) -> ServiceResult<()> {
        let saved = patients
            .set_meal_selection(
                self.patient.id,
                self.meal,
                self.selection.items.clone(),
                self.selection.juices.clone(),
                self.selection.drinks.clone(),
            )
            .await?;
        self.selection = saved.meal(self.meal).clone();
        self.patient = saved;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPatient;
    use crate::test_support::{test_app, TestApp};

    async fn seed(app: &TestApp) {
        let items = [
            Item::new("Oatmeal", ItemCategory::Cereal)
                .ada_friendly()
                .with_meal_type(MealType::Breakfast),
            Item::new("Pancakes", ItemCategory::Entree).with_meal_type(MealType::Breakfast),
            Item::new("Meatloaf", ItemCategory::Entree).with_meal_type(MealType::Dinner),
            Item::new("Orange Juice", ItemCategory::Juice),
            Item::new("Tomato Juice", ItemCategory::Juice).ada_friendly(),
            Item::new("Coffee", ItemCategory::Drink).ada_friendly(),
        ];
        for item in items {
            app.dietary.items.add_item(item).await.unwrap();
        }
    }

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_catalog_grouped_and_restricted_to_meal() {
        let app = test_app().await;
        seed(&app).await;
        let patient = app
            .dietary
            .patients
            .add_patient(NewPatient::new("Ada", "Lovelace", "East", "101"))
            .await
            .unwrap();

        let view = MealSelectionView::load(
            &app.dietary.patients,
            &app.dietary.items,
            patient.id,
            MealType::Breakfast,
        )
        .await
        .unwrap();

        let catalog = view.catalog();
        assert_eq!(names(&catalog[&ItemCategory::Entree]), vec!["Pancakes"]);
        assert_eq!(
            names(&catalog[&ItemCategory::Juice]),
            vec!["Orange Juice", "Tomato Juice"]
        );
        assert!(!view.is_complete());
        assert!(view.selection().is_empty());
    }

    #[tokio::test]
    async fn test_ada_patient_sees_only_ada_items() {
        let app = test_app().await;
        seed(&app).await;
        let patient = app
            .dietary
            .patients
            .add_patient(NewPatient::new("Ada", "Lovelace", "East", "101").ada(true))
            .await
            .unwrap();

        let view = MealSelectionView::load(
            &app.dietary.patients,
            &app.dietary.items,
            patient.id,
            MealType::Breakfast,
        )
        .await
        .unwrap();

        assert!(!view.catalog().contains_key(&ItemCategory::Entree));
        assert_eq!(
            names(&view.catalog()[&ItemCategory::Juice]),
            vec!["Tomato Juice"]
        );
    }

    #[tokio::test]
    async fn test_toggle_and_save() {
        let app = test_app().await;
        seed(&app).await;
        let patient = app
            .dietary
            .patients
            .add_patient(NewPatient::new("Ada", "Lovelace", "East", "101"))
            .await
            .unwrap();

        let mut view = MealSelectionView::load(
            &app.dietary.patients,
            &app.dietary.items,
            patient.id,
            MealType::Breakfast,
        )
        .await
        .unwrap();

        assert!(view.toggle("pancakes").unwrap());
        assert!(view.toggle("Orange Juice").unwrap());
        assert!(view.toggle("Coffee").unwrap());
        assert!(view.toggle("Oatmeal").unwrap());
        assert!(!view.toggle("oatmeal").unwrap());
        assert!(matches!(
            view.toggle("Meatloaf"),
            Err(ServiceError::ItemNotFound(_))
        ));

        view.save(&app.dietary.patients).await.unwrap();
        let stored = app.dietary.patients.get_patient(patient.id).await.unwrap();
        assert_eq!(stored.breakfast.items, vec!["Pancakes"]);
        assert_eq!(stored.breakfast.juices, vec!["Orange Juice"]);
        assert_eq!(stored.breakfast.drinks, vec!["Coffee"]);
        assert!(view.is_selected("coffee"));

        view.clear();
        assert!(view.selection().is_empty());
    }
}
