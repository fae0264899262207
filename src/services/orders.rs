use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::db::{ItemRepository, OrderRepository, PatientRepository};
use crate::error::{ServiceError, ServiceResult};
use crate::executor::WriteExecutor;
use crate::live::{ChangeNotifier, Table};
use crate::models::{FinalizedOrder, MealOrder, MealType, OrderItem};

use super::selection::{groups, resolve, Group};

#[derive(Clone)]
pub struct OrderService {
    repo: OrderRepository,
    patients: PatientRepository,
    items: ItemRepository,
    executor: Arc<WriteExecutor>,
    notifier: ChangeNotifier,
}

impl OrderService {
    pub fn new(
        repo: OrderRepository,
        patients: PatientRepository,
        items: ItemRepository,
        executor: Arc<WriteExecutor>,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            repo,
            patients,
            items,
            executor,
            notifier,
        }
    }

    /// Build an order from the patient's current selection for `meal`.
    /// Names missing from the catalog still order; for an ADA patient every
    /// name must be known to be ADA-friendly.
    pub async fn create_order(
        &self,
        patient_id: Uuid,
        meal: MealType,
        date: NaiveDate,
        created_by: &str,
    ) -> ServiceResult<MealOrder> {
        let repo = self.repo.clone();
        let patients = self.patients.clone();
        let items = self.items.clone();
        let notifier = self.notifier.clone();
        let created_by = created_by.to_string();

        self.executor
            .submit(async move {
                let patient = patients
                    .get_by_id(patient_id)
                    .await?
                    .ok_or(ServiceError::PatientNotFound)?;

                let selection = patient.meal(meal);
                if selection.is_empty() {
                    return Err(ServiceError::EmptySelection(meal.to_string()));
                }
                if repo.find(patient_id, meal, date).await?.is_some() {
                    return Err(ServiceError::OrderExists {
                        meal: meal.to_string(),
                        date: date.to_string(),
                    });
                }

                let mut lines = Vec::new();
                for (group, names) in groups(selection) {
                    for name in names {
                        let resolved = resolve(&items, name, group).await?;
                        if patient.ada_friendly && !resolved.ada_safe() {
                            return Err(ServiceError::NotAdaFriendly(name.clone()));
                        }
                        // Juices and drinks are known from the list they sit in
                        let category = match group {
                            Group::Items => resolved.category,
                            Group::Juices | Group::Drinks => group.fallback(),
                        };
                        lines.push(OrderItem::new(name, category));
                    }
                }

                let order = MealOrder::new(patient_id, meal, date, created_by).with_items(lines);
                let created = repo.create(&order).await?;
                notifier.notify(Table::Orders);
                tracing::info!(order = %created.id, patient = %patient_id, meal = %meal, "order created");
                Ok(created)
            })
            .wait()
            .await
    }

    /// Snapshot the order for the kitchen. An order finalizes once.
    pub async fn finalize_order(
        &self,
        order_id: Uuid,
        finalized_by: &str,
    ) -> ServiceResult<FinalizedOrder> {
        let repo = self.repo.clone();
        let patients = self.patients.clone();
        let notifier = self.notifier.clone();
        let finalized_by = finalized_by.to_string();

        self.executor
            .submit(async move {
                let order = repo
                    .get_by_id(order_id)
                    .await?
                    .ok_or(ServiceError::OrderNotFound)?;
                if order.finalized {
                    return Err(ServiceError::OrderFinalized);
                }
                let patient = patients
                    .get_by_id(order.patient_id)
                    .await?
                    .ok_or(ServiceError::PatientNotFound)?;

                let snapshot = FinalizedOrder {
                    id: Uuid::new_v4(),
                    order_id,
                    patient_name: patient.full_name(),
                    wing: patient.location.wing.clone(),
                    room_number: patient.location.room_number.clone(),
                    diet_type: patient.diet_type.to_string(),
                    ada_friendly: patient.ada_friendly,
                    meal: order.meal,
                    order_date: order.order_date,
                    items: order.items,
                    finalized_by,
                    finalized_at: Utc::now(),
                };

                if !repo.finalize(&snapshot).await? {
                    return Err(ServiceError::OrderFinalized);
                }
                notifier.notify(Table::Orders);
                tracing::info!(order = %order_id, "order finalized");
                Ok(snapshot)
            })
            .wait()
            .await
    }

    pub async fn delete_order(&self, order_id: Uuid) -> ServiceResult<()> {
        let repo = self.repo.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                let order = repo
                    .get_by_id(order_id)
                    .await?
                    .ok_or(ServiceError::OrderNotFound)?;
                if order.finalized || !repo.delete_open(order_id).await? {
                    return Err(ServiceError::OrderFinalized);
                }
                notifier.notify(Table::Orders);
                tracing::info!(order = %order_id, "order deleted");
                Ok(())
            })
            .wait()
            .await
    }

    pub async fn get_order(&self, order_id: Uuid) -> ServiceResult<MealOrder> {
        self.repo
            .get_by_id(order_id)
            .await?
            .ok_or(ServiceError::OrderNotFound)
    }

    pub async fn list_orders(&self, date: NaiveDate) -> ServiceResult<Vec<MealOrder>> {
        Ok(self.repo.list_by_date(date).await?)
    }

    pub async fn list_finalized(&self, date: NaiveDate) -> ServiceResult<Vec<FinalizedOrder>> {
        Ok(self.repo.list_finalized(date).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DefaultMenu, Item, ItemCategory, NewPatient, Patient, PatientUpdate};
    use crate::test_support::{test_app, TestApp};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    async fn patient_with_lunch(app: &TestApp) -> Patient {
        let d = &app.dietary;
        for item in [
            Item::new("Turkey Sandwich", ItemCategory::Entree),
            Item::new("Apple Juice", ItemCategory::Juice),
            Item::new("Iced Tea", ItemCategory::Drink),
        ] {
            d.items.add_item(item).await.unwrap();
        }
        let patient = d
            .patients
            .add_patient(NewPatient::new("Ada", "Lovelace", "East", "101"))
            .await
            .unwrap();
        d.patients
            .set_meal_selection(
                patient.id,
                MealType::Lunch,
                vec!["Turkey Sandwich".into()],
                vec!["Apple Juice".into()],
                vec!["Iced Tea".into()],
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_order_from_selection() {
        let app = test_app().await;
        let patient = patient_with_lunch(&app).await;
        let orders = &app.dietary.orders;

        let order = orders
            .create_order(patient.id, MealType::Lunch, date(), "jdoe")
            .await
            .unwrap();
        assert_eq!(
            order.items,
            vec![
                OrderItem::new("Turkey Sandwich", ItemCategory::Entree),
                OrderItem::new("Apple Juice", ItemCategory::Juice),
                OrderItem::new("Iced Tea", ItemCategory::Drink),
            ]
        );

        let err = orders
            .create_order(patient.id, MealType::Lunch, date(), "jdoe")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "An order already exists for lunch on 2025-06-02"
        );
    }

    #[tokio::test]
    async fn test_order_from_default_menu_without_catalog() {
        let app = test_app().await;
        let d = &app.dietary;
        let patient = d
            .patients
            .add_patient(NewPatient::new("Ada", "Lovelace", "East", "101"))
            .await
            .unwrap();
        d.patients
            .apply_default_menu(patient.id, MealType::Breakfast)
            .await
            .unwrap();

        let order = d
            .orders
            .create_order(patient.id, MealType::Breakfast, date(), "jdoe")
            .await
            .unwrap();
        assert_eq!(
            order.items,
            vec![
                OrderItem::new("Scrambled Eggs", ItemCategory::Entree),
                OrderItem::new("White Toast", ItemCategory::Bread),
                OrderItem::new("Oatmeal", ItemCategory::Cereal),
                OrderItem::new("Orange Juice", ItemCategory::Juice),
                OrderItem::new("Coffee", ItemCategory::Drink),
            ]
        );
    }

    #[tokio::test]
    async fn test_ada_order_from_default_menu_without_catalog() {
        let app = test_app().await;
        let d = &app.dietary;
        let patient = d
            .patients
            .add_patient(NewPatient::new("Ada", "Lovelace", "East", "101").ada(true))
            .await
            .unwrap();
        d.patients
            .apply_default_menu(patient.id, MealType::Dinner)
            .await
            .unwrap();

        let order = d
            .orders
            .create_order(patient.id, MealType::Dinner, date(), "jdoe")
            .await
            .unwrap();
        let expected = DefaultMenu::selection(MealType::Dinner, true);
        assert_eq!(
            order.items.iter().map(|i| i.item_name.as_str()).collect::<Vec<_>>(),
            expected.all_names().collect::<Vec<_>>()
        );
        assert!(order
            .items
            .contains(&OrderItem::new("Brown Rice", ItemCategory::Starch)));
    }

    #[tokio::test]
    async fn test_selection_then_order_uses_catalog_categories() {
        let app = test_app().await;
        let d = &app.dietary;
        for item in [
            Item::new("Fruit Cup", ItemCategory::Fruit),
            Item::new("Fruit Cup", ItemCategory::Dessert),
            Item::new("Cranberry Juice", ItemCategory::Juice),
        ] {
            d.items.add_item(item).await.unwrap();
        }
        let patient = d
            .patients
            .add_patient(NewPatient::new("Ada", "Lovelace", "East", "101"))
            .await
            .unwrap();
        d.patients
            .set_meal_selection(
                patient.id,
                MealType::Dinner,
                vec!["fruit cup".into()],
                vec!["Cranberry Juice".into()],
                vec![],
            )
            .await
            .unwrap();

        // The item was removed from the catalog after it was selected
        let juice = d.items.find_by_name("Cranberry Juice").await.unwrap();
        d.items.delete_item(juice.id).await.unwrap();

        let order = d
            .orders
            .create_order(patient.id, MealType::Dinner, date(), "jdoe")
            .await
            .unwrap();
        assert_eq!(
            order.items,
            vec![
                OrderItem::new("fruit cup", ItemCategory::Dessert),
                OrderItem::new("Cranberry Juice", ItemCategory::Juice),
            ]
        );
    }

    #[tokio::test]
    async fn test_ada_patient_order_rejects_non_ada_item() {
        let app = test_app().await;
        let d = &app.dietary;
        let patient = patient_with_lunch(&app).await;

        // The sandwich stays non-ADA; the juice and tea become ADA-friendly
        let mut juice = d.items.find_by_name("Apple Juice").await.unwrap();
        juice.ada_friendly = true;
        d.items.update_item(juice).await.unwrap();
        let mut tea = d.items.find_by_name("Iced Tea").await.unwrap();
        tea.ada_friendly = true;
        d.items.update_item(tea).await.unwrap();

        // Becoming ADA removes the sandwich from the selection
        d.patients
            .update_patient(
                patient.id,
                PatientUpdate {
                    ada_friendly: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let order = d
            .orders
            .create_order(patient.id, MealType::Lunch, date(), "jdoe")
            .await
            .unwrap();
        assert_eq!(
            order.items,
            vec![
                OrderItem::new("Apple Juice", ItemCategory::Juice),
                OrderItem::new("Iced Tea", ItemCategory::Drink),
            ]
        );
        d.orders.delete_order(order.id).await.unwrap();

        // An item that stops being ADA-friendly later is caught at order time
        let mut juice = d.items.find_by_name("Apple Juice").await.unwrap();
        juice.ada_friendly = false;
        d.items.update_item(juice).await.unwrap();
        let err = d
            .orders
            .create_order(patient.id, MealType::Lunch, date(), "jdoe")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "'Apple Juice' is not ADA-friendly");
    }

    #[tokio::test]
    async fn test_create_order_requires_selection() {
        let app = test_app().await;
        let patient = patient_with_lunch(&app).await;

        let err = app
            .dietary
            .orders
            .create_order(patient.id, MealType::Dinner, date(), "jdoe")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No items selected for dinner");
    }

    #[tokio::test]
    async fn test_finalize_snapshots_and_only_once() {
        let app = test_app().await;
        let patient = patient_with_lunch(&app).await;
        let orders = &app.dietary.orders;

        let order = orders
            .create_order(patient.id, MealType::Lunch, date(), "jdoe")
            .await
            .unwrap();
        let snapshot = orders.finalize_order(order.id, "chef").await.unwrap();
        assert_eq!(snapshot.patient_name, "Ada Lovelace");
        assert_eq!(snapshot.room_number, "101");
        assert_eq!(snapshot.items.len(), 3);
        assert_eq!(snapshot.finalized_by, "chef");

        assert!(orders.get_order(order.id).await.unwrap().finalized);
        assert!(matches!(
            orders.finalize_order(order.id, "chef").await,
            Err(ServiceError::OrderFinalized)
        ));
        assert!(matches!(
            orders.delete_order(order.id).await,
            Err(ServiceError::OrderFinalized)
        ));

        // A later edit to the patient does not change the snapshot
        app.dietary.patients.discharge(patient.id).await.unwrap();
        let finalized = orders.list_finalized(date()).await.unwrap();
        assert_eq!(finalized, vec![snapshot]);
    }

    #[tokio::test]
    async fn test_delete_open_order() {
        let app = test_app().await;
        let patient = patient_with_lunch(&app).await;
        let orders = &app.dietary.orders;

        let order = orders
            .create_order(patient.id, MealType::Lunch, date(), "jdoe")
            .await
            .unwrap();
        orders.delete_order(order.id).await.unwrap();
        assert!(orders.list_orders(date()).await.unwrap().is_empty());
        assert!(matches!(
            orders.delete_order(order.id).await,
            Err(ServiceError::OrderNotFound)
        ));
    }
}
