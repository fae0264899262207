use chrono::NaiveDate;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{decode_error, parse_id, parse_timestamp};
use crate::models::{FinalizedOrder, MealOrder, MealType, OrderItem};

#[derive(Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    patient_id: String,
    meal: String,
    order_date: String,
    finalized: bool,
    created_by: String,
    created_at: String,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    item_name: String,
    category: String,
    quantity: i32,
}

#[derive(sqlx::FromRow)]
struct FinalizedRow {
    id: String,
    order_id: String,
    patient_name: String,
    wing: String,
    room_number: String,
    diet_type: String,
    ada_friendly: bool,
    meal: String,
    order_date: String,
    items: String,
    finalized_by: String,
    finalized_at: String,
}

fn parse_date(value: &str) -> Result<NaiveDate, sqlx::Error> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(decode_error)
}

impl TryFrom<FinalizedRow> for FinalizedOrder {
    type Error = sqlx::Error;

    fn try_from(row: FinalizedRow) -> Result<Self, Self::Error> {
        let meal: MealType = row.meal.parse().map_err(decode_error)?;
        let items: Vec<OrderItem> = serde_json::from_str(&row.items).map_err(decode_error)?;

        Ok(FinalizedOrder {
            id: parse_id(&row.id)?,
            order_id: parse_id(&row.order_id)?,
            patient_name: row.patient_name,
            wing: row.wing,
            room_number: row.room_number,
            diet_type: row.diet_type,
            ada_friendly: row.ada_friendly,
            meal,
            order_date: parse_date(&row.order_date)?,
            items,
            finalized_by: row.finalized_by,
            finalized_at: parse_timestamp(&row.finalized_at),
        })
    }
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, order: &MealOrder) -> Result<MealOrder, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let id = order.id.to_string();

        sqlx::query(
            r#"
            INSERT INTO meal_orders (id, patient_id, meal, order_date, finalized, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(order.patient_id.to_string())
        .bind(order.meal.as_str())
        .bind(order.order_date.to_string())
        .bind(order.finalized)
        .bind(&order.created_by)
        .bind(order.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (order_id, item_name, category, quantity) VALUES (?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(&item.item_name)
            .bind(item.category.as_str())
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_by_id(order.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<MealOrder>, sqlx::Error> {
        let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM meal_orders WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => self.hydrate_order(row).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn find(
        &self,
        patient_id: Uuid,
        meal: MealType,
        date: NaiveDate,
    ) -> Result<Option<MealOrder>, sqlx::Error> {
        let row: Option<OrderRow> = sqlx::query_as(
            "SELECT * FROM meal_orders WHERE patient_id = ? AND meal = ? AND order_date = ?",
        )
        .bind(patient_id.to_string())
        .bind(meal.as_str())
        .bind(date.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => self.hydrate_order(row).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<MealOrder>, sqlx::Error> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            r#"
            SELECT * FROM meal_orders
            WHERE order_date = ?
            ORDER BY CASE meal WHEN 'breakfast' THEN 0 WHEN 'lunch' THEN 1 ELSE 2 END, created_at
            "#,
        )
        .bind(date.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(self.hydrate_order(row).await?);
        }
        Ok(orders)
    }

    /// Store the snapshot and flag the order in one transaction. Returns
    /// false when the order was already finalized (or is gone).
    pub async fn finalize(&self, snapshot: &FinalizedOrder) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let flagged = sqlx::query("UPDATE meal_orders SET finalized = 1 WHERE id = ? AND finalized = 0")
            .bind(snapshot.order_id.to_string())
            .execute(&mut *tx)
            .await?;

        if flagged.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let items = serde_json::to_string(&snapshot.items).map_err(|e| sqlx::Error::Encode(e.into()))?;

        sqlx::query(
            r#"
            INSERT INTO finalized_orders (id, order_id, patient_name, wing, room_number, diet_type, ada_friendly, meal, order_date, items, finalized_by, finalized_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(snapshot.id.to_string())
        .bind(snapshot.order_id.to_string())
        .bind(&snapshot.patient_name)
        .bind(&snapshot.wing)
        .bind(&snapshot.room_number)
        .bind(&snapshot.diet_type)
        .bind(snapshot.ada_friendly)
        .bind(snapshot.meal.as_str())
        .bind(snapshot.order_date.to_string())
        .bind(&items)
        .bind(&snapshot.finalized_by)
        .bind(snapshot.finalized_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    pub async fn list_finalized(&self, date: NaiveDate) -> Result<Vec<FinalizedOrder>, sqlx::Error> {
        let rows: Vec<FinalizedRow> = sqlx::query_as(
            r#"
            SELECT * FROM finalized_orders
            WHERE order_date = ?
            ORDER BY CASE meal WHEN 'breakfast' THEN 0 WHEN 'lunch' THEN 1 ELSE 2 END,
                     wing COLLATE NOCASE, room_number COLLATE NOCASE
            "#,
        )
        .bind(date.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(FinalizedOrder::try_from).collect()
    }

    /// Delete an order that has not been finalized yet.
    pub async fn delete_open(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM meal_orders WHERE id = ? AND finalized = 0")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn hydrate_order(&self, row: OrderRow) -> Result<MealOrder, sqlx::Error> {
        let items: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT item_name, category, quantity FROM order_items WHERE order_id = ? ORDER BY id",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let items = items
            .into_iter()
            .map(|i| {
                Ok(OrderItem {
                    item_name: i.item_name,
                    category: i.category.parse().map_err(decode_error)?,
                    quantity: i.quantity,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(MealOrder {
            id: parse_id(&row.id)?,
            patient_id: parse_id(&row.patient_id)?,
            meal: row.meal.parse().map_err(decode_error)?,
            order_date: parse_date(&row.order_date)?,
            finalized: row.finalized,
            items,
            created_by: row.created_by,
            created_at: parse_timestamp(&row.created_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{test_db, TestDb};
    use crate::db::PatientRepository;
    use crate::models::{ItemCategory, NewPatient};
    use chrono::Utc;

    struct TestContext {
        repo: OrderRepository,
        patients: PatientRepository,
        _db: TestDb,
    }

    async fn setup() -> TestContext {
        let db = test_db().await;
        TestContext {
            repo: OrderRepository::new(db.pool.clone()),
            patients: PatientRepository::new(db.pool.clone()),
            _db: db,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 14).unwrap()
    }

    fn snapshot_for(order: &MealOrder) -> FinalizedOrder {
        FinalizedOrder {
            id: Uuid::new_v4(),
            order_id: order.id,
            patient_name: "Ada Lovelace".into(),
            wing: "East".into(),
            room_number: "101".into(),
            diet_type: "regular".into(),
            ada_friendly: false,
            meal: order.meal,
            order_date: order.order_date,
            items: order.items.clone(),
            finalized_by: "jdoe".into(),
            finalized_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_order() {
        let ctx = setup().await;
        let patient = ctx
            .patients
            .create(&NewPatient::new("Ada", "Lovelace", "East", "101"))
            .await
            .unwrap();

        let order = MealOrder::new(patient.id, MealType::Lunch, date(), "jdoe").with_items(vec![
            OrderItem::new("Turkey Sandwich", ItemCategory::Entree),
            OrderItem::new("Apple Juice", ItemCategory::Juice),
        ]);
        ctx.repo.create(&order).await.unwrap();

        let fetched = ctx.repo.get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(fetched.items.len(), 2);
        assert_eq!(fetched.items[0].item_name, "Turkey Sandwich");
        assert_eq!(fetched.order_date, date());
        assert!(!fetched.finalized);

        let found = ctx
            .repo
            .find(patient.id, MealType::Lunch, date())
            .await
            .unwrap();
        assert_eq!(found.map(|o| o.id), Some(order.id));
    }

    #[tokio::test]
    async fn test_finalize_once() {
        let ctx = setup().await;
        let patient = ctx
            .patients
            .create(&NewPatient::new("Ada", "Lovelace", "East", "101"))
            .await
            .unwrap();

        let order = MealOrder::new(patient.id, MealType::Dinner, date(), "jdoe")
            .with_items(vec![OrderItem::new("Baked Chicken", ItemCategory::Entree)]);
        ctx.repo.create(&order).await.unwrap();

        assert!(ctx.repo.finalize(&snapshot_for(&order)).await.unwrap());
        assert!(!ctx.repo.finalize(&snapshot_for(&order)).await.unwrap());

        let finalized = ctx.repo.list_finalized(date()).await.unwrap();
        assert_eq!(finalized.len(), 1);
        assert_eq!(finalized[0].items[0].item_name, "Baked Chicken");

        // Finalized orders cannot be deleted, and the snapshot outlives the patient
        assert!(!ctx.repo.delete_open(order.id).await.unwrap());
        ctx.patients.delete(patient.id).await.unwrap();
        assert_eq!(ctx.repo.list_finalized(date()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_by_date_in_meal_order() {
        let ctx = setup().await;
        let patient = ctx
            .patients
            .create(&NewPatient::new("Ada", "Lovelace", "East", "101"))
            .await
            .unwrap();

        for meal in [MealType::Dinner, MealType::Breakfast, MealType::Lunch] {
            ctx.repo
                .create(&MealOrder::new(patient.id, meal, date(), "jdoe"))
                .await
                .unwrap();
        }
        let other_day = date().succ_opt().unwrap();
        ctx.repo
            .create(&MealOrder::new(patient.id, MealType::Lunch, other_day, "jdoe"))
            .await
            .unwrap();

        let orders = ctx.repo.list_by_date(date()).await.unwrap();
        let meals: Vec<MealType> = orders.iter().map(|o| o.meal).collect();
        assert_eq!(
            meals,
            vec![MealType::Breakfast, MealType::Lunch, MealType::Dinner]
        );
    }
}
