use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{decode_error, parse_id, parse_timestamp};
use crate::models::{Item, ItemCategory, ItemFilter, MealType};

#[derive(Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: String,
    name: String,
    category: String,
    ada_friendly: bool,
    meal_type: Option<String>,
    serving_size: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ItemRow> for Item {
    type Error = sqlx::Error;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let category: ItemCategory = row.category.parse().map_err(decode_error)?;
        let meal_type = row
            .meal_type
            .as_deref()
            .map(str::parse::<MealType>)
            .transpose()
            .map_err(decode_error)?;

        Ok(Item {
            id: parse_id(&row.id)?,
            name: row.name,
            category,
            ada_friendly: row.ada_friendly,
            meal_type,
            serving_size: row.serving_size,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        })
    }
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, item: &Item) -> Result<Item, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO items (id, name, category, ada_friendly, meal_type, serving_size, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.id.to_string())
        .bind(&item.name)
        .bind(item.category.as_str())
        .bind(item.ada_friendly)
        .bind(item.meal_type.map(|m| m.as_str()))
        .bind(&item.serving_size)
        .bind(item.created_at.to_rfc3339())
        .bind(item.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.get_by_id(item.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Item>, sqlx::Error> {
        let row: Option<ItemRow> = sqlx::query_as("SELECT * FROM items WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Item::try_from).transpose()
    }

    /// Items whose name matches case-insensitively, in any category.
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<Item>, sqlx::Error> {
        let rows: Vec<ItemRow> =
            sqlx::query_as("SELECT * FROM items WHERE LOWER(name) = LOWER(?) ORDER BY category")
                .bind(name.trim())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Item::try_from).collect()
    }

    pub async fn find(
        &self,
        name: &str,
        category: ItemCategory,
    ) -> Result<Option<Item>, sqlx::Error> {
        let row: Option<ItemRow> =
            sqlx::query_as("SELECT * FROM items WHERE LOWER(name) = LOWER(?) AND category = ?")
                .bind(name.trim())
                .bind(category.as_str())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Item::try_from).transpose()
    }

    pub async fn list(&self, filter: &ItemFilter) -> Result<Vec<Item>, sqlx::Error> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM items WHERE 1 = 1");

        if let Some(category) = filter.category {
            query.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(meal) = filter.meal_type {
            query
                .push(" AND (meal_type IS NULL OR meal_type = ")
                .push_bind(meal.as_str())
                .push(")");
        }
        if filter.ada_only {
            query.push(" AND ada_friendly = 1");
        }
        query.push(" ORDER BY category, name COLLATE NOCASE");

        let rows = query
            .build_query_as::<ItemRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Item::try_from).collect()
    }

    pub async fn update(&self, item: &Item) -> Result<Item, sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE items
            SET name = ?, category = ?, ada_friendly = ?, meal_type = ?, serving_size = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&item.name)
        .bind(item.category.as_str())
        .bind(item.ada_friendly)
        .bind(item.meal_type.map(|m| m.as_str()))
        .bind(&item.serving_size)
        .bind(Utc::now().to_rfc3339())
        .bind(item.id.to_string())
        .execute(&self.pool)
        .await?;

        self.get_by_id(item.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{test_db, TestDb};

    struct TestContext {
        repo: ItemRepository,
        _db: TestDb,
    }

    async fn setup() -> TestContext {
        let db = test_db().await;
        TestContext {
            repo: ItemRepository::new(db.pool.clone()),
            _db: db,
        }
    }

    async fn seed(repo: &ItemRepository) {
        let items = [
            Item::new("Oatmeal", ItemCategory::Cereal)
                .with_meal_type(MealType::Breakfast)
                .ada_friendly(),
            Item::new("Pancakes", ItemCategory::Entree).with_meal_type(MealType::Breakfast),
            Item::new("Baked Chicken", ItemCategory::Entree)
                .with_meal_type(MealType::Dinner)
                .ada_friendly(),
            Item::new("Apple Juice", ItemCategory::Juice).with_serving_size("4 oz"),
            Item::new("Tomato Juice", ItemCategory::Juice).ada_friendly(),
        ];
        for item in &items {
            repo.create(item).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_create_and_get_item() {
        let ctx = setup().await;

        let item = Item::new("Apple Juice", ItemCategory::Juice).with_serving_size("4 oz");
        let created = ctx.repo.create(&item).await.unwrap();
        assert_eq!(created.name, "Apple Juice");
        assert_eq!(created.serving_size.as_deref(), Some("4 oz"));
        assert_eq!(created.meal_type, None);

        let fetched = ctx.repo.get_by_id(item.id).await.unwrap().unwrap();
        assert_eq!(fetched.category, ItemCategory::Juice);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let ctx = setup().await;
        seed(&ctx.repo).await;

        let all = ctx.repo.list(&ItemFilter::default()).await.unwrap();
        assert_eq!(all.len(), 5);

        let breakfast = ctx
            .repo
            .list(&ItemFilter {
                meal_type: Some(MealType::Breakfast),
                ..Default::default()
            })
            .await
            .unwrap();
        let names: Vec<&str> = breakfast.iter().map(|i| i.name.as_str()).collect();
        // Juices have no meal type, so they show up at every meal
        assert_eq!(
            names,
            vec!["Oatmeal", "Pancakes", "Apple Juice", "Tomato Juice"]
        );

        let ada_juices = ctx
            .repo
            .list(&ItemFilter {
                category: Some(ItemCategory::Juice),
                meal_type: None,
                ada_only: true,
            })
            .await
            .unwrap();
        assert_eq!(ada_juices.len(), 1);
        assert_eq!(ada_juices[0].name, "Tomato Juice");
    }

    #[tokio::test]
    async fn test_find_by_name_case_insensitive() {
        let ctx = setup().await;
        seed(&ctx.repo).await;

        let found = ctx.repo.find_by_name("apple juice").await.unwrap();
        assert_eq!(found.len(), 1);

        assert!(ctx
            .repo
            .find("OATMEAL", ItemCategory::Cereal)
            .await
            .unwrap()
            .is_some());
        assert!(ctx
            .repo
            .find("Oatmeal", ItemCategory::Entree)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let ctx = setup().await;

        let created = ctx
            .repo
            .create(&Item::new("Cake", ItemCategory::Dessert))
            .await
            .unwrap();

        let mut edited = created.clone();
        edited.name = "Sugar-Free Cake".into();
        edited.ada_friendly = true;
        let updated = ctx.repo.update(&edited).await.unwrap();
        assert_eq!(updated.name, "Sugar-Free Cake");
        assert!(updated.ada_friendly);

        assert!(ctx.repo.delete(created.id).await.unwrap());
        assert!(ctx.repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
