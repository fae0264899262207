use std::sync::Arc;

use futures::stream::BoxStream;
use uuid::Uuid;

use crate::db::ItemRepository;
use crate::error::{ServiceError, ServiceResult};
use crate::executor::WriteExecutor;
use crate::live::{observe, ChangeNotifier, Table};
use crate::models::{DefaultMenu, Item, ItemCategory, ItemFilter};

#[derive(Clone)]
pub struct ItemService {
    repo: ItemRepository,
    executor: Arc<WriteExecutor>,
    notifier: ChangeNotifier,
}

fn normalize(mut item: Item) -> ServiceResult<Item> {
    item.name = item.name.trim().to_string();
    item.serving_size = item
        .serving_size
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if item.name.is_empty() {
        return Err(ServiceError::invalid("Item name is required"));
    }
    Ok(item)
}

fn item_exists(item: &Item) -> ServiceError {
    ServiceError::ItemExists {
        name: item.name.clone(),
        category: item.category.to_string(),
    }
}

async fn ensure_unique(repo: &ItemRepository, item: &Item) -> ServiceResult<()> {
    if let Some(existing) = repo.find(&item.name, item.category).await? {
        if existing.id != item.id {
            return Err(item_exists(item));
        }
    }
    Ok(())
}

/// The name/category index catches a concurrent write the lookup missed.
fn name_conflict(e: sqlx::Error, item: &Item) -> ServiceError {
    let e = ServiceError::from(e);
    if e.is_unique_violation() {
        item_exists(item)
    } else {
        e
    }
}

impl ItemService {
    pub fn new(repo: ItemRepository, executor: Arc<WriteExecutor>, notifier: ChangeNotifier) -> Self {
        Self {
            repo,
            executor,
            notifier,
        }
    }

    pub async fn add_item(&self, item: Item) -> ServiceResult<Item> {
        let repo = self.repo.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                let item = normalize(item)?;
                ensure_unique(&repo, &item).await?;
                let created = repo
                    .create(&item)
                    .await
                    .map_err(|e| name_conflict(e, &item))?;
                notifier.notify(Table::Items);
                tracing::info!(item = %created.name, category = %created.category, "item added");
                Ok(created)
            })
            .wait()
            .await
    }

    pub async fn update_item(&self, item: Item) -> ServiceResult<Item> {
        let repo = self.repo.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                let item = normalize(item)?;
                if repo.get_by_id(item.id).await?.is_none() {
                    return Err(ServiceError::ItemNotFound(item.id.to_string()));
                }
                ensure_unique(&repo, &item).await?;
                let updated = repo
                    .update(&item)
                    .await
                    .map_err(|e| name_conflict(e, &item))?;
                notifier.notify(Table::Items);
                tracing::info!(item = %updated.name, "item updated");
                Ok(updated)
            })
            .wait()
            .await
    }

    pub async fn delete_item(&self, id: Uuid) -> ServiceResult<()> {
        let repo = self.repo.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                if !repo.delete(id).await? {
                    return Err(ServiceError::ItemNotFound(id.to_string()));
                }
                notifier.notify(Table::Items);
                tracing::info!(item = %id, "item deleted");
                Ok(())
            })
            .wait()
            .await
    }

    /// Add every default-menu entry missing from the catalog. Returns how
    /// many were added.
    pub async fn seed_defaults(&self) -> ServiceResult<usize> {
        let repo = self.repo.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                let mut added = 0;
                for (name, category, meal, ada) in DefaultMenu::all_entries() {
                    if repo.find(name, category).await?.is_some() {
                        continue;
                    }
                    let mut item = Item::new(name, category);
                    item.ada_friendly = ada;
                    // Juices and drinks are offered at every meal
                    if !matches!(category, ItemCategory::Juice | ItemCategory::Drink) {
                        item.meal_type = meal;
                    }
                    repo.create(&item).await?;
                    added += 1;
                }
                if added > 0 {
                    notifier.notify(Table::Items);
                }
                tracing::info!(added, "default menu items seeded");
                Ok(added)
            })
            .wait()
            .await
    }

    pub async fn get_item(&self, id: Uuid) -> ServiceResult<Item> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::ItemNotFound(id.to_string()))
    }

    /// First catalog entry with this name, in any category.
    pub async fn find_by_name(&self, name: &str) -> ServiceResult<Item> {
        self.repo
            .find_by_name(name)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::ItemNotFound(name.trim().to_string()))
    }

    pub async fn list_items(&self, filter: &ItemFilter) -> ServiceResult<Vec<Item>> {
        Ok(self.repo.list(filter).await?)
    }

    pub fn observe_items(&self, filter: ItemFilter) -> BoxStream<'static, ServiceResult<Vec<Item>>> {
        let repo = self.repo.clone();
        observe(&self.notifier, Table::Items, move || {
            let repo = repo.clone();
            let filter = filter.clone();
            async move { Ok(repo.list(&filter).await?) }
        })
    }
}
