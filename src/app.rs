use std::path::Path;
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::db::{init_db, ItemRepository, OrderRepository, PatientRepository, UserRepository};
use crate::error::ServiceResult;
use crate::executor::WriteExecutor;
use crate::live::ChangeNotifier;
use crate::services::{ItemService, OrderService, PatientService, UserService};

/// Everything a screen or command needs, wired to one database.
pub struct Dietary {
    pub users: UserService,
    pub patients: PatientService,
    pub items: ItemService,
    pub orders: OrderService,
    notifier: ChangeNotifier,
    executor: Arc<WriteExecutor>,
    pool: SqlitePool,
}

impl Dietary {
    pub async fn open(database_path: &Path, write_workers: usize) -> ServiceResult<Self> {
        let pool = init_db(database_path).await?;
        Ok(Self::from_pool(pool, write_workers))
    }

    /// Must be called from within a tokio runtime; the write workers are
    /// spawned immediately.
    pub fn from_pool(pool: SqlitePool, write_workers: usize) -> Self {
        let executor = Arc::new(WriteExecutor::new(write_workers));
        let notifier = ChangeNotifier::new();

        let user_repo = UserRepository::new(pool.clone());
        let patient_repo = PatientRepository::new(pool.clone());
        let item_repo = ItemRepository::new(pool.clone());
        let order_repo = OrderRepository::new(pool.clone());

        Self {
            users: UserService::new(user_repo, Arc::clone(&executor), notifier.clone()),
            patients: PatientService::new(
                patient_repo.clone(),
                item_repo.clone(),
                Arc::clone(&executor),
                notifier.clone(),
            ),
            items: ItemService::new(item_repo.clone(), Arc::clone(&executor), notifier.clone()),
            orders: OrderService::new(
                order_repo,
                patient_repo,
                item_repo,
                Arc::clone(&executor),
                notifier.clone(),
            ),
            notifier,
            executor,
            pool,
        }
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    pub fn executor(&self) -> &WriteExecutor {
        &self.executor
    }

    /// Drain pending writes and close the pool.
    pub async fn close(self) {
        let Dietary {
            users,
            patients,
            items,
            orders,
            executor,
            pool,
            ..
        } = self;
        drop((users, patients, items, orders));

        match Arc::try_unwrap(executor) {
            Ok(executor) => executor.shutdown().await,
            Err(_) => tracing::warn!("write executor still shared at close"),
        }
        pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPatient;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_write_close_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dietary.db");

        let dietary = Dietary::open(&path, 4).await.unwrap();
        assert_eq!(dietary.executor().worker_count(), 4);
        dietary
            .patients
            .add_patient(NewPatient::new("Ada", "Lovelace", "East", "101"))
            .await
            .unwrap();
        dietary.close().await;

        let dietary = Dietary::open(&path, 1).await.unwrap();
        assert_eq!(dietary.patients.list_active().await.unwrap().len(), 1);
        dietary.close().await;
    }
}
