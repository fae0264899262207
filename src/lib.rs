//! Hospital dietary management: staff accounts, patients and their meal
//! selections, the item catalog, and kitchen orders, stored in SQLite.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod executor;
pub mod live;
pub mod models;
pub mod password;
pub mod services;
pub mod views;

pub use app::Dietary;
pub use error::{ServiceError, ServiceResult};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::db::test_support::{test_db, TestDb};
    use crate::db::ItemRepository;
    use crate::Dietary;

    pub struct TestApp {
        pub dietary: Dietary,
        _db: TestDb,
    }

    impl TestApp {
        pub fn item_repo(&self) -> ItemRepository {
            ItemRepository::new(self._db.pool.clone())
        }
    }

    pub async fn test_app() -> TestApp {
        let db = test_db().await;
        TestApp {
            dietary: Dietary::from_pool(db.pool.clone(), 4),
            _db: db,
        }
    }
}
