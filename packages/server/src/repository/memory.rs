use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DbErr;
use tokio::sync::RwLock;

use super::{ResultRepository, UserRepository};
use crate::models::result::{NewResult, ResultRecord};
use crate::models::user::{NewUser, UserRecord};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, UserRecord>,
    results: BTreeMap<i32, ResultRecord>,
    next_user_id: i32,
    next_result_id: i32,
}

/// In-process store backing both repositories. Clones share the same tables.
///
/// Selected with `database.url = "memory://"`; data is lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultRepository for MemoryStore {
    async fn find_all(&self) -> Result<Vec<ResultRecord>, DbErr> {
        let tables = self.tables.read().await;
        Ok(tables.results.values().cloned().collect())
    }

    async fn find_by_owner(&self, user_id: i32) -> Result<Vec<ResultRecord>, DbErr> {
        let tables = self.tables.read().await;
        Ok(tables
            .results
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<ResultRecord>, DbErr> {
        Ok(self.tables.read().await.results.get(&id).cloned())
    }

    async fn insert(&self, result: NewResult) -> Result<ResultRecord, DbErr> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&result.user_id) {
            return Err(DbErr::RecordNotInserted);
        }
        tables.next_result_id += 1;
        let record = ResultRecord {
            id: tables.next_result_id,
            value: result.value,
            time: result.time,
            user_id: result.user_id,
        };
        tables.results.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, result: ResultRecord) -> Result<ResultRecord, DbErr> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&result.user_id) {
            return Err(DbErr::RecordNotUpdated);
        }
        match tables.results.get_mut(&result.id) {
            Some(slot) => {
                *slot = result.clone();
                Ok(result)
            }
            None => Err(DbErr::RecordNotUpdated),
        }
    }

    async fn remove(&self, id: i32) -> Result<bool, DbErr> {
        Ok(self.tables.write().await.results.remove(&id).is_some())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DbErr> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<UserRecord>, DbErr> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<UserRecord>, DbErr> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id))
            .cloned()
            .collect())
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, DbErr> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(DbErr::Custom(format!("email '{}' already exists", user.email)));
        }
        tables.next_user_id += 1;
        let record = UserRecord {
            id: tables.next_user_id,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }
}
