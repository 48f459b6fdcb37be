//! Persistence seams consumed by the results controller.

pub mod database;
pub mod memory;

use async_trait::async_trait;
use sea_orm::DbErr;

use crate::models::result::{NewResult, ResultRecord};
use crate::models::user::{NewUser, UserRecord};

pub use database::{DbResultRepository, DbUserRepository};
pub use memory::MemoryStore;

#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Every result, ordered by id.
    async fn find_all(&self) -> Result<Vec<ResultRecord>, DbErr>;

    /// Results owned by `user_id`, ordered by id.
    async fn find_by_owner(&self, user_id: i32) -> Result<Vec<ResultRecord>, DbErr>;

    async fn find_by_id(&self, id: i32) -> Result<Option<ResultRecord>, DbErr>;

    /// Persist a new result and return it with its assigned id.
    async fn insert(&self, result: NewResult) -> Result<ResultRecord, DbErr>;

    /// Write back every field of an existing result.
    async fn update(&self, result: ResultRecord) -> Result<ResultRecord, DbErr>;

    /// Delete a result. Returns `false` if it did not exist.
    async fn remove(&self, id: i32) -> Result<bool, DbErr>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DbErr>;

    async fn find_by_id(&self, id: i32) -> Result<Option<UserRecord>, DbErr>;

    /// Users matching any of `ids`. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<UserRecord>, DbErr>;

    async fn insert(&self, user: NewUser) -> Result<UserRecord, DbErr>;
}
