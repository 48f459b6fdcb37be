use async_trait::async_trait;
use sea_orm::*;

use super::{ResultRepository, UserRepository};
use crate::entity::{result, user};
use crate::models::result::{NewResult, ResultRecord};
use crate::models::user::{NewUser, Role, UserRecord};

impl From<result::Model> for ResultRecord {
    fn from(model: result::Model) -> Self {
        Self {
            id: model.id,
            value: model.value,
            time: model.time,
            user_id: model.user_id,
        }
    }
}

impl TryFrom<user::Model> for UserRecord {
    type Error = DbErr;

    fn try_from(model: user::Model) -> Result<Self, Self::Error> {
        let role = model
            .role
            .parse::<Role>()
            .map_err(|e| DbErr::Type(format!("user {}: {e}", model.id)))?;
        Ok(Self {
            id: model.id,
            email: model.email,
            password_hash: model.password,
            role,
        })
    }
}

/// SeaORM-backed result repository.
#[derive(Clone)]
pub struct DbResultRepository {
    db: DatabaseConnection,
}

impl DbResultRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResultRepository for DbResultRepository {
    async fn find_all(&self) -> Result<Vec<ResultRecord>, DbErr> {
        let rows = result::Entity::find()
            .order_by_asc(result::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(ResultRecord::from).collect())
    }

    async fn find_by_owner(&self, user_id: i32) -> Result<Vec<ResultRecord>, DbErr> {
        let rows = result::Entity::find()
            .filter(result::Column::UserId.eq(user_id))
            .order_by_asc(result::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(ResultRecord::from).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<ResultRecord>, DbErr> {
        Ok(result::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(ResultRecord::from))
    }

    async fn insert(&self, new: NewResult) -> Result<ResultRecord, DbErr> {
        let model = result::ActiveModel {
            value: Set(new.value),
            time: Set(new.time),
            user_id: Set(new.user_id),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(model.into())
    }

    async fn update(&self, record: ResultRecord) -> Result<ResultRecord, DbErr> {
        let model = result::ActiveModel {
            id: Unchanged(record.id),
            value: Set(record.value),
            time: Set(record.time),
            user_id: Set(record.user_id),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(model.into())
    }

    async fn remove(&self, id: i32) -> Result<bool, DbErr> {
        let res = result::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }
}

/// SeaORM-backed user repository.
#[derive(Clone)]
pub struct DbUserRepository {
    db: DatabaseConnection,
}

impl DbUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for DbUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DbErr> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .map(UserRecord::try_from)
            .transpose()
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<UserRecord>, DbErr> {
        user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(UserRecord::try_from)
            .transpose()
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<UserRecord>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        user::Entity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(UserRecord::try_from)
            .collect()
    }

    async fn insert(&self, new: NewUser) -> Result<UserRecord, DbErr> {
        let model = user::ActiveModel {
            email: Set(new.email),
            password: Set(new.password_hash),
            role: Set(new.role.as_str().to_string()),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        UserRecord::try_from(model)
    }
}
