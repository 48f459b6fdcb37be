use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::result::{
    NewResult, ResultEnvelope, ResultListResponse, ResultRecord, ResultRequest, ResultResponse,
    require_result_fields, validate_result_request,
};
use crate::models::user::UserRecord;
use crate::repository::{ResultRepository, UserRepository};
use crate::utils::etag;

/// Outcome of a read guarded by `If-None-Match`.
#[derive(Debug)]
pub enum Conditional<T> {
    NotModified,
    Fresh { etag: String, body: T },
}

/// A body together with its entity tag.
#[derive(Debug)]
pub struct Tagged<T> {
    pub etag: String,
    pub body: T,
}

/// Which route an `OPTIONS` request addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Collection,
    Item,
}

impl Scope {
    /// Value of the `Allow` header for this route.
    pub fn allowed_methods(self) -> &'static str {
        match self {
            Scope::Collection => "GET,POST,OPTIONS",
            Scope::Item => "GET,PUT,DELETE,OPTIONS",
        }
    }
}

/// Authorization, validation and conditional-request rules for results.
///
/// The caller is passed into every operation; the controller holds no
/// per-request state.
#[derive(Clone)]
pub struct ResultsController {
    results: Arc<dyn ResultRepository>,
    users: Arc<dyn UserRepository>,
}

impl ResultsController {
    pub fn new(results: Arc<dyn ResultRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { results, users }
    }

    /// The caller's results, or every result for admins.
    ///
    /// The tag is computed over the final authorized set.
    pub async fn list(
        &self,
        caller: &AuthUser,
        if_none_match: Option<&str>,
    ) -> Result<Conditional<ResultListResponse>, AppError> {
        let records = if caller.is_admin() {
            self.results.find_all().await?
        } else {
            self.results.find_by_owner(caller.user_id).await?
        };
        if records.is_empty() {
            return Err(AppError::NotFound("Results not found".into()));
        }

        let body = ResultListResponse {
            results: self.represent_many(&records).await?,
        };
        conditional(body, if_none_match)
    }

    /// Checks run in order: fields present, owner allowed, owner exists, time parses.
    pub async fn create(
        &self,
        caller: &AuthUser,
        payload: ResultRequest,
    ) -> Result<ResultEnvelope, AppError> {
        let fields = require_result_fields(payload)?;

        let owner_email = fields
            .owner_email
            .clone()
            .unwrap_or_else(|| caller.email.clone());
        if !caller.is_admin() && owner_email != caller.email {
            return Err(AppError::PermissionDenied);
        }
        let owner = self.owner_by_email(&owner_email).await?;
        let time = fields.parse_time()?;

        let record = self
            .results
            .insert(NewResult {
                value: fields.value,
                time,
                user_id: owner.id,
            })
            .await?;
        info!(result_id = record.id, owner_id = owner.id, "Result created");

        Ok(ResultEnvelope {
            result: ResultResponse::new(&record, &owner),
        })
    }

    pub async fn get(
        &self,
        caller: &AuthUser,
        id: i32,
        if_none_match: Option<&str>,
    ) -> Result<Conditional<ResultEnvelope>, AppError> {
        let record = self.find_authorized(caller, id).await?;
        let body = self.represent_one(&record).await?;
        conditional(body, if_none_match)
    }

    /// Replace `result`, `time` and optionally the owner of a result.
    ///
    /// `if_match` must name the tag of the current representation.
    pub async fn update(
        &self,
        caller: &AuthUser,
        id: i32,
        payload: ResultRequest,
        if_match: Option<&str>,
    ) -> Result<Tagged<ResultEnvelope>, AppError> {
        let record = self.find_authorized(caller, id).await?;
        let valid = validate_result_request(payload)?;

        let user_id = match valid.owner_email {
            Some(email) => {
                let owner = self.users.find_by_email(&email).await?.ok_or_else(|| {
                    AppError::NotFound(format!("User with email {email} not found"))
                })?;
                caller.require_owner_or_admin(owner.id)?;
                owner.id
            }
            None => record.user_id,
        };

        let current = etag::compute(&self.represent_one(&record).await?)?;
        if !if_match.is_some_and(|header| etag::header_matches(header, &current, false)) {
            debug!(result_id = id, "If-Match missing or stale");
            return Err(AppError::PreconditionFailed);
        }

        let updated = self
            .results
            .update(ResultRecord {
                id: record.id,
                value: valid.value,
                time: valid.time,
                user_id,
            })
            .await?;
        info!(result_id = id, owner_id = user_id, "Result updated");

        let body = self.represent_one(&updated).await?;
        Ok(Tagged {
            etag: etag::compute(&body)?,
            body,
        })
    }

    pub async fn delete(&self, caller: &AuthUser, id: i32) -> Result<(), AppError> {
        self.find_authorized(caller, id).await?;
        if !self.results.remove(id).await? {
            return Err(not_found(id));
        }
        info!(result_id = id, "Result deleted");
        Ok(())
    }

    /// Existence first, then ownership.
    async fn find_authorized(&self, caller: &AuthUser, id: i32) -> Result<ResultRecord, AppError> {
        let record = self
            .results
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        caller.require_owner_or_admin(record.user_id)?;
        Ok(record)
    }

    async fn owner_by_email(&self, email: &str) -> Result<UserRecord, AppError> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {email} not found")))
    }

    async fn represent_one(&self, record: &ResultRecord) -> Result<ResultEnvelope, AppError> {
        let owner = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or_else(|| dangling_owner(record))?;
        Ok(ResultEnvelope {
            result: ResultResponse::new(record, &owner),
        })
    }

    async fn represent_many(&self, records: &[ResultRecord]) -> Result<Vec<ResultResponse>, AppError> {
        let mut owner_ids: Vec<i32> = records.iter().map(|r| r.user_id).collect();
        owner_ids.sort_unstable();
        owner_ids.dedup();

        let owners: HashMap<i32, UserRecord> = self
            .users
            .find_by_ids(&owner_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        records
            .iter()
            .map(|record| {
                owners
                    .get(&record.user_id)
                    .map(|owner| ResultResponse::new(record, owner))
                    .ok_or_else(|| dangling_owner(record))
            })
            .collect()
    }
}

fn conditional<T: serde::Serialize>(
    body: T,
    if_none_match: Option<&str>,
) -> Result<Conditional<T>, AppError> {
    let etag = etag::compute(&body)?;
    if if_none_match.is_some_and(|header| etag::header_matches(header, &etag, true)) {
        return Ok(Conditional::NotModified);
    }
    Ok(Conditional::Fresh { etag, body })
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Result with id #{id} not found"))
}

fn dangling_owner(record: &ResultRecord) -> AppError {
    AppError::Internal(format!(
        "result {} references missing user {}",
        record.id, record.user_id
    ))
}
