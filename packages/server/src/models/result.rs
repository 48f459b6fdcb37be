use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::utils::time::{format_time, parse_time};

use super::user::UserRecord;

/// A stored result. The owner is referenced by id only.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub id: i32,
    pub value: f64,
    pub time: NaiveDateTime,
    pub user_id: i32,
}

/// Fields for a result about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewResult {
    pub value: f64,
    pub time: NaiveDateTime,
    pub user_id: i32,
}

/// Request body for creating or replacing a result.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct ResultRequest {
    /// Score or time value.
    #[schema(example = 1)]
    pub result: Option<f64>,
    /// Timestamp, e.g. `2023-12-12 10:10:10`.
    #[schema(example = "2023-12-12 10:10:10")]
    pub time: Option<String>,
    /// Email of the owning user. Defaults to the caller.
    #[schema(example = "alice@x.com")]
    pub user: Option<String>,
}

/// `result` and `time` are present; `time` is still unparsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultFields {
    pub value: f64,
    pub raw_time: String,
    pub owner_email: Option<String>,
}

impl ResultFields {
    pub fn parse_time(&self) -> Result<NaiveDateTime, AppError> {
        parse_time(&self.raw_time).ok_or_else(|| {
            AppError::Validation(format!(
                "The time field '{}' is not a valid timestamp",
                self.raw_time
            ))
        })
    }
}

/// `result` and `time` after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedResult {
    pub value: f64,
    pub time: NaiveDateTime,
    pub owner_email: Option<String>,
}

/// Presence checks only. The time is parsed later by [`ResultFields::parse_time`].
pub fn require_result_fields(payload: ResultRequest) -> Result<ResultFields, AppError> {
    let (Some(value), Some(raw_time)) = (payload.result, payload.time) else {
        return Err(AppError::Validation(
            "The result field or the time field are not passed".into(),
        ));
    };
    if !value.is_finite() {
        return Err(AppError::Validation("The result field must be a finite number".into()));
    }
    let owner_email = payload
        .user
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty());

    Ok(ResultFields {
        value,
        raw_time,
        owner_email,
    })
}

pub fn validate_result_request(payload: ResultRequest) -> Result<ValidatedResult, AppError> {
    let fields = require_result_fields(payload)?;
    let time = fields.parse_time()?;
    Ok(ValidatedResult {
        value: fields.value,
        time,
        owner_email: fields.owner_email,
    })
}

/// Owner reference embedded in a result representation.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct OwnerSummary {
    #[schema(example = 2)]
    pub id: i32,
    #[schema(example = "alice@x.com")]
    pub email: String,
}

/// Public representation of a result.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ResultResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = 1)]
    pub result: f64,
    #[schema(example = "2023-12-12 10:10:10")]
    pub time: String,
    pub user: OwnerSummary,
}

impl ResultResponse {
    pub fn new(record: &ResultRecord, owner: &UserRecord) -> Self {
        Self {
            id: record.id,
            result: record.value,
            time: format_time(&record.time),
            user: OwnerSummary {
                id: owner.id,
                email: owner.email.clone(),
            },
        }
    }
}

/// Single-result body: `{"result": {...}}`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ResultEnvelope {
    pub result: ResultResponse,
}

/// List body: `{"results": [...]}`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ResultListResponse {
    pub results: Vec<ResultResponse>,
}
