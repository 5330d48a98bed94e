//! API request handlers

mod documents;
mod governance;
mod health;

pub use documents::*;
pub use governance::*;
pub use health::*;

use crate::error::{ApiError, ApiResult};
use spm_types::TenantId;
use std::fmt::Display;
use std::str::FromStr;

fn tenant(raw: &str) -> ApiResult<TenantId> {
    if raw.trim().is_empty() {
        return Err(ApiError::validation("tenant", "must not be empty"));
    }
    Ok(TenantId::new(raw))
}

fn parse_id<T>(field: &str, raw: &str) -> ApiResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e: T::Err| ApiError::validation(field, e.to_string()))
}
