mod conversation;
mod message;
mod user;

pub use conversation::*;
pub use message::*;
pub use user::*;

use serde::{Deserialize, Serialize};

/// Offset pagination metadata. Pages are 1-based.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(page: i64, page_size: i64, total: i64) -> Self {
        Self {
            page,
            page_size,
            total,
            has_more: page * page_size < total,
        }
    }

    pub fn offset(page: i64, page_size: i64) -> i64 {
        (page - 1) * page_size
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Identity resolved by the auth collaborator before any messaging code runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
}
