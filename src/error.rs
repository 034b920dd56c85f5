// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

use crate::http::superhero_api::ApiError;
use sqlx::error::Error as SqlxError;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
#[allow(unused)] // these are debug printed frequently
pub enum HerodexError {
    Message(String),
    Api(ApiError),
    Sqlite(SqlxError),
    Json(serde_json::Error),
}

impl Display for HerodexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HerodexError::Message(message) => f.write_str(message.as_str()),
            HerodexError::Api(e) => write!(f, "{e}"),
            HerodexError::Sqlite(_) => write!(f, "DB error"),
            HerodexError::Json(_) => write!(f, "JSON encoding error"),
        }
    }
}

impl From<ApiError> for HerodexError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

impl From<SqlxError> for HerodexError {
    fn from(e: SqlxError) -> Self {
        Self::Sqlite(e)
    }
}

impl From<serde_json::Error> for HerodexError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl std::error::Error for HerodexError {}

impl HerodexError {
    /// `message` is a message that is safe to display to a user
    pub fn new<T: Into<String>>(message: T) -> Self {
        Self::Message(message.into())
    }

    /// `message` is a message that is safe to display to a user
    pub fn boxed<T: Into<String>>(message: T) -> Box<Self> {
        Box::new(Self::new(message))
    }
}
