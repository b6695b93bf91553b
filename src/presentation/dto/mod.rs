pub mod mutation_dto;

pub use mutation_dto::{ActionRequest, MutationOutcomeDto};

use crate::shared::error::MutationError;
use serde::{Deserialize, Serialize};

/// Envelope returned to consumers; raw transport errors never leak through it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub error_code: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_code: None,
        }
    }

    pub fn from_mutation_error(error: MutationError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.user_message()),
            error_code: Some(error.code().to_string()),
        }
    }

    pub fn from_result(result: Result<T, MutationError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => Self::from_mutation_error(err),
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}
