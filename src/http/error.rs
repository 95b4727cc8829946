use std::collections::BTreeMap;

use rouille::Response;
use serde::Serialize;

use crate::{storage::error::StorageError, validation::error::ValidationError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unprocessable(ValidationError),
    Conflict(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<&'static str, Vec<String>>>,
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else if err.is_conflict() {
            ApiError::Conflict(err.to_string())
        } else {
            log::error!("storage failure: {err}");
            ApiError::Internal("internal server error".into())
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        log::debug!("rejected payload, invalid fields: {:?}", err.fields());
        ApiError::Unprocessable(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Unprocessable(_) => 422,
            ApiError::Conflict(_) => 409,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => ErrorBody {
                message: msg,
                errors: None,
            },
            ApiError::Unprocessable(err) => ErrorBody {
                message: "The given data was invalid.",
                errors: Some(err.by_field()),
            },
        };
        Response::json(&body).with_status_code(status)
    }
}
