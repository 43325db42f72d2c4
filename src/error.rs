use std::collections::BTreeMap;
use std::error::Error as ErrorTrait;

use rocket::{
  http::Status,
  request::Request,
  response::{self, Responder},
  serde::json::{json, Json, Value},
  warn,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error(transparent)]
  IOError(#[from] std::io::Error),
  #[error(transparent)]
  DatabaseError(sqlx::Error),
  #[error(transparent)]
  Migration(#[from] sqlx::migrate::MigrateError),
  #[error("Invalid {field}: {message}")]
  Validation { field: String, message: String },
  #[error(transparent)]
  ValidationError(#[from] validator::ValidationErrors),
  #[error(transparent)]
  Config(#[from] rocket::figment::Error),
  #[error(transparent)]
  Template(#[from] tera::Error),
  #[error(transparent)]
  JsonSerde(#[from] serde_json::Error),
  #[error(transparent)]
  UreqError(#[from] Box<ureq::Error>),
  #[error("{0}")]
  Gateway(String),
  #[error("Password hashing failed: {0}")]
  PasswordHash(String),
  #[error("{0}")]
  NotFound(String),
  #[error("Cannot move donation from {from} to {to}")]
  InvalidTransition { from: String, to: String },
  #[error("Authentication credentials were not provided or are invalid")]
  Unauthorized,
  #[error("You do not have permission to perform this action")]
  Forbidden,
  #[error("{0}")]
  Aggregate(&'static str),
}

impl From<ureq::Error> for Error {
  fn from(err: ureq::Error) -> Error {
    Error::UreqError(Box::new(err))
  }
}

impl From<sqlx::Error> for Error {
  fn from(err: sqlx::Error) -> Error {
    match err {
      sqlx::Error::Database(ref inner_error) => match inner_error.code().as_deref() {
        Some("23505") => Error::validation(
          "uniqueness",
          inner_error.constraint().unwrap_or("record already exists"),
        ),
        Some("23503") => Error::validation("nonexistent", "references a nonexistent resource"),
        _ => Error::DatabaseError(err),
      },
      _ => Error::DatabaseError(err),
    }
  }
}

impl Error {
  pub fn validation(field: &str, message: &str) -> Error {
    Error::Validation {
      field: field.to_string(),
      message: message.to_string(),
    }
  }

  pub fn not_found(what: &str) -> Error {
    Error::NotFound(format!("{} not found", what))
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, Error::NotFound(_) | Error::DatabaseError(sqlx::Error::RowNotFound))
  }

  /// Per-field messages, shaped like `{"email": ["Enter a valid email address."]}`.
  pub fn field_errors(&self) -> Option<BTreeMap<String, Vec<String>>> {
    match self {
      Error::Validation { field, message } => {
        Some(BTreeMap::from([(field.clone(), vec![message.clone()])]))
      }
      Error::ValidationError(errors) => Some(
        errors
          .field_errors()
          .into_iter()
          .map(|(field, errs)| {
            let messages = errs
              .iter()
              .map(|e| match e.message {
                Some(ref m) => m.to_string(),
                None => format!("Invalid value ({})", e.code),
              })
              .collect();
            (field.to_string(), messages)
          })
          .collect(),
      ),
      _ => None,
    }
  }
}

impl<'r> Responder<'r, 'static> for Error {
  fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
    let response: (Status, Json<Value>) = match self {
      Error::ValidationError(_) | Error::Validation { .. } => (
        Status::BadRequest,
        Json(json!(self.field_errors().unwrap_or_default())),
      ),
      Error::InvalidTransition { .. } | Error::Gateway(_) => {
        (Status::BadRequest, Json(json![{ "error": self.to_string() }]))
      }
      Error::NotFound(ref message) => (Status::NotFound, Json(json![{ "error": message }])),
      Error::DatabaseError(sqlx::Error::RowNotFound) => {
        (Status::NotFound, Json(json![{ "error": "Not found" }]))
      }
      Error::Unauthorized => (Status::Unauthorized, Json(json![{ "error": self.to_string() }])),
      Error::Forbidden => (Status::Forbidden, Json(json![{ "error": self.to_string() }])),
      Error::Aggregate(message) => {
        (Status::InternalServerError, Json(json![{ "error": message }]))
      }
      _ => {
        warn!(
          "A wild error appeared: {:?}\n\n{:?}\n",
          &self,
          &self.source()
        );
        (
          Status::InternalServerError,
          Json(json![{ "error": "Unexpected Error" }]),
        )
      }
    };

    response.respond_to(request)
  }
}

pub type Result<T> = std::result::Result<T, Error>;
