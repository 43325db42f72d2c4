use rocket::{
  self,
  catch,
  data::{self, Data, FromData, ToByteUnit},
  http::Status,
  request::{FromRequest, Outcome, Request},
  response::status,
  serde::json::{self, json, Json, Value},
  info,
  warn,
};
use crate::error::*;
use crate::models::*;

pub type JsonResult<T> = Result<Json<T>>;
pub type CreatedResult<T> = Result<status::Custom<Json<T>>>;

/// A JSON body whose decoding failure is still ours to report.
pub type Submission<'r, T> = std::result::Result<Json<T>, json::Error<'r>>;

pub mod organization;
pub mod programs;
pub mod donations;
pub mod news;
pub mod contact;
pub mod users;

pub fn created<T>(body: T) -> status::Custom<Json<T>> {
  status::Custom(Status::Created, Json(body))
}

/// Unwraps a submitted form, turning serde's complaints into field errors.
pub fn accept<T>(submission: Submission<'_, T>) -> Result<T> {
  match submission {
    Ok(Json(form)) => Ok(form),
    Err(json::Error::Io(e)) => Err(Error::IOError(e)),
    Err(json::Error::Parse(_, e)) => Err(body_error(&e)),
  }
}

fn body_error(error: &serde_json::Error) -> Error {
  let message = error.to_string();
  let missing = message
    .strip_prefix("missing field `")
    .and_then(|rest| rest.split_once('`'))
    .map(|(field, _)| field.to_string());

  match missing {
    Some(field) => Error::validation(&field, "This field is required."),
    None => Error::validation("non_field_errors", &message),
  }
}

/// Page-data endpoints answer with a fixed message and keep the cause in the log.
pub fn aggregate<T>(message: &'static str, result: Result<T>) -> Result<T> {
  result.map_err(|e| {
    warn!("{}: {:?}", message, e);
    Error::Aggregate(message)
  })
}

pub struct Session(pub User);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Session {
  type Error = Error;

  async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
    let Some(site) = req.rocket().state::<Site>() else {
      return Outcome::Error((Status::InternalServerError, Error::Aggregate("Site not configured")));
    };

    let Some(token) = req.headers().get_one("Authorization").and_then(token_from_header) else {
      return Outcome::Error((Status::Unauthorized, Error::Unauthorized));
    };

    match site.auth_token().user(token).await {
      Ok(user) => Outcome::Success(Session(user)),
      Err(Error::Unauthorized) => Outcome::Error((Status::Unauthorized, Error::Unauthorized)),
      Err(e) => {
        warn!("Could not look up session: {:?}", e);
        Outcome::Error((Status::InternalServerError, e))
      }
    }
  }
}

pub struct AdminSession(pub User);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminSession {
  type Error = Error;

  async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
    match Session::from_request(req).await {
      Outcome::Success(Session(user)) if user.is_admin() => Outcome::Success(AdminSession(user)),
      Outcome::Success(_) => Outcome::Error((Status::Forbidden, Error::Forbidden)),
      Outcome::Error(e) => Outcome::Error(e),
      Outcome::Forward(s) => Outcome::Forward(s),
    }
  }
}

/// A Stripe event whose signature checked out against the webhook secret.
pub struct StripeWebhook {
  pub event: stripe::Event,
}

#[rocket::async_trait]
impl<'r> FromData<'r> for StripeWebhook {
  type Error = card::WebhookError;

  async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> data::Outcome<'r, Self> {
    use rocket::data::Outcome;

    let Some(site) = req.rocket().state::<Site>() else {
      return Outcome::Error((Status::InternalServerError, card::WebhookError::InvalidSignature));
    };

    let secret = &site.settings.stripe.webhook_secret;
    let verified = match req.headers().get_one("stripe-signature") {
      None => Err(card::WebhookError::InvalidSignature),
      Some(signature) => match data.open(512.kibibytes()).into_string().await {
        Ok(payload) if payload.is_complete() => {
          stripe::Webhook::construct_event(&payload.into_inner(), signature, secret).map_err(card::WebhookError::from)
        }
        _ => Err(card::WebhookError::InvalidPayload),
      },
    };

    match verified {
      Ok(event) => Outcome::Success(StripeWebhook { event }),
      Err(e) => {
        warn!("Rejected Stripe webhook: {}", e.message());
        req.local_cache(|| Some(e));
        Outcome::Error((Status::BadRequest, e))
      }
    }
  }
}

/// Webhook rejections explain themselves; other 400s stay generic.
#[catch(400)]
pub fn bad_request(req: &Request) -> Json<Value> {
  match req.local_cache(|| None::<card::WebhookError>) {
    Some(e) => Json(json!({ "error": e.message() })),
    None => Json(json!({ "error": "Bad request" })),
  }
}

#[catch(401)]
pub fn unauthorized() -> Json<Value> {
  Json(json!({ "error": Error::Unauthorized.to_string() }))
}

#[catch(403)]
pub fn forbidden() -> Json<Value> {
  Json(json!({ "error": Error::Forbidden.to_string() }))
}

#[catch(404)]
pub fn not_found() -> Json<Value> {
  Json(json!({ "error": "Not found" }))
}

#[catch(422)]
pub fn unprocessable() -> (Status, Json<Value>) {
  (Status::BadRequest, Json(json!({ "non_field_errors": ["Invalid request body"] })))
}

#[catch(500)]
pub fn internal_error() -> Json<Value> {
  Json(json!({ "error": "Unexpected Error" }))
}

#[cfg(test)]
mod test {
  use super::*;

  #[derive(Debug, serde::Deserialize)]
  #[allow(dead_code)]
  struct Form {
    email: String,
    amount: i32,
  }

  #[test]
  fn missing_fields_become_required_errors() {
    let error = serde_json::from_str::<Form>(r#"{"amount": 3}"#).unwrap_err();
    let fields = body_error(&error).field_errors().unwrap();
    assert_eq!(fields.get("email"), Some(&vec!["This field is required.".to_string()]));
  }

  #[test]
  fn other_decoding_errors_are_not_tied_to_a_field() {
    let error = serde_json::from_str::<Form>(r#"{"email": "a@b.co", "amount": "lots"}"#).unwrap_err();
    assert!(body_error(&error).field_errors().unwrap().contains_key("non_field_errors"));
  }
}
