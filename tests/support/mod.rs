#![allow(dead_code)]

use rocket::{
  figment::{
    providers::{Format, Toml},
    Figment,
  },
  http::{ContentType, Header, Status},
  local::asynchronous::Client,
};
pub use serde::{de::DeserializeOwned, Deserialize};
pub use serde_json::{json, Value};

pub use galvanic_assert::{
  self,
  matchers::{collection::*, *},
  *,
};

pub use keefa_api::models::*;
use sqlx::postgres::PgPoolOptions;
use std::future::Future;
use std::sync::Mutex;
use tokio::runtime::Runtime;

lazy_static::lazy_static! {
  // Every test resets the same database, so they take turns.
  static ref DATABASE: Mutex<()> = Mutex::new(());
}

pub fn run_test<F: Future<Output = std::result::Result<(), anyhow::Error>>>(future: F) {
  let _turn = DATABASE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
  let result = Runtime::new()
    .expect("could not build runtime")
    .block_on(future);
  result.unwrap();
}

/// Runs the body against a freshly migrated database and mocked gateways.
/// Reported as ignored when `KEEFA_TEST_DATABASE_URI` was unset at build time.
#[macro_export]
macro_rules! test {
  ($i:ident($client:ident, $site:ident, $gateways:ident) $($e:tt)* ) => {
    #[test]
    #[cfg_attr(not(database_tests), ignore = "needs KEEFA_TEST_DATABASE_URI")]
    fn $i() {
      run_test(async move {
        let (client, site, gateways) = start().await?;
        #[allow(unused_variables, unused_mut)]
        let ($client, $site, mut $gateways) = (client, site, gateways);
        {$($e)*};
        Ok(())
      })
    }
  }
}

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

pub struct Gateways {
  pub mpesa: mockito::ServerGuard,
  pub stripe: mockito::ServerGuard,
}

impl Gateways {
  pub async fn mpesa_token(&mut self) -> mockito::Mock {
    self
      .mpesa
      .mock("GET", "/oauth/v1/generate")
      .match_query(mockito::Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()))
      .with_header("content-type", "application/json")
      .with_body(r#"{"access_token": "test-token", "expires_in": "3599"}"#)
      .create_async()
      .await
  }

  pub async fn mpesa_accepts(&mut self, checkout_request_id: &str) -> Vec<mockito::Mock> {
    let push = self
      .mpesa
      .mock("POST", "/mpesa/stkpush/v1/processrequest")
      .match_header("authorization", "Bearer test-token")
      .with_header("content-type", "application/json")
      .with_body(json!({
        "MerchantRequestID": "29115-34620561-1",
        "CheckoutRequestID": checkout_request_id,
        "ResponseCode": "0",
        "ResponseDescription": "Success. Request accepted for processing",
        "CustomerMessage": "Success. Request accepted for processing",
      }).to_string())
      .create_async()
      .await;
    vec![self.mpesa_token().await, push]
  }

  pub async fn mpesa_is_down(&mut self) -> Vec<mockito::Mock> {
    let push = self
      .mpesa
      .mock("POST", "/mpesa/stkpush/v1/processrequest")
      .with_status(500)
      .with_body(r#"{"errorCode": "500.001.1001", "errorMessage": "Unable to lock subscriber"}"#)
      .create_async()
      .await;
    vec![self.mpesa_token().await, push]
  }

  pub async fn stripe_creates_intent(&mut self, id: &str) -> mockito::Mock {
    self
      .stripe
      .mock("POST", "/v1/payment_intents")
      .match_header("authorization", "Bearer sk_test_keefa")
      .match_body(mockito::Matcher::AllOf(vec![
        mockito::Matcher::UrlEncoded("currency".into(), "usd".into()),
        mockito::Matcher::UrlEncoded("amount".into(), "2550".into()),
      ]))
      .with_header("content-type", "application/json")
      .with_body(payment_intent(id, "requires_payment_method").to_string())
      .create_async()
      .await
  }
}

/// A payment intent as Stripe serializes it, for a 25.50 USD donation.
pub fn payment_intent(id: &str, status: &str) -> Value {
  json!({
    "id": id,
    "object": "payment_intent",
    "amount": 2550,
    "amount_capturable": 0,
    "amount_received": if status == "succeeded" { 2550 } else { 0 },
    "capture_method": "automatic",
    "client_secret": format!("{}_secret_abc", id),
    "confirmation_method": "automatic",
    "created": 1_700_000_000,
    "currency": "usd",
    "livemode": false,
    "metadata": {},
    "payment_method_types": ["card"],
    "status": status,
  })
}

pub fn payment_intent_event(event_type: &str, intent_id: &str) -> String {
  json!({
    "id": "evt_1Keefa",
    "object": "event",
    "created": chrono::Utc::now().timestamp(),
    "livemode": false,
    "pending_webhooks": 1,
    "type": event_type,
    "data": { "object": payment_intent(intent_id, "succeeded") },
  }).to_string()
}

/// The `Stripe-Signature` header Stripe sends with `payload`.
pub fn stripe_signature(payload: &str, secret: &str) -> Header<'static> {
  use hmac::{Hmac, Mac};

  let timestamp = chrono::Utc::now().timestamp();
  let mut mac = Hmac::<sha2::Sha256>::new_from_slice(secret.as_bytes()).expect("any key length works");
  mac.update(format!("{}.{}", timestamp, payload).as_bytes());
  Header::new(
    "Stripe-Signature",
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes())),
  )
}

pub async fn start() -> anyhow::Result<(PublicApiClient, Site, Gateways)> {
  let database_uri = std::env::var("KEEFA_TEST_DATABASE_URI")
    .map_err(|_| anyhow::anyhow!("KEEFA_TEST_DATABASE_URI must point at a disposable Postgres database"))?;

  reset_database(&database_uri).await?;

  let gateways = Gateways {
    mpesa: mockito::Server::new_async().await,
    stripe: mockito::Server::new_async().await,
  };

  let figment = Figment::from(rocket::Config::debug_default()).merge(Toml::string(&format!(
    r#"
      log_level = "off"
      database_uri = "{database_uri}"
      database_max_connections = 5
      cors_origins = ["http://localhost:3000"]

      [mpesa]
      base_url = "{mpesa}"
      consumer_key = "consumer"
      consumer_secret = "secret"
      shortcode = "174379"
      passkey = "passkey"
      callback_url = "https://api.example.org/api/v1/donations/mpesa-callback"

      [stripe]
      api_base = "{stripe}"
      secret_key = "sk_test_keefa"
      publishable_key = "pk_test_keefa"
      webhook_secret = "{WEBHOOK_SECRET}"
    "#,
    mpesa = gateways.mpesa.url(),
    stripe = gateways.stripe.url(),
  )));

  let client = PublicApiClient::new(keefa_api::server_with(figment)).await;
  let site = client
    .client
    .rocket()
    .state::<Site>()
    .cloned()
    .ok_or_else(|| anyhow::anyhow!("Site was not managed"))?;

  Ok((client, site, gateways))
}

pub async fn reset_database(database_uri: &str) -> anyhow::Result<()> {
  let pool = PgPoolOptions::new().max_connections(1).connect(database_uri).await?;
  sqlx::query("DROP SCHEMA IF EXISTS public CASCADE").execute(&pool).await?;
  sqlx::query("CREATE SCHEMA public").execute(&pool).await?;
  sqlx::migrate!("src/migrations").run(&pool).await?;
  pool.close().await;
  Ok(())
}

pub async fn seed_campaign(site: &Site, slug: &str, goal: i64, is_active: bool) -> anyhow::Result<i32> {
  let (id,): (i32,) = sqlx::query_as(
    "INSERT INTO donation_campaigns (title, slug, description, goal_amount, start_date, image, campaign_type, is_active)
    VALUES ($1, $2, 'Fees and uniforms', $3, CURRENT_DATE, 'campaigns/school.jpg', 'scholarship', $4)
    RETURNING id"
  )
    .bind(format!("Campaign {}", slug))
    .bind(slug)
    .bind(Decimal::from(goal))
    .bind(is_active)
    .fetch_one(&site.db)
    .await?;
  Ok(id)
}

pub async fn raised_amount(site: &Site, campaign_id: i32) -> anyhow::Result<Decimal> {
  Ok(site.campaign().find_by_id(campaign_id).await?.raised_amount)
}

/// An event starting in `starts_in_days`, optionally capped and with a deadline `deadline_in_days` away.
pub async fn seed_event(
  site: &Site,
  slug: &str,
  starts_in_days: i32,
  deadline_in_days: Option<i32>,
  max_participants: Option<i32>,
) -> anyhow::Result<i32> {
  let (id,): (i32,) = sqlx::query_as(
    "INSERT INTO events (
      title, slug, description, event_type, start_date, end_date, venue, address,
      requires_registration, registration_deadline, max_participants, featured_image
    ) VALUES (
      $1, $2, 'A day of workshops', 'workshop',
      now() + make_interval(days => $3), now() + make_interval(days => $3, hours => 6),
      'Sheywe Hotel', 'Kakamega', true,
      now() + make_interval(days => $4), $5, 'events/workshop.jpg'
    )
    RETURNING id"
  )
    .bind(format!("Event {}", slug))
    .bind(slug)
    .bind(starts_in_days)
    .bind(deadline_in_days)
    .bind(max_participants)
    .fetch_one(&site.db)
    .await?;
  Ok(id)
}

pub async fn count(site: &Site, sql: &str) -> anyhow::Result<i64> {
  let (count,): (i64,) = sqlx::query_as(sql).fetch_one(&site.db).await?;
  Ok(count)
}

#[derive(Deserialize)]
pub struct ApiError {
  pub error: String,
}

pub struct PublicApiClient {
  pub client: Client,
}

impl PublicApiClient {
  pub async fn new(server: rocket::Rocket<rocket::Build>) -> Self {
    Self {
      client: Client::tracked(server).await.expect("valid rocket"),
    }
  }

  pub async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> (Status, T) {
    self.post_with(path, body.to_string(), vec![]).await
  }

  pub async fn post_with<T: DeserializeOwned>(&self, path: &str, body: String, headers: Vec<Header<'static>>) -> (Status, T) {
    let mut request = self.client.post(path.to_string()).header(ContentType::JSON).body(body);
    for header in headers {
      request = request.header(header);
    }
    let response = request.dispatch().await;
    let status = response.status();
    let string = response.into_string().await.unwrap_or_default();
    let parsed = serde_json::from_str(&string).unwrap_or_else(|_| panic!("Could not parse response {}", string));
    (status, parsed)
  }

  pub async fn patch<T: DeserializeOwned>(&self, path: &str, token: &str, body: Value) -> (Status, T) {
    let response = self
      .client
      .patch(path.to_string())
      .header(ContentType::JSON)
      .header(bearer(token))
      .body(body.to_string())
      .dispatch()
      .await;
    let status = response.status();
    let string = response.into_string().await.unwrap_or_default();
    (status, serde_json::from_str(&string).unwrap_or_else(|_| panic!("Could not parse response {}", string)))
  }

  pub async fn get<T: DeserializeOwned, P: std::fmt::Display>(&self, path: P) -> T {
    let (status, response) = self.raw_get(path, None).await;
    assert_eq!(status, Status::Ok, "unexpected status for {}", response);
    serde_json::from_str(&response).unwrap_or_else(|_| panic!("Could not parse response {}", response))
  }

  pub async fn get_authorized<T: DeserializeOwned, P: std::fmt::Display>(&self, path: P, token: &str) -> T {
    let (status, response) = self.raw_get(path, Some(token)).await;
    assert_eq!(status, Status::Ok, "unexpected status for {}", response);
    serde_json::from_str(&response).unwrap_or_else(|_| panic!("Could not parse response {}", response))
  }

  pub async fn raw_get<P: std::fmt::Display>(&self, path: P, token: Option<&str>) -> (Status, String) {
    let mut request = self.client.get(path.to_string());
    if let Some(token) = token {
      request = request.header(bearer(token));
    }
    let response = request.dispatch().await;
    (response.status(), response.into_string().await.unwrap_or_default())
  }

  pub async fn assert_unauthorized_get<P: std::fmt::Display>(&self, path: P) {
    let response = self.client.get(path.to_string()).dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
  }

  pub async fn assert_get_error<'a>(&'a self, path: &'a str, status: Status, msg: &'a str) {
    let response = self.client.get(path).dispatch().await;
    assert_eq!(response.status(), status);
    let err: ApiError = serde_json::from_str(&response.into_string().await.unwrap_or_default()).unwrap();
    assert_that!(&err.error, rematch(msg));
  }

  /// Registers an account of `user_type` and returns its token.
  pub async fn sign_up(&self, username: &str, user_type: &str) -> String {
    let (status, body): (Status, Value) = self.post("/api/v1/users/register", json!({
      "username": username,
      "email": format!("{}@example.com", username),
      "password": "s3cret-pass",
      "password_confirm": "s3cret-pass",
      "user_type": user_type,
    })).await;
    assert_eq!(status, Status::Created, "{}", body);
    body["token"].as_str().unwrap_or_default().to_string()
  }
}

pub fn bearer(token: &str) -> Header<'static> {
  Header::new("Authorization", format!("Bearer {}", token))
}

pub fn rematch<'a>(expr: &'a str) -> Box<dyn Matcher<'a, String> + 'a> {
  Box::new(move |actual: &String| {
    let re = regex::Regex::new(expr).unwrap();
    let builder = MatchResultBuilder::for_("rematch");
    if re.is_match(actual) {
      builder.matched()
    } else {
      builder.failed_because(&format!("{:?} does not match {:?}", expr, actual))
    }
  })
}
