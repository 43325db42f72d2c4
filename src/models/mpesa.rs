//! Safaricom Daraja: OAuth tokens, Lipa na M-Pesa STK push and its callback.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Duration;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use super::*;

pub const TRANSACTION_TYPE: &str = "CustomerPayBillOnline";
pub const TRANSACTION_DESC: &str = "Donation Payment";

/// Daraja timestamps are Nairobi wall-clock time, which is UTC+3 all year.
pub fn timestamp(at: UtcDateTime) -> String {
  (at + Duration::hours(3)).format("%Y%m%d%H%M%S").to_string()
}

pub fn password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
  STANDARD.encode(format!("{}{}{}", shortcode, passkey, timestamp))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StkPushRequest {
  #[serde(rename = "BusinessShortCode")]
  pub business_short_code: String,
  #[serde(rename = "Password")]
  pub password: String,
  #[serde(rename = "Timestamp")]
  pub timestamp: String,
  #[serde(rename = "TransactionType")]
  pub transaction_type: String,
  #[serde(rename = "Amount")]
  pub amount: i64,
  #[serde(rename = "PartyA")]
  pub party_a: String,
  #[serde(rename = "PartyB")]
  pub party_b: String,
  #[serde(rename = "PhoneNumber")]
  pub phone_number: String,
  #[serde(rename = "CallBackURL")]
  pub callback_url: String,
  #[serde(rename = "AccountReference")]
  pub account_reference: String,
  #[serde(rename = "TransactionDesc")]
  pub transaction_desc: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StkPushResponse {
  #[serde(rename = "MerchantRequestID", default)]
  pub merchant_request_id: Option<String>,
  #[serde(rename = "CheckoutRequestID")]
  pub checkout_request_id: String,
  #[serde(rename = "ResponseCode", default)]
  pub response_code: Option<String>,
  #[serde(rename = "ResponseDescription", default)]
  pub response_description: Option<String>,
  #[serde(rename = "CustomerMessage", default)]
  pub customer_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccessToken {
  access_token: String,
}

pub struct Client<'a> {
  settings: &'a MpesaSettings,
}

impl<'a> Client<'a> {
  pub fn new(settings: &'a MpesaSettings) -> Self {
    Self { settings }
  }

  pub fn stk_push_request(&self, donation: &Donation, phone: &str) -> StkPushRequest {
    let timestamp = timestamp(donation.created_at);
    StkPushRequest {
      business_short_code: self.settings.shortcode.clone(),
      password: password(&self.settings.shortcode, &self.settings.passkey, &timestamp),
      timestamp,
      transaction_type: TRANSACTION_TYPE.to_string(),
      amount: donation.amount.trunc().to_i64().unwrap_or_default(),
      party_a: phone.to_string(),
      party_b: self.settings.shortcode.clone(),
      phone_number: phone.to_string(),
      callback_url: self.settings.callback_url.clone(),
      account_reference: format!("Donation-{}", donation.id),
      transaction_desc: TRANSACTION_DESC.to_string(),
    }
  }

  pub fn access_token(&self) -> Result<String> {
    let auth = format!(
      "Basic {}",
      STANDARD.encode(format!("{}:{}", self.settings.consumer_key, self.settings.consumer_secret))
    );

    let token: AccessToken = ureq::get(&format!("{}/oauth/v1/generate", self.settings.base_url))
      .query("grant_type", "client_credentials")
      .set("Authorization", &auth)
      .call()
      .map_err(|e| gateway_error("Failed to get M-Pesa access token", e))?
      .into_json()?;

    Ok(token.access_token)
  }

  /// Prompts the donor's phone. The donation settles later, through the callback.
  pub fn stk_push(&self, request: &StkPushRequest) -> Result<StkPushResponse> {
    let token = self.access_token()?;

    let response: StkPushResponse = ureq::post(&format!("{}/mpesa/stkpush/v1/processrequest", self.settings.base_url))
      .set("Authorization", &format!("Bearer {}", token))
      .send_json(serde_json::to_value(request)?)
      .map_err(|e| gateway_error("M-Pesa STK Push failed", e))?
      .into_json()?;

    match response.response_code.as_deref() {
      None | Some("0") => Ok(response),
      Some(code) => Err(Error::Gateway(format!(
        "M-Pesa STK Push failed ({}): {}",
        code,
        response.response_description.as_deref().unwrap_or("no description")
      ))),
    }
  }
}

/// The body Daraja posts to the callback URL once the donor answers the prompt.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Callback {
  #[serde(rename = "Body")]
  pub body: CallbackBody,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallbackBody {
  #[serde(rename = "stkCallback")]
  pub stk_callback: StkCallback,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StkCallback {
  #[serde(rename = "MerchantRequestID", default)]
  pub merchant_request_id: Option<String>,
  #[serde(rename = "CheckoutRequestID", default)]
  pub checkout_request_id: Option<String>,
  #[serde(rename = "ResultCode")]
  pub result_code: ResultCode,
  #[serde(rename = "ResultDesc", default)]
  pub result_desc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ResultCode {
  Number(i64),
  Text(String),
}

impl Callback {
  pub fn parse(body: &str) -> Result<Callback> {
    Ok(serde_json::from_str(body)?)
  }

  pub fn checkout_request_id(&self) -> Option<&str> {
    self.body.stk_callback.checkout_request_id.as_deref()
  }

  /// ResultCode 0 is a completed payment; anything else (cancelled, timed out, insufficient funds) failed.
  pub fn outcome(&self) -> DonationStatus {
    match self.body.stk_callback.result_code {
      ResultCode::Number(0) => DonationStatus::Completed,
      ResultCode::Text(ref code) if code.trim() == "0" => DonationStatus::Completed,
      _ => DonationStatus::Failed,
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn timestamps_are_in_nairobi_time() {
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 22, 15, 30).unwrap();
    assert_eq!(timestamp(at), "20250302011530");
  }

  #[test]
  fn password_is_base64_of_shortcode_passkey_and_timestamp() {
    let encoded = password("174379", "passkey", "20250302011530");
    assert_eq!(STANDARD.decode(encoded).unwrap(), b"174379passkey20250302011530");
  }

  #[test]
  fn parses_successful_callbacks() {
    let callback = Callback::parse(r#"{
      "Body": {
        "stkCallback": {
          "MerchantRequestID": "29115-34620561-1",
          "CheckoutRequestID": "ws_CO_191220191020363925",
          "ResultCode": 0,
          "ResultDesc": "The service request is processed successfully.",
          "CallbackMetadata": {
            "Item": [
              {"Name": "Amount", "Value": 50.00},
              {"Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV"}
            ]
          }
        }
      }
    }"#).unwrap();

    assert_eq!(callback.checkout_request_id(), Some("ws_CO_191220191020363925"));
    assert_eq!(callback.outcome(), DonationStatus::Completed);
  }

  #[test]
  fn non_zero_result_codes_are_failures() {
    let cancelled = Callback::parse(
      r#"{"Body": {"stkCallback": {"CheckoutRequestID": "ws_CO_1", "ResultCode": 1032, "ResultDesc": "Request cancelled by user"}}}"#
    ).unwrap();
    assert_eq!(cancelled.outcome(), DonationStatus::Failed);

    let textual = Callback::parse(r#"{"Body": {"stkCallback": {"CheckoutRequestID": "ws_CO_2", "ResultCode": "0"}}}"#).unwrap();
    assert_eq!(textual.outcome(), DonationStatus::Completed);
  }

  #[test]
  fn malformed_callbacks_are_errors() {
    assert!(Callback::parse(r#"{"Body": {}}"#).is_err());
    assert!(Callback::parse("not json").is_err());
  }
}
