//! Card donations through Stripe payment intents.

use std::collections::HashMap;
use super::*;

pub fn client(settings: &StripeSettings) -> stripe::Client {
  stripe::Client::from_url(settings.api_base.as_str(), settings.secret_key.as_str())
}

/// Opens a payment intent for the donation, tagged with who gave it.
pub async fn create_payment_intent(settings: &StripeSettings, donation: &Donation) -> Result<stripe::PaymentIntent> {
  let currency = donation
    .currency
    .to_lowercase()
    .parse::<stripe::Currency>()
    .map_err(|_| Error::validation("currency", "Card payments are not available in this currency."))?;

  let mut params = stripe::CreatePaymentIntent::new(minor_units(donation.amount)?, currency);
  params.metadata = Some(HashMap::from([
    ("donation_id".to_string(), donation.id.to_string()),
    ("donor_name".to_string(), donation.donor_name.clone()),
    ("donor_email".to_string(), donation.donor_email.clone()),
  ]));

  stripe::PaymentIntent::create(&client(settings), params)
    .await
    .map_err(|e| Error::Gateway(format!("Stripe payment intent failed: {}", e)))
}

/// The payment intent an event settles and the status it settles to.
pub fn settlement(event: &stripe::Event) -> Option<(&str, DonationStatus)> {
  let next = match event.type_ {
    stripe::EventType::PaymentIntentSucceeded => DonationStatus::Completed,
    stripe::EventType::PaymentIntentPaymentFailed => DonationStatus::Failed,
    _ => return None,
  };

  match &event.data.object {
    stripe::EventObject::PaymentIntent(intent) => Some((intent.id.as_str(), next)),
    _ => None,
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookError {
  InvalidSignature,
  InvalidPayload,
}

impl WebhookError {
  pub fn message(&self) -> &'static str {
    match self {
      WebhookError::InvalidSignature => "Invalid signature",
      WebhookError::InvalidPayload => "Invalid payload",
    }
  }
}

/// Only a correctly signed body that isn't an event counts as a bad payload.
impl From<stripe::WebhookError> for WebhookError {
  fn from(err: stripe::WebhookError) -> Self {
    match err {
      stripe::WebhookError::BadParse(_) => WebhookError::InvalidPayload,
      _ => WebhookError::InvalidSignature,
    }
  }
}
