use rocket::{info, warn};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use super::*;

impl PaymentMethod {
  pub fn label(&self) -> &'static str {
    match self {
      PaymentMethod::Stripe => "Credit/Debit Card",
      PaymentMethod::Mpesa => "M-Pesa",
      PaymentMethod::BankTransfer => "Bank Transfer",
      PaymentMethod::Paypal => "PayPal",
      PaymentMethod::Other => "Other",
    }
  }
}

/// What the donor needs next to finish paying, by gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PaymentInitiation {
  Mpesa { checkout_request_id: String },
  Stripe { client_secret: Option<String>, payment_intent_id: String },
  Manual { payment_instructions: String },
}

impl PaymentInitiation {
  pub fn message(&self) -> &'static str {
    match self {
      PaymentInitiation::Mpesa { .. } => "M-Pesa payment initiated. Please complete payment on your phone.",
      PaymentInitiation::Stripe { .. } => "Stripe payment initiated.",
      PaymentInitiation::Manual { .. } => "Donation created successfully.",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonationReceipt {
  pub message: String,
  pub donation_id: i32,
  pub transaction_id: String,
  pub status: DonationStatus,
  #[serde(flatten)]
  pub initiation: PaymentInitiation,
}

/// Minor units Stripe expects: cents, or the smallest unit of the currency.
pub fn minor_units(amount: Decimal) -> Result<i64> {
  (amount * Decimal::ONE_HUNDRED)
    .round()
    .to_i64()
    .ok_or_else(|| Error::validation("amount", "Amount is out of range."))
}

async fn blocking<T, F>(call: F) -> Result<T>
where
  T: Send + 'static,
  F: FnOnce() -> Result<T> + Send + 'static,
{
  tokio::task::spawn_blocking(call)
    .await
    .map_err(|e| Error::Gateway(format!("Payment gateway call did not finish: {}", e)))?
}

impl DonationHub {
  /// Stores a donation and starts its payment. Exactly one gateway call is made;
  /// if it fails the donation is marked failed and the gateway's complaint is returned.
  pub async fn donate(&self, form: &DonationForm) -> Result<DonationReceipt> {
    let donation = self.create(form).await?;

    match self.initiate(&donation).await {
      Ok(initiation) => Ok(DonationReceipt {
        message: initiation.message().to_string(),
        donation_id: donation.id,
        transaction_id: donation.transaction_id,
        status: DonationStatus::Pending,
        initiation,
      }),
      Err(e) => {
        warn!("Payment initiation for donation {} failed: {}", donation.id, e);
        self.transition(donation.id, DonationStatus::Failed).await?;
        Err(match e {
          Error::Gateway(_) => e,
          other => Error::Gateway(other.to_string()),
        })
      }
    }
  }

  pub async fn initiate(&self, donation: &Donation) -> Result<PaymentInitiation> {
    match donation.payment_method {
      PaymentMethod::Mpesa => {
        let phone = donation
          .donor_phone
          .clone()
          .ok_or_else(|| Error::validation("donor_phone", "A phone number is required for M-Pesa donations."))?;
        let settings = self.site.settings.mpesa.clone();
        let request = mpesa::Client::new(&settings).stk_push_request(donation, &phone);

        let response = blocking(move || mpesa::Client::new(&settings).stk_push(&request)).await?;
        self.set_payment_reference(donation.id, &response.checkout_request_id).await?;
        info!("STK push sent for donation {}: {}", donation.id, response.checkout_request_id);

        Ok(PaymentInitiation::Mpesa { checkout_request_id: response.checkout_request_id })
      }
      PaymentMethod::Stripe => {
        let intent = card::create_payment_intent(&self.site.settings.stripe, donation).await?;
        self.set_payment_reference(donation.id, intent.id.as_str()).await?;
        info!("Payment intent {} opened for donation {}", intent.id, donation.id);

        Ok(PaymentInitiation::Stripe {
          client_secret: intent.client_secret,
          payment_intent_id: intent.id.to_string(),
        })
      }
      _ => Ok(PaymentInitiation::Manual {
        payment_instructions: self.payment_instructions(donation)?,
      }),
    }
  }

  pub fn payment_instructions(&self, donation: &Donation) -> Result<String> {
    let bank = &self.site.settings.bank;
    let mut context = tera::Context::new();
    context.insert("method", donation.payment_method.label());
    context.insert("amount", &donation.amount.to_string());
    context.insert("currency", &donation.currency);
    context.insert("transaction_id", &donation.transaction_id);
    context.insert("bank", bank);
    context.insert(
      "alumni_account",
      &donation.is_alumni.then(|| alumni_account_number(&bank.paybill, &donation.donor_name)),
    );
    Ok(crate::TEMPLATES.render("donations/payment_instructions", &context)?.trim().to_string())
  }

  /// Settles the donation an STK callback refers to. A transition the state machine refuses
  /// is logged and yields `None`, the callback is still acknowledged.
  pub async fn from_mpesa_callback(&self, callback: &mpesa::Callback) -> Result<Option<Transition>> {
    let reference = callback.checkout_request_id().ok_or_else(|| Error::not_found("Donation"))?;
    let donation = self
      .find_by_payment_reference(reference)
      .await?
      .ok_or_else(|| Error::not_found("Donation"))?;

    self.settle(donation, callback.outcome()).await
  }

  /// Settles the donation behind a payment intent event. Other events, and intents
  /// no donation refers to, are ignored.
  pub async fn from_stripe_event(&self, event: &stripe::Event) -> Result<Option<Transition>> {
    let Some((intent_id, next)) = card::settlement(event) else {
      return Ok(None);
    };

    match self.find_by_payment_reference(intent_id).await? {
      Some(donation) => self.settle(donation, next).await,
      None => {
        info!("Stripe event {} refers to no donation ({})", event.id, intent_id);
        Ok(None)
      }
    }
  }

  async fn settle(&self, donation: Donation, next: DonationStatus) -> Result<Option<Transition>> {
    match self.transition(donation.id, next).await {
      Ok(transition) => {
        if transition.changed() {
          info!(
            "Donation {} moved from {} to {}{}",
            donation.id,
            transition.previous,
            next,
            if transition.credited { ", campaign credited" } else { "" }
          );
        }
        Ok(Some(transition))
      }
      Err(Error::InvalidTransition { from, to }) => {
        warn!("Ignoring gateway update for donation {}: {} to {} is not allowed", donation.id, from, to);
        Ok(None)
      }
      Err(e) => Err(e),
    }
  }

  /// Administrative refund of a completed donation.
  pub async fn refund(&self, id: i32) -> Result<Donation> {
    let donation = self.find_by_id(id).await?;
    if donation.status == DonationStatus::Refunded {
      return Err(Error::InvalidTransition {
        from: donation.status.to_string(),
        to: DonationStatus::Refunded.to_string(),
      });
    }
    Ok(self.transition(id, DonationStatus::Refunded).await?.donation)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn minor_units_round_to_the_cent() {
    assert_eq!(minor_units("12.345".parse().unwrap()).unwrap(), 1234);
    assert_eq!(minor_units("12.355".parse().unwrap()).unwrap(), 1236);
    assert_eq!(minor_units(Decimal::from(600)).unwrap(), 60000);
  }

  #[test]
  fn receipts_flatten_the_gateway_details() {
    let receipt = DonationReceipt {
      message: "M-Pesa payment initiated. Please complete payment on your phone.".into(),
      donation_id: 7,
      transaction_id: "3f0b8d4e-0000-4000-8000-000000000000".into(),
      status: DonationStatus::Pending,
      initiation: PaymentInitiation::Mpesa { checkout_request_id: "ws_CO_1".into() },
    };

    let json = serde_json::to_value(&receipt).unwrap();
    assert_eq!(json["checkout_request_id"], "ws_CO_1");
    assert_eq!(json["status"], "pending");
    assert_eq!(json["donation_id"], 7);
  }
}
