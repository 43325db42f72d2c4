use chronoutil::relative_duration::RelativeDuration;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use super::*;

choices! {
  DonationStatus as "donation_status" {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
    Refunded => "refunded",
  }
}

impl DonationStatus {
  /// Pending donations settle once; only completed ones can be refunded.
  pub fn can_transition_to(&self, next: DonationStatus) -> bool {
    use DonationStatus::*;
    matches!(
      (self, next),
      (Pending, Completed) | (Pending, Failed) | (Completed, Refunded)
    )
  }
}

choices! {
  DonationType as "donation_type" {
    OneTime => "one_time",
    Monthly => "monthly",
    Quarterly => "quarterly",
    Annual => "annual",
  }
}

impl DonationType {
  pub fn period_months(&self) -> Option<i32> {
    match self {
      DonationType::OneTime => None,
      DonationType::Monthly => Some(1),
      DonationType::Quarterly => Some(3),
      DonationType::Annual => Some(12),
    }
  }

  pub fn next_payment_date(&self, from: UtcDate) -> Option<UtcDate> {
    self.period_months().map(|months| from + RelativeDuration::months(months))
  }
}

choices! {
  PaymentMethod as "payment_method" {
    Stripe => "stripe",
    Mpesa => "mpesa",
    BankTransfer => "bank_transfer",
    Paypal => "paypal",
    Other => "other",
  }
}

choices! {
  AlumniDonationPeriod as "alumni_donation_period" {
    Monthly => "monthly",
    Yearly => "yearly",
    Custom => "custom",
  }
}

pub const ALUMNI_MONTHLY_AMOUNT: i64 = 50;
pub const ALUMNI_YEARLY_AMOUNT: i64 = 600;
pub const DEFAULT_CURRENCY: &str = "KES";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DonationForm {
  #[validate(length(min = 1, max = 200))]
  pub donor_name: String,
  #[validate(email(message = "Enter a valid email address."))]
  pub donor_email: String,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(length(max = 20))]
  pub donor_phone: Option<String>,
  #[serde(default)]
  pub is_anonymous: bool,
  #[serde(default)]
  pub is_alumni: bool,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(custom = "AlumniDonationPeriod::check")]
  pub alumni_donation_period: Option<String>,
  #[serde(default)]
  pub amount: Option<Decimal>,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(length(equal = 3))]
  pub currency: Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(custom = "DonationType::check")]
  pub donation_type: Option<String>,
  #[serde(default)]
  pub campaign: Option<i32>,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(length(max = 100))]
  pub designation: Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub message: Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(custom = "PaymentMethod::check")]
  pub payment_method: Option<String>,
}

/// What a donation form commits the donor to, once defaults and alumni rules are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationTerms {
  pub amount: Decimal,
  pub currency: String,
  pub donation_type: DonationType,
  pub payment_method: PaymentMethod,
  pub is_recurring: bool,
  pub alumni_donation_period: Option<AlumniDonationPeriod>,
}

impl DonationForm {
  pub fn terms(&self) -> Result<DonationTerms> {
    let payment_method = parse_optional::<PaymentMethod>(&self.payment_method)?
      .unwrap_or(PaymentMethod::Mpesa);

    let terms = if self.is_alumni {
      let period = parse_optional::<AlumniDonationPeriod>(&self.alumni_donation_period)?
        .ok_or_else(|| Error::validation(
          "alumni_donation_period",
          "Must be 'monthly', 'yearly', or 'custom' for alumni donations.",
        ))?;

      let (amount, donation_type) = match period {
        AlumniDonationPeriod::Monthly => (Decimal::from(ALUMNI_MONTHLY_AMOUNT), DonationType::Monthly),
        AlumniDonationPeriod::Yearly => (Decimal::from(ALUMNI_YEARLY_AMOUNT), DonationType::Annual),
        AlumniDonationPeriod::Custom => match self.amount {
          Some(amount) if amount > Decimal::ZERO => (check_amount(amount)?, DonationType::OneTime),
          _ => return Err(Error::validation(
            "amount",
            "Custom alumni donations must specify a positive amount.",
          )),
        },
      };

      DonationTerms {
        amount,
        currency: DEFAULT_CURRENCY.to_string(),
        donation_type,
        payment_method,
        is_recurring: donation_type != DonationType::OneTime,
        alumni_donation_period: Some(period),
      }
    } else {
      let amount = match self.amount {
        Some(amount) if amount > Decimal::ZERO => check_amount(amount)?,
        Some(_) => return Err(Error::validation("amount", "Ensure this value is greater than 0.")),
        None => return Err(Error::validation("amount", "This field is required.")),
      };
      let donation_type = parse_optional::<DonationType>(&self.donation_type)?
        .unwrap_or(DonationType::OneTime);

      DonationTerms {
        amount,
        currency: self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY).to_uppercase(),
        donation_type,
        payment_method,
        is_recurring: donation_type != DonationType::OneTime,
        alumni_donation_period: None,
      }
    };

    if terms.payment_method == PaymentMethod::Mpesa && self.donor_phone.is_none() {
      return Err(Error::validation("donor_phone", "A phone number is required for M-Pesa donations."));
    }

    Ok(terms)
  }
}

const AMOUNT_MAX_DIGITS: u32 = 10;
const AMOUNT_DECIMAL_PLACES: u32 = 2;

/// Amounts must fit a `NUMERIC(10,2)` column. Trailing zeros don't count.
fn check_amount(amount: Decimal) -> Result<Decimal> {
  let normalized = amount.normalize();
  let decimals = normalized.scale();
  let significant = normalized.mantissa().unsigned_abs().to_string().len() as u32;
  let digits = significant.max(decimals);

  if digits > AMOUNT_MAX_DIGITS {
    return Err(Error::validation(
      "amount",
      &format!("Ensure that there are no more than {} digits in total.", AMOUNT_MAX_DIGITS),
    ));
  }
  if decimals > AMOUNT_DECIMAL_PLACES {
    return Err(Error::validation(
      "amount",
      &format!("Ensure that there are no more than {} decimal places.", AMOUNT_DECIMAL_PLACES),
    ));
  }
  if digits - decimals > AMOUNT_MAX_DIGITS - AMOUNT_DECIMAL_PLACES {
    return Err(Error::validation(
      "amount",
      &format!(
        "Ensure that there are no more than {} digits before the decimal point.",
        AMOUNT_MAX_DIGITS - AMOUNT_DECIMAL_PLACES
      ),
    ));
  }
  Ok(amount)
}

/// The paybill account alumni deposit to: `{paybill}#{NAME}`, spaces removed.
pub fn alumni_account_number(paybill: &str, donor_name: &str) -> String {
  let depositor: String = donor_name.chars().filter(|c| !c.is_whitespace()).collect();
  let depositor = if depositor.is_empty() { "ALUMNI".to_string() } else { depositor.to_uppercase() };
  format!("{}#{}", paybill, depositor)
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Donation {
  pub id: i32,
  pub donor_name: String,
  pub donor_email: String,
  pub donor_phone: Option<String>,
  pub is_anonymous: bool,
  pub is_alumni: bool,
  pub alumni_donation_period: Option<AlumniDonationPeriod>,
  pub amount: Decimal,
  pub currency: String,
  pub donation_type: DonationType,
  pub campaign_id: Option<i32>,
  pub designation: Option<String>,
  pub message: Option<String>,
  pub payment_method: PaymentMethod,
  pub transaction_id: String,
  pub payment_reference: Option<String>,
  pub status: DonationStatus,
  pub processed_at: Option<UtcDateTime>,
  pub is_recurring: bool,
  pub next_payment_date: Option<UtcDate>,
  pub created_at: UtcDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct DonationQuery {
  pub id_eq: Option<i32>,
  pub payment_reference_eq: Option<String>,
  pub status_eq: Option<DonationStatus>,
  pub campaign_id_eq: Option<i32>,
  pub donor_email_eq: Option<String>,
}

impl DonationQuery {
  fn to_sql(&self) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new("SELECT * FROM donations WHERE is_active");
    if let Some(id) = self.id_eq {
      builder.push(" AND id = ").push_bind(id);
    }
    if let Some(ref reference) = self.payment_reference_eq {
      builder.push(" AND payment_reference = ").push_bind(reference);
    }
    if let Some(status) = self.status_eq {
      builder.push(" AND status = ").push_bind(status);
    }
    if let Some(campaign_id) = self.campaign_id_eq {
      builder.push(" AND campaign_id = ").push_bind(campaign_id);
    }
    if let Some(ref email) = self.donor_email_eq {
      builder.push(" AND donor_email = ").push_bind(email);
    }
    builder.push(" ORDER BY created_at DESC");
    builder
  }
}

/// The outcome of moving a donation to a new status.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
  pub donation: Donation,
  pub previous: DonationStatus,
  pub credited: bool,
}

impl Transition {
  pub fn changed(&self) -> bool {
    self.previous != self.donation.status
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationStats {
  pub total_donations: i64,
  pub total_amount: Decimal,
  pub active_campaigns: i64,
  pub active_volunteers: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DonorSummary {
  pub donation_count: i64,
  pub completed_total: Decimal,
}

impl DonationHub {
  pub async fn query(&self, query: &DonationQuery) -> Result<Vec<Donation>> {
    Ok(query.to_sql().build_query_as().fetch_all(&self.site.db).await?)
  }

  pub async fn find_optional(&self, query: &DonationQuery) -> Result<Option<Donation>> {
    Ok(query.to_sql().build_query_as().fetch_optional(&self.site.db).await?)
  }

  pub async fn find(&self, query: &DonationQuery) -> Result<Donation> {
    self.find_optional(query).await?.ok_or_else(|| Error::not_found("Donation"))
  }

  pub async fn find_by_id(&self, id: i32) -> Result<Donation> {
    self.find(&DonationQuery { id_eq: Some(id), ..Default::default() }).await
  }

  pub async fn find_by_payment_reference(&self, reference: &str) -> Result<Option<Donation>> {
    self.find_optional(&DonationQuery {
      payment_reference_eq: Some(reference.to_string()),
      ..Default::default()
    }).await
  }

  /// Validates and stores a new pending donation under a fresh transaction id.
  pub async fn create(&self, form: &DonationForm) -> Result<Donation> {
    form.validate()?;
    let terms = form.terms()?;

    if let Some(campaign_id) = form.campaign {
      match self.site.campaign().find_by_id(campaign_id).await {
        Ok(campaign) if campaign.is_active => {}
        Ok(_) => return Err(Error::validation("campaign", "This campaign is no longer accepting donations.")),
        Err(e) if e.is_not_found() => {
          return Err(Error::validation("campaign", &format!("Invalid pk \"{}\" - object does not exist.", campaign_id)))
        }
        Err(e) => return Err(e),
      }
    }

    let created_at = Utc::now();
    let next_payment_date = terms.donation_type.next_payment_date(created_at.date_naive());

    Ok(sqlx::query_as(
      "INSERT INTO donations (
        donor_name, donor_email, donor_phone, is_anonymous, is_alumni, alumni_donation_period,
        amount, currency, donation_type, campaign_id, designation, message, payment_method,
        transaction_id, status, is_recurring, next_payment_date, created_at, updated_at
      ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, 'pending', $15, $16, $17, $17)
      RETURNING *"
    )
      .bind(&form.donor_name)
      .bind(&form.donor_email)
      .bind(&form.donor_phone)
      .bind(form.is_anonymous)
      .bind(form.is_alumni)
      .bind(terms.alumni_donation_period)
      .bind(terms.amount)
      .bind(&terms.currency)
      .bind(terms.donation_type)
      .bind(form.campaign)
      .bind(&form.designation)
      .bind(&form.message)
      .bind(terms.payment_method)
      .bind(uuid::Uuid::new_v4().to_string())
      .bind(terms.is_recurring)
      .bind(next_payment_date)
      .bind(created_at)
      .fetch_one(&self.site.db)
      .await?)
  }

  pub async fn set_payment_reference(&self, id: i32, reference: &str) -> Result<Donation> {
    Ok(sqlx::query_as(
      "UPDATE donations SET payment_reference = $2, updated_at = now() WHERE id = $1 RETURNING *"
    )
      .bind(id)
      .bind(reference)
      .fetch_one(&self.site.db)
      .await?)
  }

  /// Moves a donation to `next`, crediting its campaign when it becomes completed.
  /// Runs in one transaction holding the donation row lock, and only updates the row
  /// if it is still in the status that was read, so a campaign is credited once.
  pub async fn transition(&self, id: i32, next: DonationStatus) -> Result<Transition> {
    let mut tx = self.site.db.begin().await?;

    let current: Donation = sqlx::query_as("SELECT * FROM donations WHERE id = $1 FOR UPDATE")
      .bind(id)
      .fetch_optional(&mut *tx)
      .await?
      .ok_or_else(|| Error::not_found("Donation"))?;

    let previous = current.status;
    if previous == next {
      tx.commit().await?;
      return Ok(Transition { donation: current, previous, credited: false });
    }

    if !previous.can_transition_to(next) {
      return Err(Error::InvalidTransition { from: previous.to_string(), to: next.to_string() });
    }

    let processed_at = matches!(next, DonationStatus::Completed | DonationStatus::Failed).then(Utc::now);

    let donation: Donation = sqlx::query_as(
      "UPDATE donations SET status = $2, processed_at = COALESCE($4, processed_at), updated_at = now()
      WHERE id = $1 AND status = $3
      RETURNING *"
    )
      .bind(id)
      .bind(next)
      .bind(previous)
      .bind(processed_at)
      .fetch_optional(&mut *tx)
      .await?
      .ok_or_else(|| Error::InvalidTransition { from: previous.to_string(), to: next.to_string() })?;

    let mut credited = false;
    if next == DonationStatus::Completed {
      if let Some(campaign_id) = donation.campaign_id {
        sqlx::query(
          "UPDATE donation_campaigns SET raised_amount = raised_amount + $2, updated_at = now() WHERE id = $1"
        )
          .bind(campaign_id)
          .bind(donation.amount)
          .execute(&mut *tx)
          .await?;
        credited = true;
      }
    }

    tx.commit().await?;
    Ok(Transition { donation, previous, credited })
  }

  pub async fn stats(&self) -> Result<DonationStats> {
    let (total_donations, total_amount): (i64, Decimal) = sqlx::query_as(
      "SELECT COUNT(*), COALESCE(SUM(amount), 0) FROM donations WHERE status = 'completed'"
    ).fetch_one(&self.site.db).await?;

    Ok(DonationStats {
      total_donations,
      total_amount,
      active_campaigns: self.site.campaign().count_active().await?,
      active_volunteers: self.site.volunteer().count_active().await?,
    })
  }

  /// Count and completed total of the donor's five most recent donations.
  pub async fn summary_for_donor(&self, email: &str) -> Result<DonorSummary> {
    Ok(sqlx::query_as(
      "SELECT
        COUNT(*) AS donation_count,
        COALESCE(SUM(amount) FILTER (WHERE status = 'completed'), 0) AS completed_total
      FROM (
        SELECT amount, status FROM donations WHERE donor_email = $1 ORDER BY created_at DESC LIMIT 5
      ) recent"
    ).bind(email).fetch_one(&self.site.db).await?)
  }
}
