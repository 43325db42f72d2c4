use serde::{Serialize, Serializer};
use super::*;

choices! {
  CampaignType as "campaign_type" {
    General => "general",
    Scholarship => "scholarship",
    Workshop => "workshop",
    Community => "community",
    Emergency => "emergency",
    Infrastructure => "infrastructure",
  }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DonationCampaign {
  pub id: i32,
  pub title: String,
  pub slug: String,
  pub description: String,
  pub goal_amount: Decimal,
  pub raised_amount: Decimal,
  pub start_date: UtcDate,
  pub end_date: Option<UtcDate>,
  pub image: String,
  pub campaign_type: CampaignType,
  pub is_featured: bool,
  pub is_urgent: bool,
  pub is_active: bool,
}

impl DonationCampaign {
  /// Share of the goal raised so far, capped at 100. A campaign without a goal is at 0.
  pub fn progress_percentage(&self) -> Decimal {
    if self.goal_amount <= Decimal::ZERO {
      return Decimal::ZERO;
    }
    (self.raised_amount / self.goal_amount * Decimal::ONE_HUNDRED).min(Decimal::ONE_HUNDRED)
  }

  pub fn remaining_amount(&self) -> Decimal {
    (self.goal_amount - self.raised_amount).max(Decimal::ZERO)
  }
}

impl Serialize for DonationCampaign {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Public<'a> {
      id: i32,
      title: &'a str,
      slug: &'a str,
      description: &'a str,
      goal_amount: Decimal,
      raised_amount: Decimal,
      progress_percentage: Decimal,
      remaining_amount: Decimal,
      start_date: UtcDate,
      end_date: Option<UtcDate>,
      image: &'a str,
      campaign_type: CampaignType,
      is_featured: bool,
      is_urgent: bool,
    }

    Public {
      id: self.id,
      title: &self.title,
      slug: &self.slug,
      description: &self.description,
      goal_amount: self.goal_amount,
      raised_amount: self.raised_amount,
      progress_percentage: self.progress_percentage().round_dp(2),
      remaining_amount: self.remaining_amount(),
      start_date: self.start_date,
      end_date: self.end_date,
      image: &self.image,
      campaign_type: self.campaign_type,
      is_featured: self.is_featured,
      is_urgent: self.is_urgent,
    }.serialize(serializer)
  }
}

impl CampaignHub {
  pub async fn active(&self) -> Result<Vec<DonationCampaign>> {
    Ok(sqlx::query_as(
      "SELECT * FROM donation_campaigns WHERE is_active ORDER BY display_order, created_at DESC"
    ).fetch_all(&self.site.db).await?)
  }

  pub async fn featured(&self) -> Result<Vec<DonationCampaign>> {
    Ok(sqlx::query_as(
      "SELECT * FROM donation_campaigns WHERE is_active AND is_featured ORDER BY display_order, created_at DESC"
    ).fetch_all(&self.site.db).await?)
  }

  pub async fn find_by_slug(&self, slug: &str) -> Result<DonationCampaign> {
    sqlx::query_as("SELECT * FROM donation_campaigns WHERE is_active AND slug = $1")
      .bind(slug)
      .fetch_optional(&self.site.db)
      .await?
      .ok_or_else(|| Error::not_found("Campaign"))
  }

  pub async fn find_by_id(&self, id: i32) -> Result<DonationCampaign> {
    sqlx::query_as("SELECT * FROM donation_campaigns WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.site.db)
      .await?
      .ok_or_else(|| Error::not_found("Campaign"))
  }

  pub async fn count_active(&self) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM donation_campaigns WHERE is_active")
      .fetch_one(&self.site.db)
      .await?;
    Ok(count)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use std::str::FromStr;

  fn campaign(goal: &str, raised: &str) -> DonationCampaign {
    DonationCampaign {
      id: 1,
      title: "Back to school".into(),
      slug: "back-to-school".into(),
      description: "Fees and uniforms".into(),
      goal_amount: Decimal::from_str(goal).unwrap(),
      raised_amount: Decimal::from_str(raised).unwrap(),
      start_date: UtcDate::from_ymd_opt(2025, 1, 6).unwrap(),
      end_date: None,
      image: "campaigns/school.jpg".into(),
      campaign_type: CampaignType::Scholarship,
      is_featured: true,
      is_urgent: false,
      is_active: true,
    }
  }

  #[test]
  fn progress_is_a_capped_percentage() {
    assert_eq!(campaign("1000", "250").progress_percentage(), Decimal::from(25));
    assert_eq!(campaign("1000", "1200").progress_percentage(), Decimal::ONE_HUNDRED);
    assert_eq!(campaign("0", "50").progress_percentage(), Decimal::ZERO);
  }

  #[test]
  fn remaining_never_goes_negative() {
    assert_eq!(campaign("1000", "250").remaining_amount(), Decimal::from(750));
    assert_eq!(campaign("1000", "1200").remaining_amount(), Decimal::ZERO);
  }

  #[test]
  fn serializes_derived_amounts() {
    let json = serde_json::to_value(campaign("3000", "1000")).unwrap();
    assert_eq!(json["progress_percentage"], "33.33");
    assert_eq!(json["remaining_amount"], "2000");
    assert_eq!(json["campaign_type"], "scholarship");
    assert!(json.get("is_active").is_none());
  }
}
