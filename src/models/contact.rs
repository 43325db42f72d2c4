use serde::{Deserialize, Serialize};
use super::*;

choices! {
  InquiryType as "inquiry_type" {
    General => "general",
    Volunteer => "volunteer",
    Partnership => "partnership",
    Donation => "donation",
    Scholarship => "scholarship",
    Media => "media",
    Complaint => "complaint",
    Other => "other",
  }
}

choices! {
  Department as "department" {
    General => "general",
    Programs => "programs",
    Donations => "donations",
    Partnerships => "partnerships",
    Media => "media",
    Volunteer => "volunteer",
    Finance => "finance",
    Admin => "admin",
  }
}

choices! {
  SocialPlatform as "social_platform" {
    Facebook => "facebook",
    Twitter => "twitter",
    Instagram => "instagram",
    Linkedin => "linkedin",
    Youtube => "youtube",
    Tiktok => "tiktok",
    Whatsapp => "whatsapp",
    Telegram => "telegram",
  }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactInquiryForm {
  #[validate(length(min = 1, max = 100))]
  pub first_name: String,
  #[validate(length(min = 1, max = 100))]
  pub last_name: String,
  #[validate(email(message = "Enter a valid email address."))]
  pub email: String,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(length(max = 20))]
  pub phone: Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(length(max = 200))]
  pub organization: Option<String>,
  #[validate(custom = "InquiryType::check")]
  pub subject: String,
  #[validate(length(min = 1))]
  pub message: String,
  #[serde(default)]
  pub subscribe_newsletter: bool,
}

impl ContactInquiryHub {
  /// Stores the inquiry, and when asked, signs the sender up for the newsletter in the same transaction.
  pub async fn create(&self, form: ContactInquiryForm) -> Result<i32> {
    form.validate()?;
    let subject: InquiryType = form.subject.parse()?;

    let mut tx = self.site.db.begin().await?;

    let (id,): (i32,) = sqlx::query_as(
      "INSERT INTO contact_inquiries (
        first_name, last_name, email, phone, organization, subject, message, subscribe_newsletter
      ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
      RETURNING id"
    )
      .bind(&form.first_name)
      .bind(&form.last_name)
      .bind(&form.email)
      .bind(&form.phone)
      .bind(&form.organization)
      .bind(subject)
      .bind(&form.message)
      .bind(form.subscribe_newsletter)
      .fetch_one(&mut *tx)
      .await?;

    if form.subscribe_newsletter {
      sqlx::query(
        "INSERT INTO newsletters (email, first_name, last_name, subscription_source)
        VALUES ($1, $2, $3, 'contact_form')
        ON CONFLICT (email) DO NOTHING"
      )
        .bind(&form.email)
        .bind(&form.first_name)
        .bind(&form.last_name)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(id)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct OfficeLocation {
  pub id: i32,
  pub name: String,
  pub address: String,
  pub city: String,
  pub county: String,
  pub postal_code: String,
  pub country: String,
  pub phone: String,
  pub email: String,
  pub latitude: Decimal,
  pub longitude: Decimal,
  pub office_hours: String,
  pub services_offered: Option<String>,
  pub is_main_office: bool,
}

impl OfficeLocationHub {
  pub async fn public(&self) -> Result<Vec<OfficeLocation>> {
    Ok(sqlx::query_as(
      "SELECT * FROM office_locations WHERE is_public AND is_active ORDER BY display_order, name"
    ).fetch_all(&self.site.db).await?)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ContactPerson {
  pub id: i32,
  pub name: String,
  pub position: String,
  pub department: Department,
  pub email: String,
  pub phone: String,
  pub extension: Option<String>,
  pub office_hours: Option<String>,
  pub languages_spoken: Option<String>,
  pub photo: Option<String>,
  pub bio: Option<String>,
}

impl ContactPersonHub {
  pub async fn public(&self) -> Result<Vec<ContactPerson>> {
    Ok(sqlx::query_as(
      "SELECT * FROM contact_persons WHERE is_public AND is_active ORDER BY display_order, name"
    ).fetch_all(&self.site.db).await?)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SocialMediaAccount {
  pub id: i32,
  pub platform: SocialPlatform,
  pub username: String,
  pub url: String,
  pub follower_count: Option<i32>,
  pub is_primary: bool,
}

/// Where a social account is meant to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialPlacement {
  Anywhere,
  Footer,
  Contact,
}

impl SocialMediaAccountHub {
  pub async fn active(&self, placement: SocialPlacement) -> Result<Vec<SocialMediaAccount>> {
    let placement_clause = match placement {
      SocialPlacement::Anywhere => "",
      SocialPlacement::Footer => " AND show_in_footer",
      SocialPlacement::Contact => " AND show_in_contact",
    };

    Ok(sqlx::query_as(&format!(
      "SELECT * FROM social_media_accounts WHERE is_active{} ORDER BY display_order, platform",
      placement_clause
    )).fetch_all(&self.site.db).await?)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn newsletter_opt_in_defaults_to_off() {
    let form: ContactInquiryForm = serde_json::from_value(serde_json::json!({
      "first_name": "Wanjiru",
      "last_name": "Kamau",
      "email": "wanjiru@example.com",
      "phone": "",
      "subject": "partnership",
      "message": "We'd like to sponsor a workshop.",
    })).unwrap();

    assert!(form.validate().is_ok());
    assert!(!form.subscribe_newsletter);
    assert_eq!(form.phone, None);
  }

  #[test]
  fn subject_must_be_a_known_inquiry_type() {
    let form: ContactInquiryForm = serde_json::from_value(serde_json::json!({
      "first_name": "Wanjiru",
      "last_name": "Kamau",
      "email": "wanjiru@example.com",
      "subject": "gossip",
      "message": "Hello",
    })).unwrap();

    let errors = Error::from(form.validate().unwrap_err()).field_errors().unwrap();
    assert!(errors.contains_key("subject"));
  }
}
