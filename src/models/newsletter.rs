use serde::Deserialize;
use super::*;

choices! {
  NewsletterFrequency as "newsletter_frequency" {
    Weekly => "weekly",
    Monthly => "monthly",
    Quarterly => "quarterly",
  }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewsletterForm {
  #[validate(email(message = "Enter a valid email address."))]
  pub email: String,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(length(max = 100))]
  pub first_name: Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(length(max = 100))]
  pub last_name: Option<String>,
  #[serde(default)]
  pub interests: Option<Vec<String>>,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(custom = "NewsletterFrequency::check")]
  pub frequency: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
  Created(i32),
  AlreadySubscribed,
}

impl NewsletterHub {
  /// A second signup for the same address never creates a second row.
  pub async fn subscribe(&self, form: NewsletterForm, source: Option<&str>) -> Result<Subscription> {
    form.validate()?;
    let frequency = parse_optional::<NewsletterFrequency>(&form.frequency)?
      .unwrap_or(NewsletterFrequency::Monthly);

    let inserted: Option<(i32,)> = sqlx::query_as(
      "INSERT INTO newsletters (email, first_name, last_name, interests, frequency, subscription_source)
      VALUES ($1, $2, $3, $4, $5, $6)
      ON CONFLICT (email) DO NOTHING
      RETURNING id"
    )
      .bind(form.email)
      .bind(form.first_name)
      .bind(form.last_name)
      .bind(form.interests.map(sqlx::types::Json))
      .bind(frequency)
      .bind(source)
      .fetch_optional(&self.site.db)
      .await?;

    Ok(match inserted {
      Some((id,)) => Subscription::Created(id),
      None => Subscription::AlreadySubscribed,
    })
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn only_an_email_is_required() {
    let form: NewsletterForm = serde_json::from_str(r#"{"email": "reader@example.com", "frequency": ""}"#).unwrap();
    assert!(form.validate().is_ok());
    assert_eq!(form.frequency, None);
  }

  #[test]
  fn rejects_unknown_frequencies_and_bad_emails() {
    let form: NewsletterForm = serde_json::from_str(r#"{"email": "nope", "frequency": "daily"}"#).unwrap();
    let errors = Error::from(form.validate().unwrap_err()).field_errors().unwrap();
    assert_eq!(errors["email"], vec!["Enter a valid email address.".to_string()]);
    assert!(errors.contains_key("frequency"));
  }
}
