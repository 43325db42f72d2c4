pub use chrono::{DateTime, NaiveDate, Utc};
pub use serde::{Deserialize, Deserializer, Serialize};
pub use sqlx::types::Decimal;
pub use validator::{Validate, ValidationError};
pub use crate::error::{Error, Result};

pub type UtcDateTime = DateTime<Utc>;
pub type UtcDate = NaiveDate;

/// Declares a closed set of accepted values, stored as a Postgres enum and
/// submitted as its snake_case string.
macro_rules! choices {
  ($(#[$meta:meta])* $name:ident as $pg:tt { $($variant:ident => $value:tt),+ $(,)? }) => {
    $(#[$meta])*
    #[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    #[sqlx(type_name = $pg)]
    pub enum $name {
      $(
        #[serde(rename = $value)]
        #[sqlx(rename = $value)]
        $variant,
      )+
    }

    impl $name {
      pub const ALL: &'static [$name] = &[$($name::$variant),+];

      pub fn as_str(&self) -> &'static str {
        match self {
          $($name::$variant => $value,)+
        }
      }

      pub fn check(value: &str) -> std::result::Result<(), validator::ValidationError> {
        value.parse::<$name>().map(|_| ()).map_err(|_| $crate::models::invalid_choice(value, &[$($value),+]))
      }

      #[allow(dead_code)]
      pub fn check_all(values: &[String]) -> std::result::Result<(), validator::ValidationError> {
        values.iter().try_for_each(|v| $name::check(v))
      }
    }

    impl std::str::FromStr for $name {
      type Err = $crate::error::Error;

      fn from_str(value: &str) -> $crate::error::Result<Self> {
        match value {
          $($value => Ok($name::$variant),)+
          _ => Err($crate::error::Error::validation(stringify!($name), &format!("\"{}\" is not a valid choice.", value))),
        }
      }
    }

    impl std::fmt::Display for $name {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
      }
    }
  };
}

/// Declares one query hub per entity, reachable from the site handle.
macro_rules! hubs {
  ($($method:ident => $hub:ident),* $(,)?) => {
    $(
      #[derive(Clone)]
      pub struct $hub {
        pub site: Site,
      }
    )*

    impl Site {
      $(
        pub fn $method(&self) -> $hub {
          $hub { site: self.clone() }
        }
      )*
    }
  };
}

pub mod site;
pub use site::*;
pub mod organization;
pub use organization::*;
pub mod catalog;
pub use catalog::*;
pub mod program;
pub use program::*;
pub mod application;
pub use application::*;
pub mod news;
pub use news::*;
pub mod event;
pub use event::*;
pub mod newsletter;
pub use newsletter::*;
pub mod contact;
pub use contact::*;
pub mod campaign;
pub use campaign::*;
pub mod donation;
pub use donation::*;
pub mod payment;
pub use payment::*;
pub mod volunteer;
pub use volunteer::*;
pub mod user;
pub use user::*;
pub mod mpesa;
pub mod card;

hubs! {
  organization => OrganizationHub,
  site_configuration => SiteConfigurationHub,
  impact_statistic => ImpactStatisticHub,
  team_member => TeamMemberHub,
  partner => PartnerHub,
  testimonial => TestimonialHub,
  faq => FaqHub,
  program => ProgramHub,
  success_story => SuccessStoryHub,
  project_location => ProjectLocationHub,
  scholarship_application => ScholarshipApplicationHub,
  workshop_registration => WorkshopRegistrationHub,
  news_category => NewsCategoryHub,
  news_article => NewsArticleHub,
  event => EventHub,
  event_registration => EventRegistrationHub,
  newsletter => NewsletterHub,
  contact_inquiry => ContactInquiryHub,
  office_location => OfficeLocationHub,
  contact_person => ContactPersonHub,
  social_media_account => SocialMediaAccountHub,
  campaign => CampaignHub,
  donation => DonationHub,
  volunteer => VolunteerHub,
  partnership => PartnershipHub,
  user => UserHub,
  auth_token => AuthTokenHub,
}

/// A failed call to a payment gateway, carrying what the gateway said.
pub fn gateway_error(context: &str, error: ureq::Error) -> Error {
  match error {
    ureq::Error::Status(code, response) => {
      Error::Gateway(format!("{} ({}): {}", context, code, response.into_string().unwrap_or_default()))
    }
    other => Error::Gateway(format!("{}: {}", context, other)),
  }
}

pub fn invalid_choice(value: &str, accepted: &[&str]) -> ValidationError {
  let mut error = ValidationError::new("invalid_choice");
  error.message = Some(
    format!("\"{}\" is not a valid choice. Expected one of: {}.", value, accepted.join(", ")).into(),
  );
  error
}

/// Front ends submit untouched optional inputs as "", which means "not given".
pub fn blank_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let value: Option<String> = Option::deserialize(deserializer)?;
  Ok(value.filter(|v| !v.trim().is_empty()))
}

pub fn parse_optional<T: std::str::FromStr<Err = Error>>(value: &Option<String>) -> Result<Option<T>> {
  value.as_deref().map(str::parse).transpose()
}

pub fn split_list(value: &Option<String>) -> Vec<String> {
  value
    .as_deref()
    .map(|v| v.split(',').map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect())
    .unwrap_or_default()
}

pub fn gen_passphrase() -> String {
  use chbs::{config::BasicConfig, prelude::*};
  let mut config = BasicConfig::default();
  config.words = 6;
  config.separator = "+".into();
  config.capitalize_first = false.into();
  config.to_scheme().generate()
}

/// The `{message, <entity>_id}` acknowledgement every public submission answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
  pub message: String,
  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Acknowledgement {
  pub fn new(message: &str) -> Self {
    Self { message: message.to_string(), extra: serde_json::Map::new() }
  }

  pub fn with<V: Serialize>(mut self, key: &str, value: V) -> Self {
    self.extra.insert(key.to_string(), serde_json::to_value(value).unwrap_or(serde_json::Value::Null));
    self
  }
}
