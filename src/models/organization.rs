use serde::Serialize;
use super::*;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Organization {
  pub name: String,
  pub tagline: String,
  pub mission: String,
  pub vision: String,
  pub values: String,
  pub story: String,
  pub email: String,
  pub phone: String,
  pub address: String,
  pub facebook_url: Option<String>,
  pub twitter_url: Option<String>,
  pub instagram_url: Option<String>,
  pub linkedin_url: Option<String>,
  pub youtube_url: Option<String>,
  pub logo: Option<String>,
  pub hero_image: Option<String>,
  pub created_at: UtcDateTime,
  pub updated_at: UtcDateTime,
}

impl OrganizationHub {
  /// The one organization profile row. It's created with its defaults on first read.
  pub async fn get(&self) -> Result<Organization> {
    sqlx::query("INSERT INTO organization DEFAULT VALUES ON CONFLICT (singleton) DO NOTHING")
      .execute(&self.site.db)
      .await?;

    Ok(sqlx::query_as::<_, Organization>("SELECT * FROM organization")
      .fetch_one(&self.site.db)
      .await?)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SiteConfiguration {
  pub maintenance_mode: bool,
  pub maintenance_message: Option<String>,
  #[serde(skip)]
  pub google_analytics_id: Option<String>,
  #[serde(skip)]
  pub facebook_pixel_id: Option<String>,
  pub whatsapp_number: String,
  pub emergency_contact: String,
  pub meta_title: String,
  pub meta_description: String,
  pub meta_keywords: Option<String>,
}

impl SiteConfigurationHub {
  pub async fn get(&self) -> Result<SiteConfiguration> {
    sqlx::query("INSERT INTO site_configuration DEFAULT VALUES ON CONFLICT (singleton) DO NOTHING")
      .execute(&self.site.db)
      .await?;

    Ok(sqlx::query_as::<_, SiteConfiguration>("SELECT * FROM site_configuration")
      .fetch_one(&self.site.db)
      .await?)
  }
}
