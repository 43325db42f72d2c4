use serde::Serialize;
use super::*;

choices! {
  TestimonialProgram as "testimonial_program" {
    Scholarship => "scholarship",
    Workshop => "workshop",
    Community => "community",
    General => "general",
  }
}

choices! {
  FaqCategory as "faq_category" {
    General => "general",
    Scholarships => "scholarships",
    Donations => "donations",
    Volunteering => "volunteering",
    Programs => "programs",
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ImpactStatistic {
  pub id: i32,
  pub title: String,
  pub value: String,
  pub description: String,
  pub icon: String,
  pub color: String,
  #[serde(rename = "order")]
  pub display_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct TeamMember {
  pub id: i32,
  pub name: String,
  pub position: String,
  pub bio: String,
  pub photo: String,
  pub email: Option<String>,
  pub linkedin_url: Option<String>,
  #[serde(rename = "order")]
  pub display_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Partner {
  pub id: i32,
  pub name: String,
  pub description: String,
  pub logo: String,
  pub website_url: Option<String>,
  pub partnership_type: OrganizationType,
  #[serde(rename = "order")]
  pub display_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Testimonial {
  pub id: i32,
  pub name: String,
  pub position: String,
  pub content: String,
  pub photo: String,
  pub program_type: TestimonialProgram,
  pub rating: i32,
  pub is_featured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Faq {
  pub id: i32,
  pub question: String,
  pub answer: String,
  pub category: FaqCategory,
}

impl ImpactStatisticHub {
  pub async fn active(&self) -> Result<Vec<ImpactStatistic>> {
    Ok(sqlx::query_as(
      "SELECT * FROM impact_statistics WHERE is_active ORDER BY display_order, id"
    ).fetch_all(&self.site.db).await?)
  }
}

impl TeamMemberHub {
  pub async fn active(&self) -> Result<Vec<TeamMember>> {
    Ok(sqlx::query_as(
      "SELECT * FROM team_members WHERE is_active ORDER BY display_order, id"
    ).fetch_all(&self.site.db).await?)
  }
}

impl PartnerHub {
  pub async fn active(&self) -> Result<Vec<Partner>> {
    Ok(sqlx::query_as(
      "SELECT * FROM partners WHERE is_active ORDER BY display_order, id"
    ).fetch_all(&self.site.db).await?)
  }
}

impl TestimonialHub {
  pub async fn active(&self) -> Result<Vec<Testimonial>> {
    Ok(sqlx::query_as(
      "SELECT * FROM testimonials WHERE is_active ORDER BY display_order, id"
    ).fetch_all(&self.site.db).await?)
  }

  /// Featured testimonials, optionally capped for page sections.
  pub async fn featured(&self, limit: Option<i64>) -> Result<Vec<Testimonial>> {
    Ok(sqlx::query_as(
      "SELECT * FROM testimonials WHERE is_active AND is_featured ORDER BY display_order, id LIMIT $1"
    ).bind(limit).fetch_all(&self.site.db).await?)
  }
}

impl FaqHub {
  pub async fn active(&self, category: Option<FaqCategory>) -> Result<Vec<Faq>> {
    Ok(sqlx::query_as(
      "SELECT * FROM faqs WHERE is_active AND ($1::faq_category IS NULL OR category = $1) ORDER BY display_order, id"
    ).bind(category).fetch_all(&self.site.db).await?)
  }
}
