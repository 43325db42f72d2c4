use serde::Serialize;
use super::*;

choices! {
  ProgramType as "program_type" {
    Scholarship => "scholarship",
    Workshop => "workshop",
    Community => "community",
    Other => "other",
  }
}

choices! {
  ProjectStatus as "project_status" {
    Planning => "planning",
    Active => "active",
    Completed => "completed",
    OnHold => "on_hold",
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Program {
  pub id: i32,
  pub name: String,
  pub slug: String,
  pub program_type: ProgramType,
  pub short_description: String,
  pub full_description: String,
  pub image: String,
  pub icon: String,
  pub color: String,
  pub beneficiaries_count: i32,
  pub success_rate: i32,
  pub eligibility_criteria: Option<String>,
  pub application_process: Option<String>,
  pub requirements: Option<String>,
  pub is_accepting_applications: bool,
  pub application_deadline: Option<UtcDate>,
}

/// A program with a few of its stories, as shown on its own page.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramDetail {
  #[serde(flatten)]
  pub program: Program,
  pub success_stories: Vec<SuccessStory>,
}

impl ProgramHub {
  pub async fn active(&self) -> Result<Vec<Program>> {
    Ok(sqlx::query_as("SELECT * FROM programs WHERE is_active ORDER BY display_order, id")
      .fetch_all(&self.site.db)
      .await?)
  }

  pub async fn find_by_slug(&self, slug: &str) -> Result<Program> {
    sqlx::query_as("SELECT * FROM programs WHERE is_active AND slug = $1")
      .bind(slug)
      .fetch_optional(&self.site.db)
      .await?
      .ok_or_else(|| Error::not_found("Program"))
  }

  pub async fn detail(&self, slug: &str) -> Result<ProgramDetail> {
    let program = self.find_by_slug(slug).await?;
    let success_stories = self.site.success_story().for_program(program.id, 3).await?;
    Ok(ProgramDetail { program, success_stories })
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SuccessStory {
  pub id: i32,
  pub name: String,
  #[serde(skip)]
  pub program_id: i32,
  pub program_name: String,
  pub title: String,
  pub story: String,
  pub profile_image: String,
  pub before_image: Option<String>,
  pub after_image: Option<String>,
  pub video_url: Option<String>,
  pub age: Option<i32>,
  pub location: String,
  pub current_status: String,
  pub achievements: String,
  pub impact_metrics: Option<String>,
  pub is_featured: bool,
  pub publish_date: UtcDate,
}

const STORIES: &str = "SELECT s.*, p.name AS program_name FROM success_stories s \
  JOIN programs p ON p.id = s.program_id WHERE s.is_active";

impl SuccessStoryHub {
  pub async fn active(&self) -> Result<Vec<SuccessStory>> {
    Ok(sqlx::query_as(&format!("{} ORDER BY s.publish_date DESC, s.display_order", STORIES))
      .fetch_all(&self.site.db)
      .await?)
  }

  pub async fn featured(&self, limit: Option<i64>) -> Result<Vec<SuccessStory>> {
    Ok(sqlx::query_as(&format!(
      "{} AND s.is_featured ORDER BY s.publish_date DESC, s.display_order LIMIT $1",
      STORIES
    ))
      .bind(limit)
      .fetch_all(&self.site.db)
      .await?)
  }

  pub async fn for_program(&self, program_id: i32, limit: i64) -> Result<Vec<SuccessStory>> {
    Ok(sqlx::query_as(&format!(
      "{} AND s.program_id = $1 ORDER BY s.publish_date DESC, s.display_order LIMIT $2",
      STORIES
    ))
      .bind(program_id)
      .bind(limit)
      .fetch_all(&self.site.db)
      .await?)
  }

  pub async fn find_by_id(&self, id: i32) -> Result<SuccessStory> {
    sqlx::query_as(&format!("{} AND s.id = $1", STORIES))
      .bind(id)
      .fetch_optional(&self.site.db)
      .await?
      .ok_or_else(|| Error::not_found("Success story"))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ProjectLocation {
  pub id: i32,
  pub name: String,
  pub county: String,
  pub sub_county: String,
  pub ward: String,
  pub latitude: Decimal,
  pub longitude: Decimal,
  pub project_types: String,
  pub description: String,
  pub beneficiaries_count: i32,
  pub start_date: UtcDate,
  pub main_image: String,
  pub gallery_images: Option<String>,
  pub status: ProjectStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ImpactMetrics {
  pub total_beneficiaries: i64,
  pub total_projects: i64,
  pub total_stories: i64,
  pub active_locations: i64,
}

impl ProjectLocationHub {
  pub async fn active(&self) -> Result<Vec<ProjectLocation>> {
    Ok(sqlx::query_as("SELECT * FROM project_locations WHERE is_active ORDER BY county, name")
      .fetch_all(&self.site.db)
      .await?)
  }

  /// Beneficiaries and project counts come from active locations only.
  pub async fn impact_metrics(&self) -> Result<ImpactMetrics> {
    Ok(sqlx::query_as(
      "SELECT
        COALESCE(SUM(beneficiaries_count), 0)::int8 AS total_beneficiaries,
        COUNT(*) AS total_projects,
        (SELECT COUNT(*) FROM success_stories WHERE is_active) AS total_stories,
        COUNT(*) FILTER (WHERE status = 'active') AS active_locations
      FROM project_locations WHERE is_active"
    ).fetch_one(&self.site.db).await?)
  }
}
