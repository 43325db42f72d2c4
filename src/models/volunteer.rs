use serde::Deserialize;
use super::*;

choices! {
  OrganizationType as "organization_type" {
    Corporate => "corporate",
    Educational => "educational",
    Government => "government",
    Ngo => "ngo",
    Foundation => "foundation",
    Other => "other",
  }
}

// Stored in a JSONB array, so there is no Postgres type behind it.
choices! {
  VolunteerInterest as "volunteer_interest" {
    Mentorship => "mentorship",
    Workshops => "workshops",
    Community => "community",
    Admin => "admin",
    Media => "media",
    Fundraising => "fundraising",
    Other => "other",
  }
}

choices! {
  VolunteerAvailability as "volunteer_availability" {
    Weekdays => "weekdays",
    Weekends => "weekends",
    Evenings => "evenings",
    Flexible => "flexible",
    Events => "events",
  }
}

choices! {
  VolunteerStatus as "volunteer_status" {
    Pending => "pending",
    Approved => "approved",
    Active => "active",
    Inactive => "inactive",
    Rejected => "rejected",
  }
}

choices! {
  PartnershipInterest as "partnership_interest" {
    Funding => "funding",
    Volunteer => "volunteer",
    Skills => "skills",
    Resources => "resources",
    Joint => "joint",
    Advocacy => "advocacy",
  }
}

choices! {
  PartnershipStatus as "partnership_status" {
    Pending => "pending",
    UnderReview => "under_review",
    Approved => "approved",
    Active => "active",
    Completed => "completed",
    Rejected => "rejected",
  }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VolunteerForm {
  #[validate(length(min = 1, max = 100))]
  pub first_name: String,
  #[validate(length(min = 1, max = 100))]
  pub last_name: String,
  #[validate(email(message = "Enter a valid email address."))]
  pub email: String,
  #[validate(length(min = 1, max = 20))]
  pub phone: String,
  #[validate(length(min = 1, max = 100))]
  pub location: String,
  #[validate(length(min = 1), custom = "VolunteerInterest::check_all")]
  pub interests: Vec<String>,
  #[validate(length(min = 1))]
  pub skills_experience: String,
  #[validate(custom = "VolunteerAvailability::check")]
  pub availability: String,
}

/// Hours and projects a volunteer has to show on their dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, sqlx::FromRow)]
pub struct VolunteerRecord {
  pub hours_contributed: i32,
  pub projects_participated: i32,
}

impl VolunteerHub {
  /// Stores an application as pending. Each email may apply once.
  pub async fn create(&self, form: VolunteerForm) -> Result<i32> {
    form.validate()?;
    let availability: VolunteerAvailability = form.availability.parse()?;

    if self.exists(&form.email).await? {
      return Err(Error::validation("email", "volunteer with this email already exists."));
    }

    let (id,): (i32,) = sqlx::query_as(
      "INSERT INTO volunteers (
        first_name, last_name, email, phone, location, interests, skills_experience, availability
      ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
      RETURNING id"
    )
      .bind(&form.first_name)
      .bind(&form.last_name)
      .bind(&form.email)
      .bind(&form.phone)
      .bind(&form.location)
      .bind(sqlx::types::Json(&form.interests))
      .bind(&form.skills_experience)
      .bind(availability)
      .fetch_one(&self.site.db)
      .await?;

    Ok(id)
  }

  pub async fn exists(&self, email: &str) -> Result<bool> {
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM volunteers WHERE email = $1)")
      .bind(email)
      .fetch_one(&self.site.db)
      .await?;
    Ok(exists)
  }

  pub async fn count_active(&self) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM volunteers WHERE status = 'active'")
      .fetch_one(&self.site.db)
      .await?;
    Ok(count)
  }

  pub async fn record_for_email(&self, email: &str) -> Result<Option<VolunteerRecord>> {
    Ok(sqlx::query_as(
      "SELECT hours_contributed, projects_participated FROM volunteers WHERE email = $1"
    ).bind(email).fetch_optional(&self.site.db).await?)
  }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PartnershipForm {
  #[validate(length(min = 1, max = 200))]
  pub organization_name: String,
  #[validate(custom = "OrganizationType::check")]
  pub organization_type: String,
  #[validate(length(min = 1, max = 100))]
  pub contact_person: String,
  #[validate(email(message = "Enter a valid email address."))]
  pub email: String,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(length(max = 20))]
  pub phone: Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(url(message = "Enter a valid URL."), length(max = 200))]
  pub website: Option<String>,
  #[validate(length(min = 1), custom = "PartnershipInterest::check_all")]
  pub partnership_interests: Vec<String>,
  #[validate(length(min = 1))]
  pub proposal_details: String,
}

impl PartnershipHub {
  pub async fn create(&self, form: PartnershipForm) -> Result<i32> {
    form.validate()?;
    let organization_type: OrganizationType = form.organization_type.parse()?;

    let (id,): (i32,) = sqlx::query_as(
      "INSERT INTO partnerships (
        organization_name, organization_type, contact_person, email, phone, website,
        partnership_interests, proposal_details
      ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
      RETURNING id"
    )
      .bind(&form.organization_name)
      .bind(organization_type)
      .bind(&form.contact_person)
      .bind(&form.email)
      .bind(&form.phone)
      .bind(&form.website)
      .bind(sqlx::types::Json(&form.partnership_interests))
      .bind(&form.proposal_details)
      .fetch_one(&self.site.db)
      .await?;

    Ok(id)
  }
}
