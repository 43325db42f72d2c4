use serde::{Deserialize, Serialize};
use super::*;

choices! {
  Gender as "gender" {
    Male => "male",
    Female => "female",
    Other => "other",
  }
}

choices! {
  EducationLevel as "education_level" {
    HighSchool => "high_school",
    College => "college",
    Vocational => "vocational",
    Other => "other",
  }
}

choices! {
  ApplicationStatus as "application_status" {
    Pending => "pending",
    UnderReview => "under_review",
    Approved => "approved",
    Rejected => "rejected",
    Waitlisted => "waitlisted",
  }
}

choices! {
  WorkshopType as "workshop_type" {
    LifeSkills => "life_skills",
    DigitalLiteracy => "digital_literacy",
    CareerGuidance => "career_guidance",
    Entrepreneurship => "entrepreneurship",
    Leadership => "leadership",
    Other => "other",
  }
}

choices! {
  Schedule as "schedule" {
    Weekdays => "weekdays",
    Weekends => "weekends",
    Evenings => "evenings",
    Flexible => "flexible",
  }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScholarshipApplicationForm {
  #[validate(length(min = 1, max = 100))]
  pub first_name: String,
  #[validate(length(min = 1, max = 100))]
  pub last_name: String,
  #[validate(email(message = "Enter a valid email address."))]
  pub email: String,
  #[validate(length(min = 1, max = 20))]
  pub phone: String,
  pub date_of_birth: UtcDate,
  #[validate(custom = "Gender::check")]
  pub gender: String,
  #[validate(length(min = 1, max = 100))]
  pub county: String,
  #[validate(length(min = 1, max = 100))]
  pub sub_county: String,
  #[validate(length(min = 1, max = 100))]
  pub ward: String,
  #[validate(length(min = 1, max = 100))]
  pub village: String,
  #[validate(custom = "EducationLevel::check")]
  pub education_level: String,
  #[validate(length(min = 1, max = 200))]
  pub current_school: String,
  #[validate(length(min = 1, max = 50))]
  pub class_year: String,
  #[validate(length(min = 1))]
  pub previous_grades: String,
  #[validate(length(min = 1, max = 100))]
  pub family_income: String,
  #[validate(range(min = 0))]
  pub family_size: i32,
  #[validate(length(min = 1, max = 200))]
  pub guardian_name: String,
  #[validate(length(min = 1, max = 100))]
  pub guardian_occupation: String,
  #[validate(length(min = 1, max = 20))]
  pub guardian_phone: String,
  #[validate(length(min = 1, max = 1000))]
  pub why_deserve_scholarship: String,
  #[validate(length(min = 1, max = 1000))]
  pub career_goals: String,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(length(max = 1000))]
  pub community_involvement: Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub academic_transcripts: Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub recommendation_letter: Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub financial_documents: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ScholarshipApplication {
  pub id: i32,
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub education_level: EducationLevel,
  pub status: ApplicationStatus,
  pub scholarship_amount: Option<Decimal>,
  pub created_at: UtcDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApplicationCounts {
  pub total: i64,
  pub pending: i64,
  pub approved: i64,
}

impl ScholarshipApplicationHub {
  pub async fn create(&self, form: ScholarshipApplicationForm) -> Result<ScholarshipApplication> {
    form.validate()?;
    let gender: Gender = form.gender.parse()?;
    let education_level: EducationLevel = form.education_level.parse()?;

    Ok(sqlx::query_as(
      "INSERT INTO scholarship_applications (
        first_name, last_name, email, phone, date_of_birth, gender, county, sub_county, ward,
        village, education_level, current_school, class_year, previous_grades, family_income,
        family_size, guardian_name, guardian_occupation, guardian_phone, why_deserve_scholarship,
        career_goals, community_involvement, academic_transcripts, recommendation_letter,
        financial_documents
      ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
        $19, $20, $21, $22, $23, $24, $25)
      RETURNING *"
    )
      .bind(form.first_name)
      .bind(form.last_name)
      .bind(form.email)
      .bind(form.phone)
      .bind(form.date_of_birth)
      .bind(gender)
      .bind(form.county)
      .bind(form.sub_county)
      .bind(form.ward)
      .bind(form.village)
      .bind(education_level)
      .bind(form.current_school)
      .bind(form.class_year)
      .bind(form.previous_grades)
      .bind(form.family_income)
      .bind(form.family_size)
      .bind(form.guardian_name)
      .bind(form.guardian_occupation)
      .bind(form.guardian_phone)
      .bind(form.why_deserve_scholarship)
      .bind(form.career_goals)
      .bind(form.community_involvement)
      .bind(form.academic_transcripts)
      .bind(form.recommendation_letter)
      .bind(form.financial_documents)
      .fetch_one(&self.site.db)
      .await?)
  }

  pub async fn counts_for_email(&self, email: &str) -> Result<ApplicationCounts> {
    Ok(sqlx::query_as(
      "SELECT
        COUNT(*) AS total,
        COUNT(*) FILTER (WHERE status = 'pending') AS pending,
        COUNT(*) FILTER (WHERE status = 'approved') AS approved
      FROM scholarship_applications WHERE email = $1"
    ).bind(email).fetch_one(&self.site.db).await?)
  }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WorkshopRegistrationForm {
  #[validate(length(min = 1, max = 100))]
  pub first_name: String,
  #[validate(length(min = 1, max = 100))]
  pub last_name: String,
  #[validate(email(message = "Enter a valid email address."))]
  pub email: String,
  #[validate(length(min = 1, max = 20))]
  pub phone: String,
  #[validate(range(min = 0, max = 150))]
  pub age: i32,
  #[validate(custom = "Gender::check")]
  pub gender: String,
  #[validate(length(min = 1, max = 100))]
  pub county: String,
  #[validate(length(min = 1, max = 100))]
  pub sub_county: String,
  #[validate(custom = "WorkshopType::check")]
  pub workshop_type: String,
  #[validate(custom = "Schedule::check")]
  pub preferred_schedule: String,
  #[validate(length(min = 1, max = 100))]
  pub education_level: String,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(length(max = 100))]
  pub current_occupation: Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub previous_experience: Option<String>,
  #[validate(length(min = 1, max = 500))]
  pub expectations: String,
}

impl WorkshopRegistrationHub {
  pub async fn create(&self, form: WorkshopRegistrationForm) -> Result<i32> {
    form.validate()?;
    let gender: Gender = form.gender.parse()?;
    let workshop_type: WorkshopType = form.workshop_type.parse()?;
    let schedule: Schedule = form.preferred_schedule.parse()?;

    let (id,): (i32,) = sqlx::query_as(
      "INSERT INTO workshop_registrations (
        first_name, last_name, email, phone, age, gender, county, sub_county, workshop_type,
        preferred_schedule, education_level, current_occupation, previous_experience, expectations
      ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
      RETURNING id"
    )
      .bind(form.first_name)
      .bind(form.last_name)
      .bind(form.email)
      .bind(form.phone)
      .bind(form.age)
      .bind(gender)
      .bind(form.county)
      .bind(form.sub_county)
      .bind(workshop_type)
      .bind(schedule)
      .bind(form.education_level)
      .bind(form.current_occupation)
      .bind(form.previous_experience)
      .bind(form.expectations)
      .fetch_one(&self.site.db)
      .await?;

    Ok(id)
  }
}
