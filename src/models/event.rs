use serde::{Deserialize, Serialize};
use super::*;

choices! {
  EventType as "event_type" {
    Workshop => "workshop",
    Ceremony => "ceremony",
    Fundraising => "fundraising",
    Community => "community",
    Meeting => "meeting",
    Conference => "conference",
    Other => "other",
  }
}

choices! {
  EventStatus as "event_status" {
    Upcoming => "upcoming",
    Ongoing => "ongoing",
    Completed => "completed",
    Cancelled => "cancelled",
    Postponed => "postponed",
  }
}

choices! {
  AttendanceStatus as "attendance_status" {
    Registered => "registered",
    Confirmed => "confirmed",
    Attended => "attended",
    NoShow => "no_show",
    Cancelled => "cancelled",
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Event {
  pub id: i32,
  pub title: String,
  pub slug: String,
  pub description: String,
  pub event_type: EventType,
  pub start_date: UtcDateTime,
  pub end_date: UtcDateTime,
  pub venue: String,
  pub address: String,
  pub latitude: Option<Decimal>,
  pub longitude: Option<Decimal>,
  pub requires_registration: bool,
  pub registration_deadline: Option<UtcDateTime>,
  pub max_participants: Option<i32>,
  pub registration_fee: Decimal,
  pub featured_image: String,
  pub gallery_images: Option<String>,
  pub contact_person: Option<String>,
  pub contact_email: Option<String>,
  pub contact_phone: Option<String>,
  pub status: EventStatus,
  pub is_featured: bool,
  pub is_past: bool,
  pub is_today: bool,
  pub registrations_count: i64,
}

impl Event {
  /// Whether someone new may still sign up at `now`.
  pub fn check_registration_open(&self, now: UtcDateTime) -> Result<()> {
    if let Some(deadline) = self.registration_deadline {
      if now > deadline {
        return Err(Error::validation("event_slug", "Registration for this event has closed"));
      }
    }

    if let Some(max) = self.max_participants {
      if self.registrations_count >= i64::from(max) {
        return Err(Error::validation("event_slug", "This event is fully booked"));
      }
    }

    Ok(())
  }
}

const EVENTS: &str = "SELECT e.*,
    e.end_date < now() AS is_past,
    (e.start_date::date <= CURRENT_DATE AND CURRENT_DATE <= e.end_date::date) AS is_today,
    (SELECT COUNT(*) FROM event_registrations r
      WHERE r.event_id = e.id AND r.attendance_status IN ('registered', 'confirmed')) AS registrations_count
  FROM events e WHERE e.is_active";

/// The `?status=` filter of the events list: by start and end relative to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTiming {
  Upcoming,
  Past,
}

impl EventTiming {
  /// Unrecognized values don't filter at all.
  pub fn from_param(value: Option<&str>) -> Option<EventTiming> {
    match value {
      Some("upcoming") => Some(EventTiming::Upcoming),
      Some("past") => Some(EventTiming::Past),
      _ => None,
    }
  }
}

impl EventHub {
  pub async fn list(&self, event_type: Option<&str>, timing: Option<EventTiming>) -> Result<Vec<Event>> {
    let timing_clause = match timing {
      Some(EventTiming::Upcoming) => " AND e.start_date >= now()",
      Some(EventTiming::Past) => " AND e.end_date < now()",
      None => "",
    };

    Ok(sqlx::query_as(&format!(
      "{} AND ($1::text IS NULL OR e.event_type::text = $1){} ORDER BY e.start_date",
      EVENTS, timing_clause
    ))
      .bind(event_type)
      .fetch_all(&self.site.db)
      .await?)
  }

  pub async fn upcoming(&self, limit: Option<i64>) -> Result<Vec<Event>> {
    Ok(sqlx::query_as(&format!("{} AND e.start_date >= now() ORDER BY e.start_date LIMIT $1", EVENTS))
      .bind(limit)
      .fetch_all(&self.site.db)
      .await?)
  }

  pub async fn find_by_slug(&self, slug: &str) -> Result<Event> {
    sqlx::query_as(&format!("{} AND e.slug = $1", EVENTS))
      .bind(slug)
      .fetch_optional(&self.site.db)
      .await?
      .ok_or_else(|| Error::not_found("Event"))
  }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EventRegistrationForm {
  #[validate(length(min = 1, max = 50))]
  pub event_slug: String,
  #[validate(length(min = 1, max = 100))]
  pub first_name: String,
  #[validate(length(min = 1, max = 100))]
  pub last_name: String,
  #[validate(email(message = "Enter a valid email address."))]
  pub email: String,
  #[validate(length(min = 1, max = 20))]
  pub phone: String,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(length(max = 200))]
  pub organization: Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub dietary_requirements: Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub special_needs: Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub comments: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
  Created(i32),
  AlreadyRegistered,
}

impl EventRegistrationHub {
  /// Signs someone up once per event. Capacity is counted while the event row is locked.
  pub async fn register(&self, form: EventRegistrationForm) -> Result<Registration> {
    form.validate()?;
    let event = self.site.event().find_by_slug(&form.event_slug).await?;
    let event_id = event.id;

    let mut tx = self.site.db.begin().await?;
    sqlx::query("SELECT id FROM events WHERE id = $1 FOR UPDATE")
      .bind(event_id)
      .execute(&mut *tx)
      .await?;

    let existing: Option<(i32,)> = sqlx::query_as(
      "SELECT id FROM event_registrations WHERE event_id = $1 AND lower(email) = lower($2)"
    )
      .bind(event_id)
      .bind(&form.email)
      .fetch_optional(&mut *tx)
      .await?;

    if existing.is_some() {
      return Ok(Registration::AlreadyRegistered);
    }

    let (registrations_count,): (i64,) = sqlx::query_as(
      "SELECT COUNT(*) FROM event_registrations
      WHERE event_id = $1 AND attendance_status IN ('registered', 'confirmed')"
    )
      .bind(event_id)
      .fetch_one(&mut *tx)
      .await?;

    Event { registrations_count, ..event }.check_registration_open(Utc::now())?;

    let inserted: Option<(i32,)> = sqlx::query_as(
      "INSERT INTO event_registrations (
        event_id, first_name, last_name, email, phone, organization, dietary_requirements,
        special_needs, comments
      ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
      ON CONFLICT (event_id, email) DO NOTHING
      RETURNING id"
    )
      .bind(event_id)
      .bind(form.first_name)
      .bind(form.last_name)
      .bind(form.email)
      .bind(form.phone)
      .bind(form.organization)
      .bind(form.dietary_requirements)
      .bind(form.special_needs)
      .bind(form.comments)
      .fetch_optional(&mut *tx)
      .await?;

    tx.commit().await?;

    Ok(match inserted {
      Some((id,)) => Registration::Created(id),
      None => Registration::AlreadyRegistered,
    })
  }
}
