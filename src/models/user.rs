use pbkdf2::{
  password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Params, Pbkdf2,
};
use serde::{Deserialize, Serialize};
use super::*;

choices! {
  UserType as "user_type" {
    Admin => "admin",
    Staff => "staff",
    Volunteer => "volunteer",
    Donor => "donor",
    Beneficiary => "beneficiary",
  }
}

pub const PASSWORD_ROUNDS: u32 = 260_000;

/// Encodes as a PHC string: `$pbkdf2-sha256$i=<rounds>,l=32$<salt>$<hash>`.
pub fn hash_password_with(password: &str, rounds: u32) -> Result<String> {
  let salt = SaltString::encode_b64(uuid::Uuid::new_v4().as_bytes())
    .map_err(|e| Error::PasswordHash(e.to_string()))?;
  let params = Params { rounds, output_length: 32 };

  Ok(
    Pbkdf2
      .hash_password_customized(password.as_bytes(), None, None, params, &salt)
      .map_err(|e| Error::PasswordHash(e.to_string()))?
      .to_string(),
  )
}

pub fn hash_password(password: &str) -> Result<String> {
  hash_password_with(password, PASSWORD_ROUNDS)
}

pub fn verify_password(password: &str, encoded: &str) -> bool {
  match PasswordHash::new(encoded) {
    Ok(parsed) => Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok(),
    Err(_) => false,
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
  pub id: i32,
  pub username: String,
  pub email: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub first_name: String,
  pub last_name: String,
  pub phone: Option<String>,
  pub organization: Option<String>,
  pub bio: Option<String>,
  pub profile_picture: Option<String>,
  pub user_type: UserType,
  pub newsletter_subscribed: bool,
  pub email_notifications: bool,
  pub last_login: Option<UtcDateTime>,
  #[serde(rename = "date_joined")]
  pub created_at: UtcDateTime,
}

impl User {
  pub fn is_admin(&self) -> bool {
    self.user_type == UserType::Admin
  }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegistrationForm {
  #[validate(length(min = 1, max = 150))]
  pub username: String,
  #[validate(email(message = "Enter a valid email address."))]
  pub email: String,
  #[validate(length(min = 8, message = "Ensure this field has at least 8 characters."))]
  pub password: String,
  pub password_confirm: String,
  #[serde(default)]
  #[validate(length(max = 150))]
  pub first_name: String,
  #[serde(default)]
  #[validate(length(max = 150))]
  pub last_name: String,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(length(max = 20))]
  pub phone: Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  #[validate(custom = "UserType::check")]
  pub user_type: Option<String>,
}

impl RegistrationForm {
  pub fn user_type(&self) -> Result<UserType> {
    if self.password != self.password_confirm {
      return Err(Error::validation("password_confirm", "Passwords don't match."));
    }

    match parse_optional::<UserType>(&self.user_type)?.unwrap_or(UserType::Donor) {
      UserType::Admin | UserType::Staff => {
        Err(Error::validation("user_type", "This account type cannot be self-registered."))
      }
      user_type => Ok(user_type),
    }
  }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginForm {
  #[validate(length(min = 1))]
  pub username: String,
  #[validate(length(min = 1))]
  pub password: String,
}

/// A partial profile update. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileForm {
  #[validate(length(max = 150))]
  pub first_name: Option<String>,
  #[validate(length(max = 150))]
  pub last_name: Option<String>,
  #[validate(length(max = 20))]
  pub phone: Option<String>,
  #[validate(length(max = 200))]
  pub organization: Option<String>,
  pub bio: Option<String>,
  #[validate(length(max = 255))]
  pub profile_picture: Option<String>,
  pub newsletter_subscribed: Option<bool>,
  pub email_notifications: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DashboardExtras {
  Donor { recent_donations: i64, total_donated: Decimal },
  Volunteer { volunteer_hours: i32, projects_participated: i32 },
  Beneficiary { scholarship_applications: i64, approved_scholarships: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
  pub user: User,
  pub notifications: Vec<serde_json::Value>,
  pub recent_activities: Vec<serde_json::Value>,
  #[serde(flatten)]
  pub extras: Option<DashboardExtras>,
}

impl UserHub {
  /// Creates the account and its API token.
  pub async fn register(&self, form: RegistrationForm) -> Result<(User, String)> {
    form.validate()?;
    let user_type = form.user_type()?;

    let user: User = sqlx::query_as(
      "INSERT INTO users (username, email, password_hash, first_name, last_name, phone, user_type)
      VALUES ($1, $2, $3, $4, $5, $6, $7)
      RETURNING *"
    )
      .bind(&form.username)
      .bind(&form.email)
      .bind(hash_password(&form.password)?)
      .bind(&form.first_name)
      .bind(&form.last_name)
      .bind(&form.phone)
      .bind(user_type)
      .fetch_one(&self.site.db)
      .await?;

    let token = self.site.auth_token().for_user(user.id).await?;
    Ok((user, token))
  }

  pub async fn login(&self, form: LoginForm) -> Result<(User, String)> {
    form.validate()?;

    let maybe_user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1 AND is_active")
      .bind(&form.username)
      .fetch_optional(&self.site.db)
      .await?;

    let user = match maybe_user {
      Some(user) if verify_password(&form.password, &user.password_hash) => user,
      _ => return Err(Error::validation("non_field_errors", "Invalid credentials")),
    };

    let user: User = sqlx::query_as("UPDATE users SET last_login = now() WHERE id = $1 RETURNING *")
      .bind(user.id)
      .fetch_one(&self.site.db)
      .await?;

    let token = self.site.auth_token().for_user(user.id).await?;
    Ok((user, token))
  }

  pub async fn update_profile(&self, user: &User, form: ProfileForm) -> Result<User> {
    form.validate()?;

    Ok(sqlx::query_as(
      "UPDATE users SET
        first_name = COALESCE($2, first_name),
        last_name = COALESCE($3, last_name),
        phone = COALESCE($4, phone),
        organization = COALESCE($5, organization),
        bio = COALESCE($6, bio),
        profile_picture = COALESCE($7, profile_picture),
        newsletter_subscribed = COALESCE($8, newsletter_subscribed),
        email_notifications = COALESCE($9, email_notifications),
        updated_at = now()
      WHERE id = $1
      RETURNING *"
    )
      .bind(user.id)
      .bind(form.first_name)
      .bind(form.last_name)
      .bind(form.phone)
      .bind(form.organization)
      .bind(form.bio)
      .bind(form.profile_picture)
      .bind(form.newsletter_subscribed)
      .bind(form.email_notifications)
      .fetch_one(&self.site.db)
      .await?)
  }

  pub async fn dashboard(&self, user: User) -> Result<Dashboard> {
    let extras = match user.user_type {
      UserType::Donor => {
        let summary = self.site.donation().summary_for_donor(&user.email).await?;
        Some(DashboardExtras::Donor {
          recent_donations: summary.donation_count,
          total_donated: summary.completed_total,
        })
      }
      UserType::Volunteer => self
        .site
        .volunteer()
        .record_for_email(&user.email)
        .await?
        .map(|record| DashboardExtras::Volunteer {
          volunteer_hours: record.hours_contributed,
          projects_participated: record.projects_participated,
        }),
      UserType::Beneficiary => {
        let counts = self.site.scholarship_application().counts_for_email(&user.email).await?;
        Some(DashboardExtras::Beneficiary {
          scholarship_applications: counts.total,
          approved_scholarships: counts.approved,
        })
      }
      UserType::Admin | UserType::Staff => None,
    };

    Ok(Dashboard { user, notifications: vec![], recent_activities: vec![], extras })
  }
}

/// The token part of an `Authorization` header, which may use either scheme.
pub fn token_from_header(header: &str) -> Option<&str> {
  let header = header.trim();
  header
    .strip_prefix("Bearer ")
    .or_else(|| header.strip_prefix("Token "))
    .map(str::trim)
    .filter(|token| !token.is_empty())
}

impl AuthTokenHub {
  /// The user's token, created on first use.
  pub async fn for_user(&self, user_id: i32) -> Result<String> {
    let (value,): (String,) = sqlx::query_as(
      "INSERT INTO auth_tokens (user_id, value) VALUES ($1, $2)
      ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
      RETURNING value"
    )
      .bind(user_id)
      .bind(gen_passphrase())
      .fetch_one(&self.site.db)
      .await?;
    Ok(value)
  }

  pub async fn user(&self, token: &str) -> Result<User> {
    sqlx::query_as(
      "SELECT users.* FROM users
      JOIN auth_tokens ON auth_tokens.user_id = users.id
      WHERE auth_tokens.value = $1 AND users.is_active"
    )
      .bind(token)
      .fetch_optional(&self.site.db)
      .await?
      .ok_or(Error::Unauthorized)
  }

  pub async fn revoke(&self, user_id: i32) -> Result<()> {
    sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
      .bind(user_id)
      .execute(&self.site.db)
      .await?;
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn passwords_verify_against_their_hash() {
    let encoded = hash_password_with("correct horse", 1_000).unwrap();
    assert!(encoded.starts_with("$pbkdf2-sha256$i=1000,l=32$"));
    assert!(verify_password("correct horse", &encoded));
    assert!(!verify_password("battery staple", &encoded));
    assert!(!verify_password("correct horse ", &encoded));
  }

  #[test]
  fn malformed_hashes_never_verify() {
    assert!(!verify_password("anything", ""));
    assert!(!verify_password("anything", "md5$1$salt$abc"));
    assert!(!verify_password("anything", "pbkdf2_sha256$1000$salt$abc"));
    assert!(!verify_password("anything", "$pbkdf2-sha256$i=lots,l=32$c2FsdHNhbHQ$YWJj"));
  }

  #[test]
  fn tampered_hashes_never_verify() {
    let encoded = hash_password_with("correct horse", 1_000).unwrap();
    let (rest, digest) = encoded.rsplit_once('$').unwrap();
    let flipped = if digest.starts_with('A') { "B" } else { "A" };
    let tampered = format!("{}${}{}", rest, flipped, &digest[1..]);
    assert!(!verify_password("correct horse", &tampered));
  }

  #[test]
  fn fresh_hashes_are_salted() {
    assert_ne!(
      hash_password_with("same password", 1_000).unwrap(),
      hash_password_with("same password", 1_000).unwrap()
    );
  }

  #[test]
  fn both_header_schemes_carry_a_token() {
    assert_eq!(token_from_header("Bearer abc+def"), Some("abc+def"));
    assert_eq!(token_from_header("Token abc+def"), Some("abc+def"));
    assert_eq!(token_from_header("Basic dXNlcjpwYXNz"), None);
    assert_eq!(token_from_header("Bearer "), None);
  }

  #[test]
  fn registration_rules() {
    let form = |extra: serde_json::Value| -> RegistrationForm {
      let mut base = serde_json::json!({
        "username": "nafula",
        "email": "nafula@example.com",
        "password": "s3cret-pass",
        "password_confirm": "s3cret-pass",
      });
      if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
        base.extend(extra.clone());
      }
      serde_json::from_value(base).unwrap()
    };

    assert_eq!(form(serde_json::json!({})).user_type().unwrap(), UserType::Donor);
    assert_eq!(
      form(serde_json::json!({ "user_type": "volunteer" })).user_type().unwrap(),
      UserType::Volunteer
    );
    assert!(form(serde_json::json!({ "user_type": "admin" })).user_type().is_err());

    let mismatch = form(serde_json::json!({ "password_confirm": "other-pass" })).user_type().unwrap_err();
    assert!(mismatch.field_errors().unwrap().contains_key("password_confirm"));

    assert!(form(serde_json::json!({ "password": "short", "password_confirm": "short" })).validate().is_err());
  }

  #[test]
  fn dashboards_flatten_role_extras() {
    let user = User {
      id: 1,
      username: "nafula".into(),
      email: "nafula@example.com".into(),
      password_hash: "$pbkdf2-sha256$i=1000,l=32$c2FsdHNhbHQ$aGFzaA".into(),
      first_name: "Mary".into(),
      last_name: "Nafula".into(),
      phone: None,
      organization: None,
      bio: None,
      profile_picture: None,
      user_type: UserType::Volunteer,
      newsletter_subscribed: true,
      email_notifications: true,
      last_login: None,
      created_at: Utc::now(),
    };

    let dashboard = Dashboard {
      user,
      notifications: vec![],
      recent_activities: vec![],
      extras: Some(DashboardExtras::Volunteer { volunteer_hours: 12, projects_participated: 3 }),
    };

    let json = serde_json::to_value(&dashboard).unwrap();
    assert_eq!(json["volunteer_hours"], 12);
    assert_eq!(json["user"]["user_type"], "volunteer");
    assert!(json["user"].get("password_hash").is_none());
  }
}
