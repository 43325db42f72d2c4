use rocket::{get, patch, post, serde::Serialize, State};
use super::*;

#[derive(Serialize)]
pub struct Registered {
  message: &'static str,
  user_id: i32,
  token: String,
}

#[post("/register", data = "<form>")]
pub async fn register(site: &State<Site>, form: Submission<'_, RegistrationForm>) -> CreatedResult<Registered> {
  let (user, token) = site.user().register(accept(form)?).await?;
  info!("Registered {} as {}", user.username, user.user_type);
  Ok(created(Registered { message: "User registered successfully", user_id: user.id, token }))
}

#[derive(Serialize)]
pub struct LoggedIn {
  message: &'static str,
  token: String,
  user: User,
}

#[post("/login", data = "<form>")]
pub async fn login(site: &State<Site>, form: Submission<'_, LoginForm>) -> JsonResult<LoggedIn> {
  let (user, token) = site.user().login(accept(form)?).await?;
  Ok(Json(LoggedIn { message: "Login successful", token, user }))
}

#[post("/logout")]
pub async fn logout(site: &State<Site>, session: Session) -> JsonResult<Acknowledgement> {
  site.auth_token().revoke(session.0.id).await?;
  Ok(Json(Acknowledgement::new("Logout successful")))
}

#[get("/profile")]
pub async fn profile(session: Session) -> Json<User> {
  Json(session.0)
}

#[patch("/profile", data = "<form>")]
pub async fn update_profile(site: &State<Site>, session: Session, form: Submission<'_, ProfileForm>) -> JsonResult<User> {
  Ok(Json(site.user().update_profile(&session.0, accept(form)?).await?))
}

#[get("/dashboard")]
pub async fn dashboard(site: &State<Site>, session: Session) -> JsonResult<Dashboard> {
  Ok(Json(site.user().dashboard(session.0).await?))
}
