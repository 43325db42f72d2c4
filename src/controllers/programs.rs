use rocket::{get, post, serde::Serialize, State};
use super::*;

#[get("/")]
pub async fn index(site: &State<Site>) -> JsonResult<Vec<Program>> {
  Ok(Json(site.program().active().await?))
}

#[get("/<slug>")]
pub async fn show(site: &State<Site>, slug: &str) -> JsonResult<ProgramDetail> {
  Ok(Json(site.program().detail(slug).await?))
}

#[post("/applications/scholarship", data = "<form>")]
pub async fn apply_for_scholarship(site: &State<Site>, form: Submission<'_, ScholarshipApplicationForm>) -> CreatedResult<Acknowledgement> {
  let application = site.scholarship_application().create(accept(form)?).await?;
  Ok(created(
    Acknowledgement::new("Application submitted successfully").with("application_id", application.id),
  ))
}

#[post("/registrations/workshop", data = "<form>")]
pub async fn register_for_workshop(site: &State<Site>, form: Submission<'_, WorkshopRegistrationForm>) -> CreatedResult<Acknowledgement> {
  let id = site.workshop_registration().create(accept(form)?).await?;
  Ok(created(
    Acknowledgement::new("Registration submitted successfully").with("registration_id", id),
  ))
}

#[get("/locations")]
pub async fn locations(site: &State<Site>) -> JsonResult<Vec<ProjectLocation>> {
  Ok(Json(site.project_location().active().await?))
}

#[get("/success-stories")]
pub async fn success_stories(site: &State<Site>) -> JsonResult<Vec<SuccessStory>> {
  Ok(Json(site.success_story().active().await?))
}

#[get("/success-stories/featured")]
pub async fn featured_success_stories(site: &State<Site>) -> JsonResult<Vec<SuccessStory>> {
  Ok(Json(site.success_story().featured(None).await?))
}

#[get("/success-stories/<id>")]
pub async fn success_story(site: &State<Site>, id: i32) -> JsonResult<SuccessStory> {
  Ok(Json(site.success_story().find_by_id(id).await?))
}

#[derive(Serialize)]
pub struct ProgramsOverview {
  programs: Vec<Program>,
  featured_stories: Vec<SuccessStory>,
}

#[get("/overview")]
pub async fn overview(site: &State<Site>) -> JsonResult<ProgramsOverview> {
  let data = async {
    Ok::<_, Error>(ProgramsOverview {
      programs: site.program().active().await?,
      featured_stories: site.success_story().featured(Some(6)).await?,
    })
  };
  Ok(Json(aggregate("Failed to fetch programs overview", data.await)?))
}

#[derive(Serialize)]
pub struct ImpactData {
  success_stories: Vec<SuccessStory>,
  impact_metrics: ImpactMetrics,
}

#[get("/impact-data")]
pub async fn impact_data(site: &State<Site>) -> JsonResult<ImpactData> {
  let data = async {
    Ok::<_, Error>(ImpactData {
      success_stories: site.success_story().active().await?,
      impact_metrics: site.project_location().impact_metrics().await?,
    })
  };
  Ok(Json(aggregate("Failed to fetch impact data", data.await)?))
}
