use rocket::{get, serde::Serialize, State};
use super::*;

#[get("/organization")]
pub async fn organization(site: &State<Site>) -> JsonResult<Organization> {
  Ok(Json(site.organization().get().await?))
}

#[get("/site-settings")]
pub async fn site_settings(site: &State<Site>) -> JsonResult<SiteConfiguration> {
  Ok(Json(site.site_configuration().get().await?))
}

#[get("/impact-statistics")]
pub async fn impact_statistics(site: &State<Site>) -> JsonResult<Vec<ImpactStatistic>> {
  Ok(Json(site.impact_statistic().active().await?))
}

#[get("/team-members")]
pub async fn team_members(site: &State<Site>) -> JsonResult<Vec<TeamMember>> {
  Ok(Json(site.team_member().active().await?))
}

#[get("/partners")]
pub async fn partners(site: &State<Site>) -> JsonResult<Vec<Partner>> {
  Ok(Json(site.partner().active().await?))
}

#[get("/testimonials")]
pub async fn testimonials(site: &State<Site>) -> JsonResult<Vec<Testimonial>> {
  Ok(Json(site.testimonial().active().await?))
}

#[get("/testimonials/featured")]
pub async fn featured_testimonials(site: &State<Site>) -> JsonResult<Vec<Testimonial>> {
  Ok(Json(site.testimonial().featured(None).await?))
}

/// An unknown category lists nothing rather than failing.
#[get("/faqs?<category>")]
pub async fn faqs(site: &State<Site>, category: Option<&str>) -> JsonResult<Vec<Faq>> {
  match category.map(str::parse::<FaqCategory>) {
    None => Ok(Json(site.faq().active(None).await?)),
    Some(Ok(category)) => Ok(Json(site.faq().active(Some(category)).await?)),
    Some(Err(_)) => Ok(Json(vec![])),
  }
}

#[derive(Serialize)]
pub struct HomepageData {
  organization: Organization,
  impact_statistics: Vec<ImpactStatistic>,
  featured_testimonials: Vec<Testimonial>,
}

#[get("/homepage-data")]
pub async fn homepage_data(site: &State<Site>) -> JsonResult<HomepageData> {
  let data = async {
    Ok::<_, Error>(HomepageData {
      organization: site.organization().get().await?,
      impact_statistics: site.impact_statistic().active().await?,
      featured_testimonials: site.testimonial().featured(Some(3)).await?,
    })
  };
  Ok(Json(aggregate("Failed to fetch homepage data", data.await)?))
}

#[derive(Serialize)]
pub struct AboutData {
  organization: Organization,
  team_members: Vec<TeamMember>,
  partners: Vec<Partner>,
}

#[get("/about-data")]
pub async fn about_data(site: &State<Site>) -> JsonResult<AboutData> {
  let data = async {
    Ok::<_, Error>(AboutData {
      organization: site.organization().get().await?,
      team_members: site.team_member().active().await?,
      partners: site.partner().active().await?,
    })
  };
  Ok(Json(aggregate("Failed to fetch about data", data.await)?))
}
