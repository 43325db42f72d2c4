use rocket::{get, post, serde::Serialize, State};
use super::*;

#[post("/inquiries", data = "<form>")]
pub async fn inquire(site: &State<Site>, form: Submission<'_, ContactInquiryForm>) -> CreatedResult<Acknowledgement> {
  let id = site.contact_inquiry().create(accept(form)?).await?;
  Ok(created(
    Acknowledgement::new("Your message has been sent successfully. We will get back to you soon.")
      .with("success", true)
      .with("inquiry_id", id),
  ))
}

#[get("/offices")]
pub async fn offices(site: &State<Site>) -> JsonResult<Vec<OfficeLocation>> {
  Ok(Json(site.office_location().public().await?))
}

#[get("/persons")]
pub async fn persons(site: &State<Site>) -> JsonResult<Vec<ContactPerson>> {
  Ok(Json(site.contact_person().public().await?))
}

#[get("/social-media")]
pub async fn social_media(site: &State<Site>) -> JsonResult<Vec<SocialMediaAccount>> {
  Ok(Json(site.social_media_account().active(SocialPlacement::Anywhere).await?))
}

#[derive(Serialize)]
pub struct ContactPageData {
  office_locations: Vec<OfficeLocation>,
  contact_persons: Vec<ContactPerson>,
  social_media: Vec<SocialMediaAccount>,
}

#[get("/page-data")]
pub async fn page_data(site: &State<Site>) -> JsonResult<ContactPageData> {
  let data = async {
    Ok::<_, Error>(ContactPageData {
      office_locations: site.office_location().public().await?,
      contact_persons: site.contact_person().public().await?,
      social_media: site.social_media_account().active(SocialPlacement::Contact).await?,
    })
  };
  Ok(Json(aggregate("Failed to fetch contact page data", data.await)?))
}

#[get("/footer-social")]
pub async fn footer_social(site: &State<Site>) -> JsonResult<Vec<SocialMediaAccount>> {
  let accounts = site.social_media_account().active(SocialPlacement::Footer).await;
  Ok(Json(aggregate("Failed to fetch social media data", accounts)?))
}
