use rocket::{get, post, serde::json::json, State};
use super::*;

#[get("/campaigns")]
pub async fn campaigns(site: &State<Site>) -> JsonResult<Vec<DonationCampaign>> {
  Ok(Json(site.campaign().active().await?))
}

#[get("/campaigns/featured")]
pub async fn featured_campaigns(site: &State<Site>) -> JsonResult<Vec<DonationCampaign>> {
  Ok(Json(site.campaign().featured().await?))
}

#[get("/campaigns/<slug>")]
pub async fn campaign(site: &State<Site>, slug: &str) -> JsonResult<DonationCampaign> {
  Ok(Json(site.campaign().find_by_slug(slug).await?))
}

#[post("/create", data = "<form>")]
pub async fn create(site: &State<Site>, form: Submission<'_, DonationForm>) -> CreatedResult<DonationReceipt> {
  Ok(created(site.donation().donate(&accept(form)?).await?))
}

/// Daraja only needs to hear that the callback arrived, whatever became of the donation.
#[post("/mpesa-callback", data = "<body>")]
pub async fn mpesa_callback(site: &State<Site>, body: String) -> Result<Json<Value>> {
  let callback = match mpesa::Callback::parse(&body) {
    Ok(callback) => callback,
    Err(e) => {
      warn!("Unreadable M-Pesa callback: {}", e);
      return Err(Error::Gateway("Invalid payload".into()));
    }
  };

  match site.donation().from_mpesa_callback(&callback).await {
    Ok(_) => Ok(Json(json!({ "status": "success" }))),
    Err(e) if e.is_not_found() => Err(Error::not_found("Donation")),
    Err(e) => {
      warn!("M-Pesa callback for {:?} failed: {:?}", callback.checkout_request_id(), e);
      Err(Error::Gateway(e.to_string()))
    }
  }
}

#[post("/stripe-webhook", data = "<webhook>")]
pub async fn stripe_webhook(site: &State<Site>, webhook: StripeWebhook) -> Result<Json<Value>> {
  if let Err(e) = site.donation().from_stripe_event(&webhook.event).await {
    warn!("Stripe event {} could not be applied: {:?}", webhook.event.id, e);
    return Err(Error::Gateway(e.to_string()));
  }
  Ok(Json(json!({ "status": "success" })))
}

#[post("/volunteers", data = "<form>")]
pub async fn volunteer(site: &State<Site>, form: Submission<'_, VolunteerForm>) -> CreatedResult<Acknowledgement> {
  let id = site.volunteer().create(accept(form)?).await?;
  Ok(created(
    Acknowledgement::new("Volunteer application submitted successfully").with("volunteer_id", id),
  ))
}

#[post("/partnerships", data = "<form>")]
pub async fn partnership(site: &State<Site>, form: Submission<'_, PartnershipForm>) -> CreatedResult<Acknowledgement> {
  let id = site.partnership().create(accept(form)?).await?;
  Ok(created(
    Acknowledgement::new("Partnership inquiry submitted successfully").with("partnership_id", id),
  ))
}

#[get("/stats")]
pub async fn stats(site: &State<Site>) -> JsonResult<DonationStats> {
  Ok(Json(aggregate("Failed to fetch donation stats", site.donation().stats().await)?))
}

#[post("/<id>/refund")]
pub async fn refund(site: &State<Site>, id: i32, session: AdminSession) -> JsonResult<Donation> {
  let donation = site.donation().refund(id).await?;
  info!("Donation {} refunded by {}", id, session.0.username);
  Ok(Json(donation))
}
