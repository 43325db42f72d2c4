use rocket::{get, post, serde::Serialize, FromForm, State};
use super::*;

#[get("/categories")]
pub async fn categories(site: &State<Site>) -> JsonResult<Vec<NewsCategory>> {
  Ok(Json(site.news_category().active().await?))
}

#[get("/articles?<category>")]
pub async fn articles(site: &State<Site>, category: Option<&str>) -> JsonResult<Vec<NewsArticle>> {
  Ok(Json(site.news_article().published(category).await?))
}

#[get("/articles/featured")]
pub async fn featured_articles(site: &State<Site>) -> JsonResult<Vec<NewsArticle>> {
  Ok(Json(site.news_article().featured(None).await?))
}

#[get("/articles/<slug>")]
pub async fn article(site: &State<Site>, slug: &str) -> JsonResult<NewsArticleDetail> {
  Ok(Json(site.news_article().read(slug).await?))
}

#[derive(FromForm)]
pub struct EventFilter<'r> {
  #[field(name = "type")]
  event_type: Option<&'r str>,
  status: Option<&'r str>,
}

#[get("/events?<filter..>")]
pub async fn events(site: &State<Site>, filter: EventFilter<'_>) -> JsonResult<Vec<Event>> {
  Ok(Json(site.event().list(filter.event_type, EventTiming::from_param(filter.status)).await?))
}

#[get("/events/upcoming")]
pub async fn upcoming_events(site: &State<Site>) -> JsonResult<Vec<Event>> {
  Ok(Json(site.event().upcoming(None).await?))
}

#[get("/events/<slug>")]
pub async fn event(site: &State<Site>, slug: &str) -> JsonResult<Event> {
  Ok(Json(site.event().find_by_slug(slug).await?))
}

#[post("/events/register", data = "<form>")]
pub async fn register_for_event(site: &State<Site>, form: Submission<'_, EventRegistrationForm>) -> Result<status::Custom<Json<Acknowledgement>>> {
  Ok(match site.event_registration().register(accept(form)?).await? {
    Registration::Created(id) => created(
      Acknowledgement::new("Successfully registered for event").with("registration_id", id),
    ),
    Registration::AlreadyRegistered => status::Custom(
      Status::Ok,
      Json(Acknowledgement::new("Already registered for this event")),
    ),
  })
}

#[post("/newsletter/subscribe", data = "<form>")]
pub async fn subscribe(site: &State<Site>, form: Submission<'_, NewsletterForm>) -> Result<status::Custom<Json<Acknowledgement>>> {
  Ok(match site.newsletter().subscribe(accept(form)?, None).await? {
    Subscription::Created(id) => created(
      Acknowledgement::new("Successfully subscribed to newsletter").with("subscription_id", id),
    ),
    Subscription::AlreadySubscribed => status::Custom(
      Status::Ok,
      Json(Acknowledgement::new("Email already subscribed")),
    ),
  })
}

#[derive(Serialize)]
pub struct NewsOverview {
  featured_article: Option<NewsArticleDetail>,
  recent_articles: Vec<NewsArticle>,
  upcoming_events: Vec<Event>,
}

#[get("/overview")]
pub async fn overview(site: &State<Site>) -> JsonResult<NewsOverview> {
  let data = async {
    let articles = site.news_article();
    let featured_article = match articles.featured(Some(1)).await?.into_iter().next() {
      Some(article) => Some(articles.detail(article).await?),
      None => None,
    };
    let excluded = featured_article.as_ref().map(|detail| detail.article.id);

    Ok::<_, Error>(NewsOverview {
      recent_articles: articles.recent_excluding(excluded, 6).await?,
      upcoming_events: site.event().upcoming(Some(3)).await?,
      featured_article,
    })
  };
  Ok(Json(aggregate("Failed to fetch news overview", data.await)?))
}
