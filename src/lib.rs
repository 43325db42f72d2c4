#[macro_use]
extern crate rocket;

use rocket::{fairing::AdHoc, figment::Figment, Build, Rocket};
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use tera::Tera;

lazy_static::lazy_static! {
  pub static ref TEMPLATES: Tera = {
    let mut tera = Tera::default();
    tera.add_raw_templates([
      ("donations/payment_instructions", include_str!("templates/donations/payment_instructions.txt.tera")),
    ]).expect("No static");
    tera
  };
}

pub mod models;
pub mod error;
pub mod controllers;
pub use controllers::*;

use models::{Site, SiteSettings};

pub fn cors(origins: &[String]) -> std::result::Result<rocket_cors::Cors, rocket_cors::Error> {
  let allowed_origins = if origins.is_empty() {
    AllowedOrigins::all()
  } else {
    AllowedOrigins::some_exact(origins)
  };

  CorsOptions {
    allowed_origins,
    allowed_headers: AllowedHeaders::all(),
    allow_credentials: true,
    ..Default::default()
  }.to_cors()
}

/// The API as configured by `figment`. The database pool is opened when it ignites.
pub fn server_with(figment: Figment) -> Rocket<Build> {
  rocket::custom(figment)
    .mount("/api/v1", routes![
      organization::organization,
      organization::site_settings,
      organization::impact_statistics,
      organization::team_members,
      organization::partners,
      organization::testimonials,
      organization::featured_testimonials,
      organization::faqs,
      organization::homepage_data,
      organization::about_data,
    ])
    .mount("/api/v1/programs", routes![
      programs::index,
      programs::show,
      programs::apply_for_scholarship,
      programs::register_for_workshop,
      programs::locations,
      programs::success_stories,
      programs::featured_success_stories,
      programs::success_story,
      programs::overview,
      programs::impact_data,
    ])
    .mount("/api/v1/donations", routes![
      donations::campaigns,
      donations::featured_campaigns,
      donations::campaign,
      donations::create,
      donations::mpesa_callback,
      donations::stripe_webhook,
      donations::volunteer,
      donations::partnership,
      donations::stats,
      donations::refund,
    ])
    .mount("/api/v1/news", routes![
      news::categories,
      news::articles,
      news::featured_articles,
      news::article,
      news::events,
      news::upcoming_events,
      news::event,
      news::register_for_event,
      news::subscribe,
      news::overview,
    ])
    .mount("/api/v1/contact", routes![
      contact::inquire,
      contact::offices,
      contact::persons,
      contact::social_media,
      contact::page_data,
      contact::footer_social,
    ])
    .mount("/api/v1/users", routes![
      users::register,
      users::login,
      users::logout,
      users::profile,
      users::update_profile,
      users::dashboard,
    ])
    .register("/", catchers![
      bad_request,
      unauthorized,
      forbidden,
      not_found,
      unprocessable,
      internal_error,
    ])
    .attach(AdHoc::try_on_ignite("Site config", |rocket| async {
      let settings = match SiteSettings::from_figment(rocket.figment()) {
        Ok(settings) => settings,
        Err(e) => {
          error!("Config could not be parsed: {}", e);
          return Err(rocket);
        }
      };

      let cors = match cors(&settings.cors_origins) {
        Ok(cors) => cors,
        Err(e) => {
          error!("Invalid CORS origins: {}", e);
          return Err(rocket);
        }
      };

      let site: Site = match settings.into_site().await {
        Ok(site) => site,
        Err(e) => {
          error!("Could not connect to the database: {}", e);
          return Err(rocket);
        }
      };

      Ok(rocket.manage(site).attach(cors))
    }))
}

/// The API configured from `Rocket.toml` and `ROCKET_*` variables.
pub fn server() -> Rocket<Build> {
  server_with(rocket::Config::figment())
}
