use keefa_api::{error::Result, models::SiteSettings};

#[tokio::main]
async fn main() -> Result<()> {
  let site = SiteSettings::load()?.into_site().await?;
  sqlx::migrate!("src/migrations").run(&site.db).await?;
  println!("Migrations applied");
  Ok(())
}
