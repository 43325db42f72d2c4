mod support;
use support::*;

use rocket::http::Status;

async fn seed_article(site: &Site, slug: &str, is_featured: bool) -> anyhow::Result<()> {
  sqlx::query(
    "INSERT INTO news_categories (name, slug) VALUES ('Scholarships', 'scholarships')
    ON CONFLICT (slug) DO NOTHING"
  ).execute(&site.db).await?;

  sqlx::query(
    "INSERT INTO news_articles (title, slug, excerpt, content, featured_image, category_id, tags, is_featured)
    SELECT $1, $2, 'Twenty new scholars', 'The full story.', 'news/scholars.jpg', id, 'scholars, 2025', $3
    FROM news_categories WHERE slug = 'scholarships'"
  )
    .bind(format!("Article {}", slug))
    .bind(slug)
    .bind(is_featured)
    .execute(&site.db)
    .await?;
  Ok(())
}

test!{ singletons_are_served_with_their_defaults(client, site, gateways)
  let homepage: Value = client.get("/api/v1/homepage-data").await;
  assert_eq!(homepage["organization"]["name"], "KEEFA");
  assert_eq!(homepage["organization"]["email"], "info@keefa.org");
  assert_eq!(homepage["impact_statistics"], json!([]));
  assert_eq!(homepage["featured_testimonials"], json!([]));

  let settings: Value = client.get("/api/v1/site-settings").await;
  assert_eq!(settings["maintenance_mode"], false);
  assert!(settings.get("google_analytics_id").is_none());

  client.get::<Value, _>("/api/v1/organization").await;
  assert_eq!(count(&site, "SELECT COUNT(*) FROM organization").await?, 1);
}

test!{ faqs_by_unknown_category_are_empty(client, site, gateways)
  sqlx::query("INSERT INTO faqs (question, answer, category) VALUES ('How do I donate?', 'Through M-Pesa or card.', 'donations')")
    .execute(&site.db)
    .await?;

  let all: Vec<Value> = client.get("/api/v1/faqs").await;
  assert_eq!(all.len(), 1);
  let donations: Vec<Value> = client.get("/api/v1/faqs?category=donations").await;
  assert_eq!(donations.len(), 1);
  let unknown: Vec<Value> = client.get("/api/v1/faqs?category=gardening").await;
  assert!(unknown.is_empty());
}

test!{ reading_an_article_counts_the_view(client, site, gateways)
  seed_article(&site, "new-scholars", true).await?;
  seed_article(&site, "graduation", false).await?;

  let first: Value = client.get("/api/v1/news/articles/new-scholars").await;
  assert_eq!(first["views_count"], 1);
  assert_eq!(first["tags"], json!(["scholars", "2025"]));
  assert_eq!(first["category_name"], "Scholarships");

  let second: Value = client.get("/api/v1/news/articles/new-scholars").await;
  assert_eq!(second["views_count"], 2);

  let listed: Vec<Value> = client.get("/api/v1/news/articles?category=scholarships").await;
  assert_eq!(listed.len(), 2);

  let overview: Value = client.get("/api/v1/news/overview").await;
  assert_eq!(overview["featured_article"]["slug"], "new-scholars");
  assert_eq!(overview["recent_articles"].as_array().map(Vec::len), Some(1));

  client.assert_get_error("/api/v1/news/articles/missing", Status::NotFound, "not found").await;
}

test!{ unknown_slugs_are_not_found(client, site, gateways)
  client.assert_get_error("/api/v1/programs/no-such-program", Status::NotFound, "Program not found").await;
  client.assert_get_error("/api/v1/donations/campaigns/no-such-campaign", Status::NotFound, "Campaign not found").await;
  client.assert_get_error("/api/v1/news/events/no-such-event", Status::NotFound, "Event not found").await;
  client.assert_get_error("/api/v1/nowhere", Status::NotFound, "Not found").await;
}

test!{ campaigns_report_their_progress(client, site, gateways)
  let id = seed_campaign(&site, "school-fees", 1_000, true).await?;
  seed_campaign(&site, "closed-drive", 1_000, false).await?;
  sqlx::query("UPDATE donation_campaigns SET raised_amount = 250 WHERE id = $1").bind(id).execute(&site.db).await?;

  let campaigns: Vec<Value> = client.get("/api/v1/donations/campaigns").await;
  assert_eq!(campaigns.len(), 1);

  let campaign: Value = client.get("/api/v1/donations/campaigns/school-fees").await;
  assert_eq!(campaign["slug"], "school-fees");
  assert!(campaign.get("progress_percentage").is_some());
}
