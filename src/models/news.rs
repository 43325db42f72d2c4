use serde::{Serialize, Serializer};
use super::*;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct NewsCategory {
  pub id: i32,
  pub name: String,
  pub slug: String,
  pub description: Option<String>,
  pub color: String,
}

impl NewsCategoryHub {
  pub async fn active(&self) -> Result<Vec<NewsCategory>> {
    Ok(sqlx::query_as("SELECT * FROM news_categories WHERE is_active ORDER BY display_order, name")
      .fetch_all(&self.site.db)
      .await?)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct NewsArticle {
  pub id: i32,
  pub title: String,
  pub slug: String,
  pub excerpt: String,
  pub content: String,
  pub featured_image: String,
  pub gallery_images: Option<String>,
  pub video_url: Option<String>,
  pub category_name: String,
  pub category_color: String,
  #[serde(rename = "tags_list", serialize_with = "serialize_tags")]
  pub tags: Option<String>,
  pub author: String,
  pub publish_date: UtcDateTime,
  pub meta_title: Option<String>,
  pub meta_description: Option<String>,
  pub is_featured: bool,
  pub views_count: i32,
}

fn serialize_tags<S: Serializer>(tags: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
  split_list(tags).serialize(serializer)
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsArticleDetail {
  #[serde(flatten)]
  pub article: NewsArticle,
  pub related_articles: Vec<NewsArticle>,
}

const PUBLISHED: &str = "SELECT a.*, c.name AS category_name, c.color AS category_color \
  FROM news_articles a JOIN news_categories c ON c.id = a.category_id \
  WHERE a.is_published AND a.is_active";

impl NewsArticleHub {
  /// Published articles, newest first, optionally narrowed to a category slug.
  pub async fn published(&self, category: Option<&str>) -> Result<Vec<NewsArticle>> {
    Ok(sqlx::query_as(&format!(
      "{} AND ($1::text IS NULL OR c.slug = $1) ORDER BY a.publish_date DESC",
      PUBLISHED
    ))
      .bind(category)
      .fetch_all(&self.site.db)
      .await?)
  }

  pub async fn featured(&self, limit: Option<i64>) -> Result<Vec<NewsArticle>> {
    Ok(sqlx::query_as(&format!("{} AND a.is_featured ORDER BY a.publish_date DESC LIMIT $1", PUBLISHED))
      .bind(limit)
      .fetch_all(&self.site.db)
      .await?)
  }

  pub async fn recent_excluding(&self, excluded: Option<i32>, limit: i64) -> Result<Vec<NewsArticle>> {
    Ok(sqlx::query_as(&format!(
      "{} AND ($1::int4 IS NULL OR a.id <> $1) ORDER BY a.publish_date DESC LIMIT $2",
      PUBLISHED
    ))
      .bind(excluded)
      .bind(limit)
      .fetch_all(&self.site.db)
      .await?)
  }

  pub async fn find_by_slug(&self, slug: &str) -> Result<NewsArticle> {
    sqlx::query_as(&format!("{} AND a.slug = $1", PUBLISHED))
      .bind(slug)
      .fetch_optional(&self.site.db)
      .await?
      .ok_or_else(|| Error::not_found("News article"))
  }

  pub async fn detail(&self, article: NewsArticle) -> Result<NewsArticleDetail> {
    let related_articles = sqlx::query_as(&format!(
      "{} AND a.id IN (SELECT related_id FROM news_article_related WHERE article_id = $1) \
      ORDER BY a.publish_date DESC",
      PUBLISHED
    ))
      .bind(article.id)
      .fetch_all(&self.site.db)
      .await?;

    Ok(NewsArticleDetail { article, related_articles })
  }

  /// Counts a read and returns the article as it stands after it.
  pub async fn read(&self, slug: &str) -> Result<NewsArticleDetail> {
    let updated = sqlx::query(
      "UPDATE news_articles SET views_count = views_count + 1
      WHERE slug = $1 AND is_published AND is_active"
    ).bind(slug).execute(&self.site.db).await?;

    if updated.rows_affected() == 0 {
      return Err(Error::not_found("News article"));
    }

    let article = self.find_by_slug(slug).await?;
    self.detail(article).await
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn articles_expose_their_tags_as_a_list() {
    let article = NewsArticle {
      id: 1,
      title: "Scholars graduate".into(),
      slug: "scholars-graduate".into(),
      excerpt: "Twelve scholars graduated".into(),
      content: "<p>...</p>".into(),
      featured_image: "news/graduation.jpg".into(),
      gallery_images: None,
      video_url: None,
      category_name: "Programs".into(),
      category_color: "primary".into(),
      tags: Some("scholarship, graduation".into()),
      author: "KEEFA Team".into(),
      publish_date: chrono::Utc::now(),
      meta_title: None,
      meta_description: None,
      is_featured: false,
      views_count: 3,
    };

    let json = serde_json::to_value(&article).unwrap();
    assert_eq!(json["tags_list"], serde_json::json!(["scholarship", "graduation"]));
    assert!(json.get("tags").is_none());
  }
}
