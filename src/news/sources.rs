//! News sources: RSS/Atom feeds, Google News search and NewsAPI.

use chrono::{DateTime, Utc};
use feed_rs::parser;
use serde::Deserialize;

use super::types::Article;
use crate::error::{Result, RivalError};
use crate::fetch::{strip_html, Fetcher};

/// Build the Google News RSS search URL for a query.
pub fn google_news_url(base_url: &str, query: &str) -> String {
    format!(
        "{}?q={}&hl=en-US&gl=US&ceid=US:en",
        base_url,
        urlencoding::encode(query)
    )
}

/// Parse RSS/Atom bytes into articles.
///
/// `fallback_source` names the source when the feed has no title.
pub fn parse_feed(bytes: &[u8], fallback_source: &str) -> Result<Vec<Article>> {
    let feed =
        parser::parse(bytes).map_err(|e| RivalError::Feed(format!("failed to parse feed: {}", e)))?;

    let source = feed
        .title
        .map(|t| t.content)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| fallback_source.to_string());

    let articles = feed
        .entries
        .into_iter()
        .map(|entry| {
            let title = entry
                .title
                .map(|t| strip_html(&t.content))
                .unwrap_or_default();
            let url = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();
            let description = entry
                .summary
                .map(|t| t.content)
                .or(entry.content.and_then(|c| c.body))
                .map(|d| strip_html(&d))
                .filter(|d| !d.is_empty());
            let author = entry
                .authors
                .first()
                .map(|a| a.name.clone())
                .filter(|a| !a.is_empty());

            Article {
                title,
                description,
                content: None,
                url,
                source: Some(source.clone()),
                author,
                published_at: entry.published.or(entry.updated),
            }
        })
        .collect();

    Ok(articles)
}

/// Fetch and parse a feed.
pub async fn fetch_feed(fetcher: &Fetcher, url: &str, fallback_source: &str) -> Result<Vec<Article>> {
    let bytes = fetcher.fetch_bytes(url).await?;
    parse_feed(&bytes, fallback_source)
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
    source: Option<NewsApiSource>,
    author: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

/// Parse a NewsAPI `everything` response body.
pub fn parse_newsapi(body: &[u8]) -> Result<Vec<Article>> {
    let response: NewsApiResponse = serde_json::from_slice(body)
        .map_err(|e| RivalError::Feed(format!("invalid NewsAPI response: {}", e)))?;

    if response.status != "ok" {
        return Err(RivalError::Feed(format!(
            "NewsAPI error: {}",
            response.message.unwrap_or(response.status)
        )));
    }

    Ok(response
        .articles
        .into_iter()
        .map(|a| Article {
            title: a.title.unwrap_or_default(),
            description: a.description.filter(|d| !d.is_empty()),
            content: a.content.filter(|c| !c.is_empty()),
            url: a.url.unwrap_or_default(),
            source: Some(
                a.source
                    .and_then(|s| s.name)
                    .unwrap_or_else(|| "NewsAPI".to_string()),
            ),
            author: a.author.filter(|a| !a.is_empty()),
            published_at: a
                .published_at
                .and_then(|p| DateTime::parse_from_rfc3339(&p).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        })
        .collect())
}

/// Query NewsAPI for articles about `query` published since `from`.
pub async fn fetch_newsapi(
    fetcher: &Fetcher,
    endpoint: &str,
    api_key: &str,
    query: &str,
    from: DateTime<Utc>,
) -> Result<Vec<Article>> {
    let url = format!(
        "{}?q={}&apiKey={}&language=en&sortBy=publishedAt&pageSize=20&from={}",
        endpoint,
        urlencoding::encode(query),
        urlencoding::encode(api_key),
        from.format("%Y-%m-%d")
    );
    let body = fetcher.fetch_bytes(&url).await?;
    parse_newsapi(&body)
}
