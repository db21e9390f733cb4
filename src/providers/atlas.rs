use super::traits::StoryProvider;
use crate::error::ProviderError;
use crate::model::{Author, Work};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

const PROVIDER: &str = "atlas";
pub const DEFAULT_BASE_URL: &str = "https://atlas.fanfic.dev/v0";

static FIC_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:www\.|m\.|)fanfiction\.net/s/(\d+)").expect("fic id pattern must compile")
});

/// Pull a FanFiction.Net story id out of a URL-shaped query, if present.
pub fn extract_fic_id(text: &str) -> Option<u64> {
    FIC_ID_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Client for the Atlas FFN metadata aggregator. Credentials are static
/// basic-auth values passed in at construction.
pub struct AtlasClient {
    http: reqwest::Client,
    base_url: String,
    auth: Option<(String, String)>,
}

impl AtlasClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            auth: None,
        }
    }

    pub fn with_auth(mut self, login: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((login.into(), password.into()));
        self
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.http.get(format!("{}{path}", self.base_url));
        match &self.auth {
            Some((login, password)) => request.basic_auth(login, Some(password)),
            None => request,
        }
    }
}

#[async_trait]
impl StoryProvider for AtlasClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn get_by_id(&self, id: u64) -> Result<Option<Work>, ProviderError> {
        let response = self
            .get(&format!("/ffn/meta/{id}"))
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                provider: PROVIDER,
                message: e.to_string(),
            })?;
        let story: Option<AtlasStory> = super::read_json(PROVIDER, response).await?;
        Ok(story.map(AtlasStory::into_work))
    }

    async fn search_by_title(&self, text: &str, limit: u32) -> Result<Vec<Work>, ProviderError> {
        let response = self
            .get("/ffn/meta")
            .query(&[("title_ilike", format!("%{text}%"))])
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                provider: PROVIDER,
                message: e.to_string(),
            })?;
        let stories: Option<Vec<AtlasStory>> = super::read_json(PROVIDER, response).await?;
        Ok(stories
            .unwrap_or_default()
            .into_iter()
            .map(AtlasStory::into_work)
            .collect())
    }
}

// ─── Wire format ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AtlasStory {
    id: u64,
    title: String,
    author: AtlasAuthor,
    #[serde(default)]
    description: String,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    updated: Option<String>,
    #[serde(default)]
    is_complete: bool,
    #[serde(default)]
    rating: Option<String>,
    #[serde(default)]
    fandoms: Vec<String>,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    characters: Vec<String>,
    #[serde(default)]
    words: u64,
    #[serde(default)]
    chapters: u64,
    #[serde(default)]
    reviews: u64,
    #[serde(default)]
    favorites: u64,
    #[serde(default)]
    follows: u64,
}

#[derive(Debug, Deserialize)]
struct AtlasAuthor {
    id: u64,
    name: String,
}

impl AtlasStory {
    fn into_work(self) -> Work {
        // FFN has no "never updated" state: a story missing an update
        // timestamp falls back to its publication date.
        let updated = super::parse_date(self.updated.as_deref())
            .or_else(|| super::parse_date(self.published.as_deref()));
        Work {
            title: self.title,
            url: format!("https://www.fanfiction.net/s/{}", self.id),
            authors: vec![Author::with_url(
                self.author.name,
                format!("https://www.fanfiction.net/u/{}", self.author.id),
            )],
            rating: self.rating.map(|r| format!("Fiction {r}")),
            complete: self.is_complete,
            updated,
            words: self.words,
            chapters: self.chapters,
            summary: self.description,
            fandoms: self.fandoms,
            categories: self.genres,
            characters: self.characters,
            stats: vec![
                ("Reviews".into(), self.reviews),
                ("Faves".into(), self.favorites),
                ("Follows".into(), self.follows),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::http::build_provider_client;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn story_json() -> serde_json::Value {
        serde_json::json!({
            "id": 4870,
            "title": "A Study in Magic",
            "author": {"id": 12, "name": "someauthor"},
            "description": "A detective story.",
            "published": "2011-05-01T00:00:00Z",
            "updated": "2013-09-20T00:00:00Z",
            "is_complete": true,
            "rating": "T",
            "fandoms": ["Harry Potter", "Sherlock"],
            "genres": ["Mystery", "Drama"],
            "characters": ["Harry P.", "Sherlock H."],
            "words": 250_000,
            "chapters": 50,
            "reviews": 3200,
            "favorites": 5100,
            "follows": 4800
        })
    }

    #[test]
    fn extracts_fic_id_from_url_shapes() {
        assert_eq!(extract_fic_id("https://www.fanfiction.net/s/4870/1"), Some(4870));
        assert_eq!(extract_fic_id("m.fanfiction.net/s/123"), Some(123));
        assert_eq!(extract_fic_id("a story called 4870"), None);
    }

    #[tokio::test]
    async fn get_by_id_maps_story_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ffn/meta/4870"))
            .respond_with(ResponseTemplate::new(200).set_body_json(story_json()))
            .mount(&server)
            .await;

        let client = AtlasClient::new(build_provider_client(5), server.uri());
        let work = client.get_by_id(4870).await.unwrap().unwrap();

        assert_eq!(work.title, "A Study in Magic");
        assert_eq!(work.url, "https://www.fanfiction.net/s/4870");
        assert_eq!(work.authors[0].name, "someauthor");
        assert_eq!(work.rating.as_deref(), Some("Fiction T"));
        assert!(work.complete);
        assert_eq!(work.updated.unwrap().to_string(), "2013-09-20");
        assert_eq!(work.stats[0], ("Reviews".to_string(), 3200));
    }

    #[tokio::test]
    async fn missing_story_is_a_negative_answer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ffn/meta/1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = AtlasClient::new(build_provider_client(5), server.uri());
        assert!(client.get_by_id(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_error_is_a_provider_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ffn/meta/1"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = AtlasClient::new(build_provider_client(5), server.uri());
        let err = client.get_by_id(1).await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn search_passes_title_filter_and_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ffn/meta"))
            .and(query_param("title_ilike", "%study%"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([story_json()])))
            .mount(&server)
            .await;

        let client = AtlasClient::new(build_provider_client(5), server.uri());
        let results = client.search_by_title("study", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "A Study in Magic");
    }
}
