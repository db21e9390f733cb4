use super::traits::StoryProvider;
use crate::error::ProviderError;
use crate::model::{Author, Series, Work};
use async_trait::async_trait;
use serde::Deserialize;

const PROVIDER: &str = "ao3";
pub const DEFAULT_BASE_URL: &str = "https://ao3.fanfic.dev/v0";

/// Client for the Archive of Our Own metadata service. Resolves works and
/// series by id and supports ranked title search.
pub struct Ao3Client {
    http: reqwest::Client,
    base_url: String,
}

impl Ao3Client {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, ProviderError> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                provider: PROVIDER,
                message: e.to_string(),
            })?;
        super::read_json(PROVIDER, response).await
    }
}

#[async_trait]
impl StoryProvider for Ao3Client {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn get_by_id(&self, id: u64) -> Result<Option<Work>, ProviderError> {
        let work: Option<Ao3Work> = self.fetch(&format!("/works/{id}"), &[]).await?;
        Ok(work.map(Ao3Work::into_work))
    }

    async fn get_series(&self, id: u64) -> Result<Option<Series>, ProviderError> {
        let series: Option<Ao3Series> = self.fetch(&format!("/series/{id}"), &[]).await?;
        Ok(series.map(Ao3Series::into_series))
    }

    async fn search_by_title(&self, text: &str, limit: u32) -> Result<Vec<Work>, ProviderError> {
        let query = [
            ("any_field", text.to_string()),
            ("limit", limit.to_string()),
        ];
        let page: Option<Ao3SearchPage> = self.fetch("/search/works", &query).await?;
        Ok(page
            .map(|p| p.results)
            .unwrap_or_default()
            .into_iter()
            .map(Ao3Work::into_work)
            .collect())
    }
}

// ─── Wire format ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Ao3SearchPage {
    #[serde(default)]
    results: Vec<Ao3Work>,
}

#[derive(Debug, Deserialize)]
struct Ao3Work {
    id: u64,
    title: String,
    #[serde(default)]
    authors: Vec<Ao3User>,
    #[serde(default)]
    rating: Option<String>,
    #[serde(default)]
    is_complete: bool,
    #[serde(default)]
    date_updated: Option<String>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    nwords: u64,
    #[serde(default)]
    nchapters: u64,
    #[serde(default)]
    fandoms: Vec<String>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    characters: Vec<String>,
    #[serde(default)]
    ncomments: Option<u64>,
    #[serde(default)]
    nkudos: Option<u64>,
    #[serde(default)]
    nbookmarks: Option<u64>,
    #[serde(default)]
    nhits: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Ao3User {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Ao3Series {
    id: u64,
    name: String,
    #[serde(default)]
    creators: Vec<Ao3User>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    date_updated: Option<String>,
    #[serde(default)]
    is_complete: bool,
    #[serde(default)]
    nwords: u64,
    #[serde(default)]
    works: Vec<Ao3Work>,
}

fn profile_author(user: Ao3User) -> Author {
    let url = format!("https://archiveofourown.org/users/{}", user.name);
    Author::with_url(user.name, url)
}

impl Ao3Work {
    fn into_work(self) -> Work {
        let stats = [
            ("Comments", self.ncomments),
            ("Kudos", self.nkudos),
            ("Bookmarks", self.nbookmarks),
            ("Hits", self.nhits),
        ]
        .into_iter()
        .filter_map(|(label, count)| count.map(|c| (label.to_string(), c)))
        .collect();
        Work {
            title: self.title,
            url: format!("https://archiveofourown.org/works/{}", self.id),
            authors: self.authors.into_iter().map(profile_author).collect(),
            rating: self.rating,
            complete: self.is_complete,
            updated: super::parse_date(self.date_updated.as_deref()),
            words: self.nwords,
            chapters: self.nchapters,
            summary: self.summary,
            fandoms: self.fandoms,
            categories: self.categories,
            characters: self.characters,
            stats,
        }
    }
}

impl Ao3Series {
    fn into_series(self) -> Series {
        Series {
            name: self.name,
            url: format!("https://archiveofourown.org/series/{}", self.id),
            summary: self.description,
            updated: super::parse_date(self.date_updated.as_deref()),
            complete: self.is_complete,
            words: self.nwords,
            works: self.works.into_iter().map(Ao3Work::into_work).collect(),
            authors: self.creators.into_iter().map(profile_author).collect(),
        }
    }
}
