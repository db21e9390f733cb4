use super::traits::StoryProvider;
use crate::error::ProviderError;
use crate::model::{Author, Work};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;

const PROVIDER: &str = "fichub";
pub const DEFAULT_BASE_URL: &str = "https://fichub.net/api/v0";

/// Which raw stat keys to surface, per source site. FicHub's stat key set
/// varies by the site it scraped; unknown sites get no stats row.
const FFN_STATS: [(&str, &str); 3] = [
    ("reviews", "Reviews"),
    ("favorites", "Favorites"),
    ("follows", "Follows"),
];
const AO3_STATS: [(&str, &str); 4] = [
    ("comments", "Comments"),
    ("kudos", "Kudos"),
    ("bookmarks", "Bookmarks"),
    ("hits", "Hits"),
];

/// Client for the FicHub cross-site metadata aggregator. Looks stories up
/// by URL only.
pub struct FichubClient {
    http: reqwest::Client,
    base_url: String,
}

impl FichubClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl StoryProvider for FichubClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<Work>, ProviderError> {
        let response = self
            .http
            .get(format!("{}/meta", self.base_url))
            .query(&[("q", url)])
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                provider: PROVIDER,
                message: e.to_string(),
            })?;
        let story: Option<FichubStory> = super::read_json(PROVIDER, response).await?;
        Ok(story.map(FichubStory::into_work))
    }
}

// ─── Wire format ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FichubStory {
    title: String,
    author: FichubAuthor,
    #[serde(default)]
    description: String,
    /// Canonical source URL of the story on its origin site.
    source: String,
    #[serde(default)]
    updated: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    rating: Option<String>,
    #[serde(default)]
    words: u64,
    #[serde(default)]
    chapters: u64,
    #[serde(default)]
    fandoms: Vec<String>,
    #[serde(default)]
    characters: Vec<String>,
    #[serde(default)]
    stats: BTreeMap<String, u64>,
    #[serde(default)]
    more_meta: FichubMoreMeta,
}

#[derive(Debug, Deserialize)]
struct FichubAuthor {
    name: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FichubMoreMeta {
    #[serde(default)]
    category: Vec<String>,
}

impl FichubStory {
    fn into_work(self) -> Work {
        let author = match self.author.url {
            Some(url) => Author::with_url(self.author.name, url),
            None => Author::new(self.author.name),
        };
        let stats = site_stats(&self.source, &self.stats);
        Work {
            title: self.title,
            url: self.source,
            authors: vec![author],
            rating: self.rating,
            complete: self
                .status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("complete")),
            updated: super::parse_date(self.updated.as_deref()),
            words: self.words,
            chapters: self.chapters,
            summary: self.description,
            fandoms: self.fandoms,
            categories: self.more_meta.category,
            characters: self.characters,
            stats,
        }
    }
}

/// Project the raw stat map into the display order used for the story's
/// origin site, omitting absent metrics entirely.
fn site_stats(url: &str, raw: &BTreeMap<String, u64>) -> Vec<(String, u64)> {
    let names: &[(&str, &str)] = if url.contains("fanfiction.net") {
        &FFN_STATS
    } else if url.contains("archiveofourown.org") {
        &AO3_STATS
    } else {
        &[]
    };
    names
        .iter()
        .filter_map(|(key, label)| raw.get(*key).map(|count| ((*label).to_string(), *count)))
        .collect()
}
