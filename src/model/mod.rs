use chrono::NaiveDate;

/// A story author or series creator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Author {
    pub name: String,
    pub url: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }

    pub fn with_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: Some(url.into()),
        }
    }
}

/// Normalized metadata for a single story, regardless of which provider
/// answered. `stats` preserves the provider's metric order; its key set
/// varies by originating site (e.g. reviews/favorites/follows for FFN,
/// comments/kudos/bookmarks/hits for AO3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Work {
    pub title: String,
    pub url: String,
    pub authors: Vec<Author>,
    pub rating: Option<String>,
    pub complete: bool,
    pub updated: Option<NaiveDate>,
    pub words: u64,
    pub chapters: u64,
    pub summary: String,
    pub fandoms: Vec<String>,
    pub categories: Vec<String>,
    pub characters: Vec<String>,
    pub stats: Vec<(String, u64)>,
}

/// Normalized metadata for an ordered collection of works.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Series {
    pub name: String,
    pub url: String,
    pub summary: String,
    pub updated: Option<NaiveDate>,
    pub complete: bool,
    pub words: u64,
    pub works: Vec<Work>,
    pub authors: Vec<Author>,
}

/// The engine's unified output across all providers. Exactly one variant
/// per resolution attempt; `NotFound` is a successful negative answer,
/// not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NormalizedResult {
    Work(Work),
    Series(Series),
    NotFound,
}

impl NormalizedResult {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<Option<Work>> for NormalizedResult {
    fn from(work: Option<Work>) -> Self {
        work.map_or(Self::NotFound, Self::Work)
    }
}

impl From<Option<Series>> for NormalizedResult {
    fn from(series: Option<Series>) -> Self {
        series.map_or(Self::NotFound, Self::Series)
    }
}

/// A channel opted in to automatic link scanning, namespaced by guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::FromRow)]
pub struct AutoresponseLocation {
    pub guild_id: i64,
    pub channel_id: i64,
}

impl AutoresponseLocation {
    pub fn new(guild_id: i64, channel_id: i64) -> Self {
        Self {
            guild_id,
            channel_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_work_converts_to_variant() {
        let work = Work {
            title: "A Story".into(),
            ..Work::default()
        };
        assert!(matches!(
            NormalizedResult::from(Some(work)),
            NormalizedResult::Work(_)
        ));
        assert!(NormalizedResult::from(None::<Work>).is_not_found());
    }

    #[test]
    fn equal_works_hash_equal() {
        use std::hash::{DefaultHasher, Hash, Hasher};

        let work = Work {
            title: "Same".into(),
            words: 1000,
            ..Work::default()
        };
        let mut a = DefaultHasher::new();
        let mut b = DefaultHasher::new();
        work.hash(&mut a);
        work.clone().hash(&mut b);
        assert_eq!(a.finish(), b.finish());
    }
}
