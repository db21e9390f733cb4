pub mod chain;

use crate::model::NormalizedResult;
use crate::providers::{StoryProvider, atlas};
use crate::sites::{AO3_CODE, FFN_CODE, LinkMatch, SiteRegistry};
use chain::Chain;
use futures_util::Stream;
use std::sync::Arc;

/// A group of source sites sharing one resolution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, clap::ValueEnum)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Family {
    /// Multi-sub-work archive (AO3): direct series/work lookups plus title search.
    Ao3,
    /// Single archive with numeric story ids (FFN): aggregator with cross-site fallback.
    Ffn,
    /// Any other recognized site: URL-only lookup through the cross-site aggregator.
    Other,
}

/// Resolves detected links or raw queries into normalized results by
/// running per-family fallback chains over the provider clients.
///
/// Provider failures never escape: each family's chain recovers them or
/// degrades to `NotFound`, logging every fallback transition.
pub struct ResolutionEngine {
    registry: Arc<SiteRegistry>,
    ao3: Arc<dyn StoryProvider>,
    atlas: Arc<dyn StoryProvider>,
    fichub: Arc<dyn StoryProvider>,
}

impl ResolutionEngine {
    pub fn new(
        registry: Arc<SiteRegistry>,
        ao3: Arc<dyn StoryProvider>,
        atlas: Arc<dyn StoryProvider>,
        fichub: Arc<dyn StoryProvider>,
    ) -> Self {
        Self {
            registry,
            ao3,
            atlas,
            fichub,
        }
    }

    /// Resolve a free-text title search or URL lookup for one family.
    pub async fn resolve(&self, family: Family, query: &str) -> NormalizedResult {
        match family {
            Family::Ao3 => self.resolve_ao3(query).await,
            Family::Ffn => self.resolve_ffn(query).await,
            Family::Other => self.resolve_other(query).await,
        }
    }

    async fn resolve_ao3(&self, query: &str) -> NormalizedResult {
        let Some(link) = self.registry.find(AO3_CODE, query) else {
            return self.first_search_hit(&self.ao3, query).await;
        };
        let Some(id) = parse_link_id(&link) else {
            return NormalizedResult::NotFound;
        };
        if link.kind.as_deref() == Some("series") {
            self.ao3_series_chain(id).await
        } else {
            self.ao3_work_chain(id, &link.text).await
        }
    }

    async fn resolve_ffn(&self, query: &str) -> NormalizedResult {
        match atlas::extract_fic_id(query) {
            Some(id) => self.ffn_chain(id, query).await,
            None => self.first_search_hit(&self.atlas, query).await,
        }
    }

    async fn resolve_other(&self, query: &str) -> NormalizedResult {
        let (result, _) = Chain::new()
            .then("fichub.get_by_url", async {
                self.fichub.get_by_url(query).await.map(Into::into)
            })
            .run()
            .await;
        result
    }

    async fn ao3_series_chain(&self, id: u64) -> NormalizedResult {
        let (result, _) = Chain::new()
            .then("ao3.get_series", async {
                self.ao3.get_series(id).await.map(Into::into)
            })
            .run()
            .await;
        result
    }

    /// Work lookups prefer the cross-site aggregator, falling back to the
    /// archive's own client when the aggregator fails.
    async fn ao3_work_chain(&self, id: u64, url: &str) -> NormalizedResult {
        let (result, _) = Chain::new()
            .then("fichub.get_by_url", async {
                self.fichub.get_by_url(url).await.map(Into::into)
            })
            .then("ao3.get_by_id", async {
                self.ao3.get_by_id(id).await.map(Into::into)
            })
            .run()
            .await;
        result
    }

    /// The fallback attempt reuses the caller's original query string even
    /// though the primary attempt used the extracted id. A title-shaped
    /// query that somehow carried an id would reach fichub as a title;
    /// the upstream behavior is kept rather than reinterpreting the query.
    async fn ffn_chain(&self, id: u64, query: &str) -> NormalizedResult {
        let (result, _) = Chain::new()
            .then("atlas.get_by_id", async {
                self.atlas.get_by_id(id).await.map(Into::into)
            })
            .then("fichub.get_by_url", async {
                self.fichub.get_by_url(query).await.map(Into::into)
            })
            .run()
            .await;
        result
    }

    /// Title search taking the provider's top-ranked hit; a provider
    /// failure degrades to `NotFound`.
    async fn first_search_hit(
        &self,
        provider: &Arc<dyn StoryProvider>,
        query: &str,
    ) -> NormalizedResult {
        match provider.search_by_title(query, 1).await {
            Ok(results) => results.into_iter().next().into(),
            Err(error) => {
                tracing::warn!(
                    provider = provider.name(),
                    error = %error,
                    "title search failed"
                );
                NormalizedResult::NotFound
            }
        }
    }

    /// Resolve every detected link in `text`, lazily, in detection order.
    ///
    /// Each item aligns one-to-one with the detected matches. `None` marks
    /// an internal error isolated to that match (e.g. an unparseable
    /// captured id); it never aborts the rest of the stream.
    pub fn resolve_all_links<'a>(
        &'a self,
        text: &'a str,
    ) -> impl Stream<Item = Option<NormalizedResult>> + 'a {
        async_stream::stream! {
            for link in self.registry.scan(text) {
                yield self.resolve_match(&link).await;
            }
        }
    }

    async fn resolve_match(&self, link: &LinkMatch) -> Option<NormalizedResult> {
        match link.site.as_deref() {
            Some(FFN_CODE) => {
                let id = parse_link_id(link)?;
                Some(self.ffn_chain(id, &link.text).await)
            }
            Some(AO3_CODE) => {
                let id = parse_link_id(link)?;
                if link.kind.as_deref() == Some("series") {
                    Some(self.ao3_series_chain(id).await)
                } else {
                    Some(self.ao3_work_chain(id, &link.text).await)
                }
            }
            Some(_) => Some(self.resolve_other(&link.text).await),
            None => None,
        }
    }
}

/// Base-10 parse of a captured story/series id. Failure is an internal
/// error for the one match, not a pipeline abort.
fn parse_link_id(link: &LinkMatch) -> Option<u64> {
    let raw = link.id.as_deref()?;
    match raw.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            tracing::error!(site = ?link.site, id = raw, "captured story id failed to parse");
            None
        }
    }
}
