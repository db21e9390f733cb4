use crate::browse::{BrowsePage, Nav, SessionManager};
use crate::error::{SessionError, StoreError};
use crate::gate::AutoresponseGate;
use crate::model::{AutoresponseLocation, NormalizedResult};
use crate::render::{Renderer, StoryCard};
use crate::resolve::{Family, ResolutionEngine};
use crate::sites::SiteRegistry;
use crate::store::AutoresponseStore;
use futures_util::StreamExt;
use futures_util::pin_mut;
use std::sync::Arc;
use uuid::Uuid;

/// The fields of an incoming chat message the core cares about. The
/// transport fills this in from whatever its native message type is.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub guild_id: Option<i64>,
    pub channel_id: i64,
    pub author_id: String,
    pub author_is_self: bool,
    pub content: String,
}

/// Reply to a search request: a plain card, or a browseable series page
/// with its session handle.
#[derive(Debug)]
pub enum SearchReply {
    Card(StoryCard),
    Browse { session_id: Uuid, page: BrowsePage },
}

/// Request/response surface consumed by the chat transport. One instance
/// per process; provider clients and the store are injected handles.
pub struct CommandService {
    registry: Arc<SiteRegistry>,
    engine: ResolutionEngine,
    renderer: Arc<Renderer>,
    sessions: SessionManager,
    store: Arc<AutoresponseStore>,
    gate: AutoresponseGate,
}

impl CommandService {
    pub fn new(
        registry: Arc<SiteRegistry>,
        engine: ResolutionEngine,
        renderer: Arc<Renderer>,
        sessions: SessionManager,
        store: Arc<AutoresponseStore>,
    ) -> Self {
        let gate = AutoresponseGate::new(Arc::clone(&store));
        Self {
            registry,
            engine,
            renderer,
            sessions,
            store,
            gate,
        }
    }

    // ── Autoresponse settings ───────────────────────────────────────────

    pub async fn autoresponse_get(
        &self,
        guild_id: i64,
    ) -> Result<Vec<AutoresponseLocation>, StoreError> {
        self.store.select_by_guild(guild_id).await
    }

    pub async fn autoresponse_add(
        &self,
        locations: &[AutoresponseLocation],
    ) -> Result<Vec<AutoresponseLocation>, StoreError> {
        self.store.add(locations).await
    }

    pub async fn autoresponse_remove(
        &self,
        locations: &[AutoresponseLocation],
    ) -> Result<Vec<AutoresponseLocation>, StoreError> {
        self.store.remove(locations).await
    }

    pub async fn autoresponse_clear(&self, guild_id: i64) -> Result<(), StoreError> {
        self.store.clear(guild_id).await
    }

    // ── Search ──────────────────────────────────────────────────────────

    /// Resolve a title-or-url query against one family and render the
    /// result. A series answer opens a browse session owned by the
    /// requester and returns its overview page.
    pub async fn search(&self, requester_id: &str, family: Family, query: &str) -> SearchReply {
        match self.engine.resolve(family, query).await {
            NormalizedResult::Series(series) => {
                let (session_id, page) = self.sessions.open(requester_id, series);
                SearchReply::Browse { session_id, page }
            }
            result => SearchReply::Card(self.renderer.render(&result)),
        }
    }

    pub fn navigate(
        &self,
        session_id: Uuid,
        actor_id: &str,
        nav: Nav,
    ) -> Result<BrowsePage, SessionError> {
        self.sessions.navigate(session_id, actor_id, nav)
    }

    // ── Message scanning ────────────────────────────────────────────────

    /// Autoresponse path for one incoming message: consult the opt-in
    /// gate, then resolve and render every detected link. Store errors
    /// surface; per-link failures never do.
    pub async fn scan_message(
        &self,
        message: &IncomingMessage,
    ) -> Result<Vec<StoryCard>, StoreError> {
        let Some(guild_id) = message.guild_id else {
            return Ok(Vec::new());
        };
        if message.author_is_self || !self.registry.contains_link(&message.content) {
            return Ok(Vec::new());
        }
        if !self.gate.should_scan(guild_id, message.channel_id).await? {
            return Ok(Vec::new());
        }
        Ok(self.scan_text(&message.content).await)
    }

    /// Resolve every link in a text blob and render the hits, in
    /// detection order. Internal per-match errors and negative answers
    /// produce no card.
    pub async fn scan_text(&self, text: &str) -> Vec<StoryCard> {
        let mut cards = Vec::new();
        let results = self.engine.resolve_all_links(text);
        pin_mut!(results);
        while let Some(result) = results.next().await {
            match result {
                Some(result) if !result.is_not_found() => {
                    cards.push(self.renderer.render(&result));
                }
                _ => {}
            }
        }
        cards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::model::{Series, Work};
    use crate::providers::StoryProvider;
    use async_trait::async_trait;

    struct FixedProvider {
        work: Option<Work>,
        series: Option<Series>,
    }

    #[async_trait]
    impl StoryProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn get_by_id(&self, _id: u64) -> Result<Option<Work>, ProviderError> {
            Ok(self.work.clone())
        }

        async fn get_series(&self, _id: u64) -> Result<Option<Series>, ProviderError> {
            Ok(self.series.clone())
        }

        async fn search_by_title(
            &self,
            _text: &str,
            _limit: u32,
        ) -> Result<Vec<Work>, ProviderError> {
            Ok(self.work.clone().into_iter().collect())
        }

        async fn get_by_url(&self, _url: &str) -> Result<Option<Work>, ProviderError> {
            Ok(self.work.clone())
        }
    }

    fn work(title: &str) -> Work {
        Work {
            title: title.into(),
            url: "https://www.fanfiction.net/s/1".into(),
            ..Work::default()
        }
    }

    async fn service(work: Option<Work>, series: Option<Series>) -> CommandService {
        let registry = SiteRegistry::builtin();
        let provider: Arc<dyn StoryProvider> = Arc::new(FixedProvider { work, series });
        let engine = ResolutionEngine::new(
            Arc::clone(&registry),
            Arc::clone(&provider),
            Arc::clone(&provider),
            provider,
        );
        let renderer = Arc::new(Renderer::new(Arc::clone(&registry)));
        let sessions = SessionManager::new(Arc::clone(&renderer), SessionManager::DEFAULT_TTL);
        let store = Arc::new(AutoresponseStore::in_memory().await.unwrap());
        CommandService::new(registry, engine, renderer, sessions, store)
    }

    #[tokio::test]
    async fn search_series_opens_owned_session() {
        let series = Series {
            name: "Saga".into(),
            url: "https://archiveofourown.org/series/9".into(),
            works: vec![work("Part 1")],
            ..Series::default()
        };
        let service = service(None, Some(series)).await;

        let reply = service
            .search("user-1", Family::Ao3, "archiveofourown.org/series/9")
            .await;
        let SearchReply::Browse { session_id, page } = reply else {
            panic!("series result must open a browse session");
        };
        assert_eq!(page.index, 0);

        let err = service.navigate(session_id, "user-2", Nav::Next).unwrap_err();
        assert!(matches!(err, SessionError::NotOwner));
        let page = service.navigate(session_id, "user-1", Nav::Next).unwrap();
        assert_eq!(page.card.title, "Part 1");
    }

    #[tokio::test]
    async fn scan_message_respects_gate() {
        let service = service(Some(work("Hit")), None).await;
        let message = IncomingMessage {
            guild_id: Some(1),
            channel_id: 10,
            author_id: "user-1".into(),
            author_is_self: false,
            content: "read fanfiction.net/s/1 sometime".into(),
        };

        assert!(service.scan_message(&message).await.unwrap().is_empty());

        service
            .autoresponse_add(&[AutoresponseLocation::new(1, 10)])
            .await
            .unwrap();
        let cards = service.scan_message(&message).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title, "Hit");
    }

    #[tokio::test]
    async fn scan_message_skips_self_and_dms() {
        let service = service(Some(work("Hit")), None).await;
        service
            .autoresponse_add(&[AutoresponseLocation::new(1, 10)])
            .await
            .unwrap();

        let own = IncomingMessage {
            guild_id: Some(1),
            channel_id: 10,
            author_id: "me".into(),
            author_is_self: true,
            content: "fanfiction.net/s/1".into(),
        };
        assert!(service.scan_message(&own).await.unwrap().is_empty());

        let dm = IncomingMessage {
            guild_id: None,
            ..own.clone()
        };
        assert!(service.scan_message(&dm).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn not_found_links_produce_no_card() {
        let service = service(None, None).await;
        let cards = service.scan_text("fanfiction.net/s/1").await;
        assert!(cards.is_empty());
    }
}
