use crate::error::SessionError;
use crate::model::Series;
use crate::render::{Renderer, StoryCard};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A navigation transition requested by the session owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Previous,
    Next,
    Jump(usize),
}

/// Which transitions are currently enabled, recomputed after every
/// transition from (index, last page) alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavFlags {
    pub previous_enabled: bool,
    pub next_enabled: bool,
}

pub fn nav_flags(index: usize, last_page: usize) -> NavFlags {
    NavFlags {
        previous_enabled: index > 0,
        next_enabled: index < last_page,
    }
}

/// One rendered page of a browse session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowsePage {
    pub index: usize,
    pub card: StoryCard,
    pub flags: NavFlags,
}

/// Interactive paging over one series result, owned by the user who
/// triggered it. Page 0 is the series overview; pages 1..=N are the
/// sub-entries in list order. Expiry is one-way: a released session never
/// accepts another transition, even one racing the deadline.
pub struct BrowseSession {
    pub id: Uuid,
    owner_id: String,
    series: Series,
    index: usize,
    deadline: Instant,
    ttl: Duration,
    released: bool,
}

impl BrowseSession {
    pub fn new(owner_id: impl Into<String>, series: Series, ttl: Duration, now: Instant) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            series,
            index: 0,
            deadline: now + ttl,
            ttl,
            released: false,
        }
    }

    /// Index of the last page (equal to the number of sub-entries).
    pub fn last_page(&self) -> usize {
        self.series.works.len()
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.released || now >= self.deadline
    }

    pub fn current_page(&self, renderer: &Renderer) -> BrowsePage {
        BrowsePage {
            index: self.index,
            card: renderer.render_page(&self.series, self.index),
            flags: nav_flags(self.index, self.last_page()),
        }
    }

    /// Apply one transition. Non-owner attempts and expired sessions are
    /// rejected without mutating the page index; a successful transition
    /// refreshes the idle deadline.
    pub fn apply(
        &mut self,
        actor_id: &str,
        nav: Nav,
        now: Instant,
        renderer: &Renderer,
    ) -> Result<BrowsePage, SessionError> {
        if actor_id != self.owner_id {
            return Err(SessionError::NotOwner);
        }
        if self.is_expired(now) {
            self.released = true;
            return Err(SessionError::Expired);
        }

        let last = self.last_page();
        self.index = match nav {
            Nav::Previous => self.index.saturating_sub(1),
            Nav::Next => (self.index + 1).min(last),
            Nav::Jump(page) => {
                if page > last {
                    return Err(SessionError::PageOutOfRange { page, last });
                }
                page
            }
        };
        self.deadline = now + self.ttl;
        Ok(self.current_page(renderer))
    }

    /// Explicit close; one-way like the idle timeout.
    pub fn close(&mut self) {
        self.released = true;
    }
}

/// Owns all live browse sessions, keyed by session id.
pub struct SessionManager {
    renderer: Arc<Renderer>,
    ttl: Duration,
    sessions: Mutex<HashMap<Uuid, BrowseSession>>,
}

impl SessionManager {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(180);

    pub fn new(renderer: Arc<Renderer>, ttl: Duration) -> Self {
        Self {
            renderer,
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Open a session for a series result and return its overview page.
    pub fn open(&self, owner_id: &str, series: Series) -> (Uuid, BrowsePage) {
        let session = BrowseSession::new(owner_id, series, self.ttl, Instant::now());
        let id = session.id;
        let page = session.current_page(&self.renderer);
        self.lock().insert(id, session);
        (id, page)
    }

    pub fn navigate(
        &self,
        id: Uuid,
        actor_id: &str,
        nav: Nav,
    ) -> Result<BrowsePage, SessionError> {
        let now = Instant::now();
        let mut sessions = self.lock();
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        let outcome = session.apply(actor_id, nav, now, &self.renderer);
        if matches!(outcome, Err(SessionError::Expired)) {
            sessions.remove(&id);
        }
        outcome
    }

    pub fn close(&self, id: Uuid) -> Result<(), SessionError> {
        self.lock()
            .remove(&id)
            .map(|mut session| session.close())
            .ok_or(SessionError::NotFound(id))
    }

    /// Drop every session past its idle deadline; returns how many.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        before - sessions.len()
    }

    pub fn live_sessions(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, BrowseSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
