//! MCP sessions.
//!
//! A session binds a client-chosen id to the tenant that opened it. The tenant
//! identity and upstream credential are fixed at creation: a later request
//! presenting the same id with another tenant's token is refused instead of
//! rebinding the session.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Who a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantIdentity {
    pub tenant_id: String,
    pub tenant_name: String,
    pub plan: String,
}

pub struct Session {
    pub id: String,
    pub tenant: TenantIdentity,
    upstream_token: String,
    pub created_at: DateTime<Utc>,
    initialized: AtomicBool,
}

impl Session {
    pub fn new(
        id: impl Into<String>,
        tenant: TenantIdentity,
        upstream_token: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tenant,
            upstream_token: upstream_token.into(),
            created_at: Utc::now(),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn upstream_token(&self) -> &str {
        &self.upstream_token
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Once set, the flag never goes back.
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("tenant", &self.tenant)
            .field("created_at", &self.created_at)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session {0} belongs to another tenant")]
    TenantMismatch(String),
}

/// Storage for live sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns a live session and refreshes its last use.
    async fn get(&self, id: &str) -> Option<Arc<Session>>;

    /// Inserts `session` unless a live session with the same id exists, in
    /// which case the existing one is returned untouched.
    async fn put(&self, session: Arc<Session>) -> Arc<Session>;

    async fn delete(&self, id: &str) -> bool;

    async fn len(&self) -> usize;

    /// Drops expired sessions and returns how many were removed.
    async fn cleanup_expired(&self) -> usize;
}

/// Last use, with a sequence number that orders equal instants.
type Recency = (Instant, u64);

struct StoredSession {
    session: Arc<Session>,
    recency: Recency,
}

/// Sessions by id plus an index ordered by last use, oldest first.
#[derive(Default)]
struct SessionTable {
    sessions: HashMap<String, StoredSession>,
    by_last_use: BTreeMap<Recency, String>,
    next_seq: u64,
}

impl SessionTable {
    fn stamp(&mut self, now: Instant) -> Recency {
        let seq = self.next_seq;
        self.next_seq += 1;
        (now, seq)
    }

    fn last_use(&self, id: &str) -> Option<Instant> {
        self.sessions.get(id).map(|entry| entry.recency.0)
    }

    fn insert(&mut self, session: Arc<Session>, now: Instant) {
        self.remove(&session.id);
        let recency = self.stamp(now);
        self.by_last_use.insert(recency, session.id.clone());
        self.sessions
            .insert(session.id.clone(), StoredSession { session, recency });
    }

    /// Moves `id` to the most recent end of the index.
    fn touch(&mut self, id: &str, now: Instant) -> Option<Arc<Session>> {
        let recency = self.stamp(now);
        let entry = self.sessions.get_mut(id)?;
        self.by_last_use.remove(&entry.recency);
        self.by_last_use.insert(recency, id.to_string());
        entry.recency = recency;
        Some(entry.session.clone())
    }

    fn remove(&mut self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some(entry) => {
                self.by_last_use.remove(&entry.recency);
                true
            }
            None => false,
        }
    }

    fn pop_oldest(&mut self) -> Option<String> {
        let (_, id) = self.by_last_use.pop_first()?;
        self.sessions.remove(&id);
        Some(id)
    }

    /// Expired sessions are a prefix of the index.
    fn remove_expired(&mut self, now: Instant, ttl: Duration) -> usize {
        let mut removed = 0;
        while let Some((&(last_use, _), _)) = self.by_last_use.first_key_value() {
            if now.duration_since(last_use) <= ttl {
                break;
            }
            if self.pop_oldest().is_some() {
                removed += 1;
            }
        }
        removed
    }
}

/// In-process store with idle expiry and a size cap.
pub struct InMemorySessionStore {
    entries: Mutex<SessionTable>,
    ttl: Duration,
    max_sessions: usize,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            entries: Mutex::new(SessionTable::default()),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    fn is_live(&self, last_use: Instant, now: Instant) -> bool {
        now.duration_since(last_use) <= self.ttl
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: &str) -> Option<Arc<Session>> {
        let mut table = self.entries.lock().await;
        let now = Instant::now();

        if !self.is_live(table.last_use(id)?, now) {
            table.remove(id);
            debug!("Session {} expired", id);
            return None;
        }

        table.touch(id, now)
    }

    async fn put(&self, session: Arc<Session>) -> Arc<Session> {
        let mut table = self.entries.lock().await;
        let now = Instant::now();

        match table.last_use(&session.id) {
            Some(last_use) if self.is_live(last_use, now) => {
                if let Some(existing) = table.touch(&session.id, now) {
                    return existing;
                }
            }
            Some(_) => {
                table.remove(&session.id);
            }
            None => {}
        }

        if table.sessions.len() >= self.max_sessions {
            table.remove_expired(now, self.ttl);
        }
        while table.sessions.len() >= self.max_sessions {
            match table.pop_oldest() {
                Some(id) => debug!("Evicting least recently used session {}", id),
                None => break,
            }
        }

        table.insert(session.clone(), now);
        session
    }

    async fn delete(&self, id: &str) -> bool {
        self.entries.lock().await.remove(id)
    }

    async fn len(&self) -> usize {
        self.entries.lock().await.sessions.len()
    }

    async fn cleanup_expired(&self) -> usize {
        let mut table = self.entries.lock().await;
        table.remove_expired(Instant::now(), self.ttl)
    }
}

/// Session lifecycle on top of a [`SessionStore`].
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Returns the session for `id`, creating it for this tenant when absent.
    ///
    /// Concurrent first requests with the same id all receive the same
    /// session object.
    pub async fn get_or_create(
        &self,
        id: &str,
        tenant: &TenantIdentity,
        upstream_token: &str,
    ) -> Result<Arc<Session>, SessionError> {
        let session = match self.store.get(id).await {
            Some(session) => session,
            None => {
                let candidate = Arc::new(Session::new(id, tenant.clone(), upstream_token));
                let stored = self.store.put(candidate.clone()).await;
                if Arc::ptr_eq(&stored, &candidate) {
                    info!(
                        "Session {} created for tenant {} ({})",
                        id, tenant.tenant_id, tenant.plan
                    );
                }
                stored
            }
        };

        if session.tenant.tenant_id != tenant.tenant_id {
            return Err(SessionError::TenantMismatch(id.to_string()));
        }
        Ok(session)
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.store.get(id).await
    }

    /// Returns false when the session does not exist.
    pub async fn mark_initialized(&self, id: &str) -> bool {
        match self.store.get(id).await {
            Some(session) => {
                session.mark_initialized();
                true
            }
            None => false,
        }
    }

    /// Ends a session owned by `tenant_id`. Returns whether one was removed.
    pub async fn terminate(&self, id: &str, tenant_id: &str) -> Result<bool, SessionError> {
        match self.store.get(id).await {
            Some(session) if session.tenant.tenant_id != tenant_id => {
                Err(SessionError::TenantMismatch(id.to_string()))
            }
            Some(_) => Ok(self.store.delete(id).await),
            None => Ok(false),
        }
    }

    pub async fn active_sessions(&self) -> usize {
        self.store.len().await
    }

    pub async fn cleanup_expired(&self) -> usize {
        self.store.cleanup_expired().await
    }
}
