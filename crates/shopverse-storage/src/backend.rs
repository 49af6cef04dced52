// Storage backend selection
// Decision: PostgreSQL when DATABASE_URL is set, in-memory otherwise (dev mode)
//
// StorageBackend owns the concrete stores and hands them to the core as
// trait objects, so nothing above this layer knows which backend is active.

use anyhow::Result;
use shopverse_core::{MemberDirectory, SessionStore};
use std::sync::Arc;

use crate::memory::{InMemoryMemberDirectory, InMemorySessionStore};
use crate::member_store::PgMemberDirectory;
use crate::repositories::Database;
use crate::session_store::PgSessionStore;

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres {
        sessions: Arc<PgSessionStore>,
        members: Arc<PgMemberDirectory>,
    },
    /// In-memory maps (dev mode)
    InMemory {
        sessions: Arc<InMemorySessionStore>,
        members: Arc<InMemoryMemberDirectory>,
    },
}

impl StorageBackend {
    /// Connect to PostgreSQL and apply migrations
    pub async fn postgres(database_url: &str) -> Result<Self> {
        let db = Database::from_url(database_url).await?;
        db.migrate().await?;
        Ok(Self::from_database(db))
    }

    pub fn from_database(db: Database) -> Self {
        Self::Postgres {
            sessions: Arc::new(PgSessionStore::new(db.clone())),
            members: Arc::new(PgMemberDirectory::new(db)),
        }
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory {
            sessions: Arc::new(InMemorySessionStore::new()),
            members: Arc::new(InMemoryMemberDirectory::new()),
        }
    }

    /// Check if this is dev mode (in-memory)
    pub fn is_dev_mode(&self) -> bool {
        matches!(self, Self::InMemory { .. })
    }

    /// Short backend name for health output
    pub fn name(&self) -> &'static str {
        match self {
            Self::Postgres { .. } => "postgres",
            Self::InMemory { .. } => "memory",
        }
    }

    pub fn sessions(&self) -> Arc<dyn SessionStore> {
        match self {
            Self::Postgres { sessions, .. } => sessions.clone(),
            Self::InMemory { sessions, .. } => sessions.clone(),
        }
    }

    pub fn members(&self) -> Arc<dyn MemberDirectory> {
        match self {
            Self::Postgres { members, .. } => members.clone(),
            Self::InMemory { members, .. } => members.clone(),
        }
    }

    /// Remove expired refresh sessions, returning how many were dropped
    pub async fn purge_expired_sessions(&self) -> shopverse_core::Result<u64> {
        match self {
            Self::Postgres { sessions, .. } => sessions.purge_expired().await,
            Self::InMemory { sessions, .. } => Ok(sessions.purge_expired()),
        }
    }
}
