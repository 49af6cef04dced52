// Storage layer for Shopverse auth
// Decision: Support both PostgreSQL (production) and in-memory (dev mode)
//
// This crate provides implementations for the core collaborator traits:
// - PgSessionStore / InMemorySessionStore: implement SessionStore
// - PgMemberDirectory / InMemoryMemberDirectory: implement MemberDirectory
// - Argon2Verifier: implements CredentialVerifier

pub mod backend;
pub mod member_store;
pub mod memory;
pub mod models;
pub mod password;
pub mod repositories;
pub mod session_store;

pub use backend::StorageBackend;
pub use member_store::PgMemberDirectory;
pub use memory::{InMemoryMemberDirectory, InMemorySessionStore, PlaintextVerifier};
pub use models::*;
pub use password::{hash_password, verify_password, Argon2Verifier};
pub use repositories::Database;
pub use session_store::PgSessionStore;
