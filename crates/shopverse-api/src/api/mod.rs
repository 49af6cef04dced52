// HTTP API routes
//
// Member-facing routes and the shared response envelope. Authentication
// routes (login, reissue, logout) live in the auth module.

pub mod common;
pub mod members;
pub mod validation;

// Re-export common types
pub use common::ApiResponse;
