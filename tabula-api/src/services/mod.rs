//! Service Layer
//!
//! Operations that combine the database with an external provider. Route
//! handlers call these; pure DB operations go straight to `DbClient`.

mod ask_service;
mod indexer_service;

pub use ask_service::*;
pub use indexer_service::*;
