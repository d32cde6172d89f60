//! API Request and Response Types
//!
//! This module defines all request and response types for the Tabula API.
//! Request fields that the engine requires are still declared optional so a
//! missing field is reported as `MISSING_FIELD` rather than a generic JSON
//! error.

// Response envelope
mod envelope;
pub use envelope::*;

// Table definition types
mod table;
pub use table::*;

// Row types
mod data;
pub use data::*;

// Context descriptor types
mod context;
pub use context::*;

// NL-to-SQL types
mod chat;
pub use chat::*;
