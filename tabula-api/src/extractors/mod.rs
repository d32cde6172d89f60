//! Request extractors whose rejections render in the standard error
//! envelope instead of axum's plain-text defaults.

mod json;
mod path;

pub use json::ApiJson;
pub use path::{RowPath, TablePath};
