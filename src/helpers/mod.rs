//! Helper functions for rendering
//!
//! Date formatting, HTML escaping and URL generation shared by the
//! content pipeline and the templates.

pub mod date;
pub mod html;
pub mod url;

pub use date::*;
pub use html::*;
pub use url::*;
