//! Configuration module

mod site;

pub use site::ApiConfig;
pub use site::ReadingTimeSetting;
pub use site::SiteConfig;
pub use site::ValidationMode;
pub use site::{ENV_ACCESS_TOKEN, ENV_API_ENDPOINT};
