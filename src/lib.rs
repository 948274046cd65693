pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod render;
pub mod storage;
pub mod sync;
pub mod thread;
pub mod url;

pub use api::{ApiClient, HttpTransport, Post, Transport};
pub use config::Config;
pub use error::ApiError;
pub use rate_limit::{Endpoint, RateLimiter};
pub use storage::ThreadStorage;
pub use thread::{Thread, ThreadReconstructor, ThreadSource};
