pub mod config;
pub mod db;
pub mod error;
pub mod google;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod router;

pub use error::RelayError;
pub use google::credentials::ServiceAccountCredential;
pub use google::token::BearerToken;
