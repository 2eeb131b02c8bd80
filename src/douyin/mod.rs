pub mod api;
pub mod endpoints;
pub mod request;
pub mod session;

pub use api::DouyinApiClient;
pub use endpoints::{Endpoint, needs_signature};
pub use request::{ApiResponse, HttpRequestClient, RequestOptions};
pub use session::Session;
