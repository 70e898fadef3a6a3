pub mod http;
pub mod local;

pub use http::HttpTaskApi;
pub use local::LocalAgent;
