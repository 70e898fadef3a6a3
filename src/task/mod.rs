pub mod api;
pub mod providers;
pub mod types;

pub use api::{TaskApi, TaskApiError};
pub use providers::{HttpTaskApi, LocalAgent};
pub use types::{
    LiveUpdate, Message, OutboundMessage, RETRIEVED_DOCUMENTS_KEY, StreamUpdate, TASK_DONE_KEY,
};
