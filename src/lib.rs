pub mod errors;
pub mod models;
pub mod service;
pub mod store;
pub mod transport;

pub use errors::ChatError;
pub use models::{Conversation, Message, MessageRole};
pub use service::direct::DirectChatService;
pub use service::lifecycle::RequestLifecycleController;
pub use service::{ChatSubmitter, RequestObserver, RequestState};
pub use store::ChatStore;
pub use transport::http::HttpRouterClient;
pub use transport::RouterConfig;
