pub mod content_router;
pub mod credentials;
pub mod dispatcher;
pub mod endpoints;
pub mod error;
pub mod facade;
pub mod forms;
pub mod http_common;
pub mod nlp;
pub mod request_builder;
pub mod response_normalizer;
pub mod rich_content;
pub mod segments;
pub mod sink;
pub mod types;
pub mod voice_markup;
