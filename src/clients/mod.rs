pub mod api_client;

pub use api_client::{parse_response, ApiClient, QuestionApi};
