use crate::routes::{chat, feedback, health};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(info(
    title = "xlate-server",
    description = "Streaming code-translation chat API",
    version = "0.1.0",
    contact(name = "xlate", url = "https://github.com/xlate-dev/xlate")
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(chat::ChatApi::openapi());
    root.merge(feedback::FeedbackApi::openapi());
    root
}
