use crate::routes::{contact::ContactApi, convert::ConvertApi, health::HealthApi};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(info(
    title = "jpg2pdf-server",
    description = "Image to PDF conversion, resize and compression API",
    version = "0.1.0",
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(HealthApi::openapi());
    root.merge(ConvertApi::openapi());
    root.merge(ContactApi::openapi());
    root
}
