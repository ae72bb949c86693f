//! OpenAPI document and Swagger UI for the `/apples` API.
//!
//! Apples are open JSON objects on the wire; [`AppleSchema`] documents the
//! conventional fields only. Extra fields are accepted and returned as-is.

use axum::Router;
use utoipa::openapi::server::Server;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ErrorBody;
use crate::network::handlers::apples;

/// Documented shape of an apple.
#[derive(Debug, ToSchema)]
#[schema(as = Apple)]
pub struct AppleSchema {
    /// Unique name of the apple.
    #[schema(example = "gala")]
    pub name: String,
    #[schema(example = json!(["red", "yellow"]))]
    pub colors: Vec<String>,
    #[schema(example = json!(["sweet"]))]
    pub flavors: Vec<String>,
}

/// Documented shape of a delete confirmation.
#[derive(Debug, ToSchema)]
#[schema(as = DeleteReceipt)]
pub struct DeleteReceiptSchema {
    #[schema(example = "Apple \"gala\" deleted")]
    pub message: String,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Apples API",
        version = "1.0.0",
        description = "A simple API for managing apples"
    ),
    paths(
        apples::list_apples,
        apples::get_apple,
        apples::head_apple,
        apples::create_apple,
        apples::replace_apple,
        apples::patch_apple,
        apples::delete_apple,
    ),
    components(schemas(AppleSchema, DeleteReceiptSchema, ErrorBody)),
    tags((name = "apples", description = "Apple records"))
)]
pub struct ApiDoc;

/// Path the OpenAPI JSON is served from, relative to the route prefix.
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Path of the Swagger UI, relative to the route prefix.
pub const DOCS_PATH: &str = "/docs";

/// Builds the OpenAPI document, pointing clients at `prefix` when routes are
/// mounted below the root.
#[must_use]
pub fn document(prefix: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    if !prefix.is_empty() {
        doc.servers = Some(vec![Server::new(prefix)]);
    }
    doc
}

/// Router serving the Swagger UI and the OpenAPI JSON under `prefix`.
pub fn docs_router<S>(prefix: &str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new(format!("{prefix}{DOCS_PATH}"))
        .url(format!("{prefix}{OPENAPI_JSON_PATH}"), document(prefix))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_apple_operation() {
        let doc = document("");
        assert_eq!(doc.info.title, "Apples API");
        assert_eq!(doc.info.version, "1.0.0");

        let list = doc.paths.paths.get("/apples").expect("/apples documented");
        assert!(list.get.is_some());
        assert!(list.post.is_some());

        let item = doc
            .paths
            .paths
            .get("/apples/{name}")
            .expect("/apples/{name} documented");
        assert!(item.get.is_some());
        assert!(item.head.is_some());
        assert!(item.put.is_some());
        assert!(item.patch.is_some());
        assert!(item.delete.is_some());
    }

    #[test]
    fn document_registers_schemas() {
        let doc = document("");
        let schemas = doc.components.expect("components").schemas;
        assert!(schemas.contains_key("Apple"));
        assert!(schemas.contains_key("DeleteReceipt"));
        assert!(schemas.contains_key("ErrorBody"));
    }

    #[test]
    fn prefix_becomes_server_url() {
        assert!(document("").servers.is_none());
        let servers = document("/fruit").servers.expect("servers");
        assert_eq!(servers[0].url, "/fruit");
    }
}
