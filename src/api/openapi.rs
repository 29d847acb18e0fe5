//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the file-relay REST API using
//! utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the file-relay REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "file-relay REST API",
        version = "0.1.0",
        description = "Fetch batches of URLs, republish the files to remote storage and list the shareable links",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Files
        crate::api::routes::submit_batch,
        crate::api::routes::list_files,

        // System
        crate::api::routes::health_check,
        crate::api::routes::event_stream,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::types::SubmitBatchRequest,
        crate::types::BatchReport,
        crate::types::FileList,
        crate::types::FileRecord,
        crate::types::FileId,
        crate::types::PipelineStage,
        crate::types::Event,

        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "files", description = "Files - Submit URL batches and list published files"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec, events"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security addon to add API key authentication scheme to OpenAPI spec
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Api-Key"),
                    ),
                ),
            );
        }
    }
}
