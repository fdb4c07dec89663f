// Prints the OpenAPI document served at /api-docs/openapi.json
// Usage: cargo run --bin openapi_export > openapi.json

use localized_errors::api::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let json = ApiDoc::openapi().to_pretty_json()?;
    println!("{json}");
    Ok(())
}
