//! Utility to print the OpenAPI document of the service.
//!
//! Writes JSON to stdout, or to the file given as the first argument.

use loan_default_api::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let doc = ApiDoc::openapi().to_pretty_json()?;

    match std::env::args().nth(1) {
        Some(path) => {
            std::fs::write(&path, doc)?;
            eprintln!("OpenAPI document written to {}", path);
        }
        None => println!("{}", doc),
    }

    Ok(())
}
