//! OpenAPI Specification Generator Binary
//!
//! Writes the Tabula OpenAPI specification as JSON to stdout.
//!
//! Usage:
//!   cargo run -p tabula-api --bin generate-openapi > openapi.json

use tabula_api::ApiDoc;

fn main() {
    match ApiDoc::to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize OpenAPI spec: {}", e);
            std::process::exit(1);
        }
    }
}
