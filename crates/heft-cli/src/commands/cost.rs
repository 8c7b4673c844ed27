//! One-shot cost computation for a stored package.

use heft_core::{is_valid_package_id, CostError};
use miette::{IntoDiagnostic, Result};
use std::path::Path;

pub async fn run(id: &str, deps: bool, index: &Path, artifacts: &Path, json: bool) -> Result<()> {
    if !is_valid_package_id(id) {
        return Err(CostError::invalid_request(format!(
            "Invalid package identifier '{id}'"
        )))
        .into_diagnostic();
    }

    let resolver = super::build_resolver(index, artifacts)?;

    let record = resolver
        .lookup(id)
        .into_diagnostic()?
        .ok_or_else(|| CostError::not_found(id))
        .into_diagnostic()?;

    let report = resolver.report(&record, deps).await;

    let mut body = serde_json::Map::new();
    body.insert(
        id.to_string(),
        serde_json::to_value(report).into_diagnostic()?,
    );
    let body = serde_json::Value::Object(body);

    if json {
        println!("{body}");
    } else {
        println!("{}", serde_json::to_string_pretty(&body).into_diagnostic()?);
    }

    Ok(())
}
