pub mod cost;
pub mod serve;

use heft_core::{CostResolver, FsArtifactStore, FsMetadataStore, RegistryClient};
use miette::{IntoDiagnostic, Result};
use std::path::Path;
use tracing::debug;

/// Wire the filesystem stores and registry client into a resolver.
pub(crate) fn build_resolver(
    index: &Path,
    artifacts: &Path,
) -> Result<CostResolver<FsMetadataStore, FsArtifactStore>> {
    let metadata = FsMetadataStore::load(index).into_diagnostic()?;
    debug!(
        index = %index.display(),
        packages = metadata.len(),
        "loaded package index"
    );

    let registry = RegistryClient::from_env().into_diagnostic()?;
    debug!(registry = %registry.base_url(), "registry client ready");

    Ok(CostResolver::new(
        metadata,
        FsArtifactStore::new(artifacts),
        registry,
    ))
}
