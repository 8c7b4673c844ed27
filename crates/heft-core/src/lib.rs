#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]

//! Core engine for heft: package footprint computation.
//!
//! Provides:
//! - Streaming size probing of gzip-compressed tar archives
//! - Dependency manifest extraction from stored zip artifacts
//! - An npm registry client for packuments and tarball streams
//! - Metadata/artifact store contracts with filesystem backends
//! - The cycle-safe dependency cost resolver

pub mod error;
pub mod manifest;
pub mod probe;
pub mod registry;
pub mod resolver;
pub mod round;
pub mod store;

pub use error::{codes, CostError};
pub use manifest::{extract_manifest, Manifest};
pub use probe::{probe_tarball_response, probe_tgz, probe_tgz_mb, BYTES_PER_MB};
pub use registry::{
    get_latest_version, get_tarball_url, tarball_url_for, RegistryClient, DEFAULT_REGISTRY,
    REGISTRY_ENV,
};
pub use resolver::{normalize_range, CostReport, CostResolver, ResolveLimits, SizeOutcome};
pub use round::{round_mb, round_to_precision};
pub use store::{
    is_valid_package_id, normalize_artifact_key, ArtifactStore, FsArtifactStore, FsMetadataStore,
    MetadataStore, PackageRecord,
};
