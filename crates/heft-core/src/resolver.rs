//! Dependency cost resolution.
//!
//! Computes the installed footprint of a stored package: its own archived
//! size plus the deduplicated sizes of its transitive dependencies, fetched
//! lazily from the artifact store and the registry.
//!
//! The traversal is an explicit depth-first worklist. The visited set is
//! created per top-level query and threaded through by reference, so
//! concurrent queries cannot interfere; a key is inserted before its unit is
//! expanded, which bounds the walk by distinct resolution units regardless of
//! cycles.

use crate::error::CostError;
use crate::manifest::{extract_manifest, Manifest};
use crate::probe::{probe_tarball_response, BYTES_PER_MB};
use crate::registry::{tarball_url_for, RegistryClient};
use crate::round::round_mb;
use crate::store::{normalize_artifact_key, ArtifactStore, MetadataStore, PackageRecord};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Smallest size a registry-hosted unit reports, in megabytes.
const MIN_UNIT_MB: f64 = 0.001;

/// Ceilings for one traversal, guarding against pathological graphs.
#[derive(Debug, Clone)]
pub struct ResolveLimits {
    /// Maximum dependency depth below the top-level package.
    pub max_depth: usize,
    /// Maximum resolution units expanded per query.
    pub max_units: usize,
}

impl Default for ResolveLimits {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_units: 512,
        }
    }
}

/// Cost figures for one package, in rounded megabytes.
///
/// `total_cost >= standalone_cost` always holds: dependency contributions are
/// never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostReport {
    /// Size of the package's own archive; omitted for standalone-only queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standalone_cost: Option<f64>,
    /// Standalone size plus deduplicated transitive dependency sizes.
    pub total_cost: f64,
}

/// Outcome of a single size lookup.
///
/// Distinguishes a measured size from a failed lookup, so the best-effort
/// aggregation is one explicit decision instead of scattered zero fallbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum SizeOutcome {
    /// Size measured, in megabytes.
    Measured(f64),
    /// Lookup failed; the unit contributes nothing.
    Unavailable { reason: String },
}

impl SizeOutcome {
    fn from_result(result: Result<f64, CostError>) -> Self {
        match result {
            Ok(mb) => Self::Measured(mb),
            Err(e) => Self::Unavailable {
                reason: e.to_string(),
            },
        }
    }
}

/// Best-effort aggregation policy: an unavailable size contributes zero.
///
/// A single unreachable dependency under-reports the total rather than
/// failing the whole query.
fn best_effort(unit: &str, outcome: SizeOutcome) -> f64 {
    match outcome {
        SizeOutcome::Measured(mb) => mb,
        SizeOutcome::Unavailable { reason } => {
            warn!(unit, reason, "size unavailable, counting as zero");
            0.0
        }
    }
}

/// Strip a leading `^` or `~` qualifier from a version range.
///
/// Ranges are not solved against available versions; the stripped literal is
/// queried directly, with the registry `latest` tag as the fallback.
#[must_use]
pub fn normalize_range(range: &str) -> &str {
    range.strip_prefix(['^', '~']).unwrap_or(range)
}

/// One dependency edge waiting to be expanded.
#[derive(Debug)]
struct PendingUnit {
    name: String,
    range: String,
    depth: usize,
}

/// Resolves package cost reports against a metadata store, an artifact store
/// and the registry.
///
/// Holds no per-query state; every query derives all values from external
/// state and owns its visited set for the duration of the call.
pub struct CostResolver<M, A> {
    metadata: M,
    artifacts: A,
    registry: RegistryClient,
    limits: ResolveLimits,
}

impl<M: MetadataStore, A: ArtifactStore> CostResolver<M, A> {
    /// Create a resolver with default limits.
    pub fn new(metadata: M, artifacts: A, registry: RegistryClient) -> Self {
        Self {
            metadata,
            artifacts,
            registry,
            limits: ResolveLimits::default(),
        }
    }

    /// Override the traversal ceilings.
    #[must_use]
    pub fn with_limits(mut self, limits: ResolveLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Look up a stored package record by identifier.
    pub fn lookup(&self, id: &str) -> Result<Option<PackageRecord>, CostError> {
        self.metadata.lookup_by_id(id)
    }

    /// Standalone size of the stored artifact, in rounded megabytes.
    ///
    /// The content length comes from the artifact store's metadata; no
    /// decompression happens here. An unknown stored size is absorbed to
    /// zero: it must not fail a query whose package record exists.
    pub fn standalone_cost(&self, record: &PackageRecord) -> f64 {
        let unit = format!("{}@{}", record.name, record.version);
        let outcome = SizeOutcome::from_result(self.stored_size_mb(&record.artifact_key));
        round_mb(best_effort(&unit, outcome))
    }

    /// Standalone size plus the deduplicated transitive dependency sizes.
    pub async fn total_cost(&self, record: &PackageRecord) -> f64 {
        let standalone = self.standalone_cost(record);

        let edges = self
            .stored_manifest(&record.artifact_key)
            .map(|m| manifest_edges(&m))
            .unwrap_or_default();

        let mut visited = HashSet::new();
        let total = standalone + self.dependency_cost(&edges, &mut visited).await;
        round_mb(total)
    }

    /// Build the report consumed by the service surface.
    pub async fn report(&self, record: &PackageRecord, include_dependencies: bool) -> CostReport {
        let standalone = self.standalone_cost(record);

        if include_dependencies {
            CostReport {
                standalone_cost: Some(standalone),
                total_cost: self.total_cost(record).await,
            }
        } else {
            CostReport {
                standalone_cost: None,
                total_cost: standalone,
            }
        }
    }

    /// Walk the dependency graph depth-first and sum per-unit sizes.
    ///
    /// Lookups run sequentially, one in flight, which bounds external service
    /// load. Per-unit failures are absorbed through [`best_effort`]; only the
    /// visited set and the configured ceilings stop the walk.
    pub async fn dependency_cost(
        &self,
        edges: &[(String, String)],
        visited: &mut HashSet<String>,
    ) -> f64 {
        let mut stack: Vec<PendingUnit> = Vec::new();
        for (name, range) in edges.iter().rev() {
            stack.push(PendingUnit {
                name: name.clone(),
                range: range.clone(),
                depth: 1,
            });
        }

        let mut total = 0.0;
        let mut expanded = 0usize;

        while let Some(unit) = stack.pop() {
            let version = normalize_range(&unit.range).to_string();
            let key = format!("{}@{version}", unit.name);

            // A depth-skipped unit stays unvisited: it may still be reachable
            // within the ceiling through another edge.
            if unit.depth > self.limits.max_depth {
                warn!(unit = %key, depth = unit.depth, "max depth exceeded, skipping unit");
                continue;
            }

            // Insert before expanding: a second encounter is a no-op.
            if !visited.insert(key.clone()) {
                continue;
            }

            expanded += 1;
            if expanded > self.limits.max_units {
                warn!(
                    limit = self.limits.max_units,
                    "max resolution units reached, stopping walk"
                );
                break;
            }

            let outcome =
                SizeOutcome::from_result(self.registry_unit_size(&unit.name, &version).await);
            total += best_effort(&key, outcome);

            // By convention the unit's own manifest is stored under name-version.
            if let Some(manifest) = self.stored_manifest(&format!("{}-{version}", unit.name)) {
                for (dep_name, dep_range) in manifest_edges(&manifest).into_iter().rev() {
                    stack.push(PendingUnit {
                        name: dep_name,
                        range: dep_range,
                        depth: unit.depth + 1,
                    });
                }
            }
        }

        total
    }

    /// Size of one registry-hosted unit via a streaming tarball probe.
    async fn registry_unit_size(&self, name: &str, version: &str) -> Result<f64, CostError> {
        let packument = self.registry.fetch_packument(name).await?;

        let url = tarball_url_for(&packument, version).ok_or_else(|| {
            CostError::registry(format!("No tarball reference for '{name}@{version}'"))
        })?;

        debug!(name, version, url, "probing registry tarball");
        let response = self.registry.fetch_tarball(url).await?;
        let mb = probe_tarball_response(response).await?;

        Ok(round_mb(mb.max(MIN_UNIT_MB)))
    }

    fn stored_size_mb(&self, artifact_key: &str) -> Result<f64, CostError> {
        match self.artifacts.head_size(&normalize_artifact_key(artifact_key))? {
            Some(bytes) => Ok(bytes as f64 / BYTES_PER_MB),
            None => Err(CostError::store(format!(
                "No stored artifact for key '{artifact_key}'"
            ))),
        }
    }

    fn stored_manifest(&self, artifact_key: &str) -> Option<Manifest> {
        let bytes = self
            .artifacts
            .get_bytes(&normalize_artifact_key(artifact_key))
            .ok()??;
        extract_manifest(&bytes)
    }
}

fn manifest_edges(manifest: &Manifest) -> Vec<(String, String)> {
    manifest
        .dependencies
        .iter()
        .map(|(name, range)| (name.clone(), range.clone()))
        .collect()
}
