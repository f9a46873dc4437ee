// SPDX-License-Identifier: Apache-2.0

//! [`MetricBundle`] and the closed [`ResourceTag`] taxonomy it is keyed by.

use std::collections::BTreeMap;
use std::ops::AddAssign;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The closed set of resource tags a [`MetricBundle`] may carry.
///
/// All variants are FLOW metrics (safe to sum across time buckets) except
/// where noted; STOCK metrics are tracked separately by components that
/// need them (e.g. storage gauges live in the warehouse rollup rows, not
/// here).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceTag {
    /// Relational warehouse write operations.
    RelationalWrites,
    /// Relational warehouse read operations.
    RelationalReads,
    /// Cache read operations.
    CacheReads,
    /// Cache write operations.
    CacheWrites,
    /// Cache delete operations.
    CacheDeletes,
    /// Cache list operations.
    CacheLists,
    /// Object-store class-A operations (writes/lists — typically pricier).
    ObjectClassA,
    /// Object-store class-B operations (reads — typically cheaper).
    ObjectClassB,
    /// AI inference units consumed (model-agnostic scalar, e.g. tokens).
    InferenceUnits,
    /// AI inference request count.
    InferenceRequests,
    /// Queue messages sent.
    QueueMessages,
    /// Generic compute/invocation requests.
    ComputeRequests,
    /// CPU time consumed, in milliseconds.
    CpuMs,
    /// Vector-index query operations.
    VectorQueries,
    /// Vector-index insert operations.
    VectorInserts,
    /// Durable-object request count.
    DoRequests,
    /// Durable-object GB-seconds consumed.
    DoGbSeconds,
    /// Workflow invocation count.
    WorkflowInvocations,
}

impl ResourceTag {
    /// All resource tags, in a stable order, excluding per-model inference counts
    /// (those are carried in [`MetricBundle::per_model`] and are not part of the
    /// closed enum because the model identifier set is open-ended).
    pub const ALL: [ResourceTag; 17] = [
        ResourceTag::RelationalWrites,
        ResourceTag::RelationalReads,
        ResourceTag::CacheReads,
        ResourceTag::CacheWrites,
        ResourceTag::CacheDeletes,
        ResourceTag::CacheLists,
        ResourceTag::ObjectClassA,
        ResourceTag::ObjectClassB,
        ResourceTag::InferenceUnits,
        ResourceTag::InferenceRequests,
        ResourceTag::QueueMessages,
        ResourceTag::ComputeRequests,
        ResourceTag::CpuMs,
        ResourceTag::VectorQueries,
        ResourceTag::VectorInserts,
        ResourceTag::DoRequests,
        ResourceTag::DoGbSeconds,
    ];

    /// The stable wire name used in KVCS keys and warehouse columns.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceTag::RelationalWrites => "relational-writes",
            ResourceTag::RelationalReads => "relational-reads",
            ResourceTag::CacheReads => "cache-reads",
            ResourceTag::CacheWrites => "cache-writes",
            ResourceTag::CacheDeletes => "cache-deletes",
            ResourceTag::CacheLists => "cache-lists",
            ResourceTag::ObjectClassA => "object-classA",
            ResourceTag::ObjectClassB => "object-classB",
            ResourceTag::InferenceUnits => "inference-units",
            ResourceTag::InferenceRequests => "inference-requests",
            ResourceTag::QueueMessages => "queue-messages",
            ResourceTag::ComputeRequests => "compute-requests",
            ResourceTag::CpuMs => "cpu-ms",
            ResourceTag::VectorQueries => "vector-queries",
            ResourceTag::VectorInserts => "vector-inserts",
            ResourceTag::DoRequests => "do-requests",
            ResourceTag::DoGbSeconds => "do-gb-seconds",
            ResourceTag::WorkflowInvocations => "workflow-invocations",
        }
    }
}

impl std::fmt::Display for ResourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mapping from resource tag to a nonnegative integer count, plus an
/// open-ended per-model inference breakdown.
///
/// Additivity: bundles combine pointwise; this is
/// relied on by batch accumulation, BCU additivity, and rollup summation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricBundle {
    /// Counts for the closed resource taxonomy.
    #[serde(default)]
    counts: BTreeMap<ResourceTag, u64>,
    /// Per-model inference invocation counts, keyed by model identifier.
    /// Additive like everything else in the bundle; not part of
    /// [`ResourceTag`] because the model set is open-ended and
    /// registry-driven.
    #[serde(default)]
    pub per_model: BTreeMap<String, u64>,
}

impl MetricBundle {
    /// An empty bundle (all counts zero).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (overwrites) the count for a resource tag.
    pub fn set(&mut self, tag: ResourceTag, value: u64) -> &mut Self {
        if value == 0 {
            let _ = self.counts.remove(&tag);
        } else {
            let _ = self.counts.insert(tag, value);
        }
        self
    }

    /// Returns the count for a resource tag, or zero if absent.
    #[must_use]
    pub fn get(&self, tag: ResourceTag) -> u64 {
        self.counts.get(&tag).copied().unwrap_or(0)
    }

    /// Iterates over the nonzero resource entries.
    pub fn nonzero(&self) -> impl Iterator<Item = (ResourceTag, u64)> + '_ {
        self.counts.iter().map(|(t, v)| (*t, *v))
    }

    /// True if every count (including per-model) is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.values().all(|v| *v == 0) && self.per_model.values().all(|v| *v == 0)
    }

    /// Pointwise sum with another bundle (the additivity invariant).
    #[must_use]
    pub fn combined(&self, other: &MetricBundle) -> MetricBundle {
        let mut result = self.clone();
        result += other;
        result
    }
}

impl AddAssign<&MetricBundle> for MetricBundle {
    fn add_assign(&mut self, rhs: &MetricBundle) {
        for (tag, value) in &rhs.counts {
            *self.counts.entry(*tag).or_insert(0) += value;
        }
        for (model, value) in &rhs.per_model {
            *self.per_model.entry(model.clone()).or_insert(0) += value;
        }
    }
}
