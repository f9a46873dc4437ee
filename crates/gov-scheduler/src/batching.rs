// SPDX-License-Identifier: Apache-2.0

//! Resource-level row construction and batched persistence.

use gov_core::MetricBundle;
use gov_pricing::PricingTable;
use gov_warehouse::model::ResourceUsageSnapshot;
use gov_warehouse::{RelationalWarehouse, WarehouseError};

/// Write batch size for `resource_usage_snapshots` inserts.
const BATCH_SIZE: usize = 25;

/// Builds one row per nonzero resource in `delta`, costed at the pricing
/// table's unit price.
#[must_use]
pub fn build_rows(
    time_bucket: &str,
    project: &str,
    delta: &MetricBundle,
    pricing: &PricingTable,
    source: &str,
    confidence: f64,
    allocation_basis: &str,
) -> Vec<ResourceUsageSnapshot> {
    delta
        .nonzero()
        .map(|(tag, count)| ResourceUsageSnapshot {
            time_bucket: time_bucket.to_string(),
            resource_type: tag.as_str().to_string(),
            resource_id: tag.as_str().to_string(),
            project: project.to_string(),
            count,
            cost_usd: pricing.unit_price(tag) * count as f64,
            source: source.to_string(),
            confidence,
            allocation_basis: allocation_basis.to_string(),
        })
        .collect()
}

/// Persists `rows` in batches of [`BATCH_SIZE`]. A batch that partially
/// fails (`WarehouseError::BatchFailed`) is retried as individual inserts
/// rather than propagated whole.
pub async fn persist_batched(
    warehouse: &dyn RelationalWarehouse,
    rows: Vec<ResourceUsageSnapshot>,
) -> Result<(), WarehouseError> {
    for chunk in rows.chunks(BATCH_SIZE) {
        if let Err(err) = warehouse
            .insert_resource_usage_snapshots_batch(chunk.to_vec())
            .await
        {
            tracing::warn!(
                %err,
                rows_in_batch = chunk.len(),
                "batched resource-usage write failed, falling back to individual inserts"
            );
            for row in chunk {
                warehouse
                    .insert_resource_usage_snapshots_batch(vec![row.clone()])
                    .await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gov_core::ResourceTag;
    use gov_warehouse::InMemoryWarehouse;

    #[test]
    fn build_rows_costs_each_resource_at_its_unit_price() {
        let mut delta = MetricBundle::new();
        delta.set(ResourceTag::RelationalWrites, 100);
        let pricing = PricingTable::default();

        let rows = build_rows("2026-07-28T00:00:00Z", "acme", &delta, &pricing, "external-api", 1.0, "direct read");
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.resource_type, "relational-writes");
        assert!((row.cost_usd - pricing.unit_price(ResourceTag::RelationalWrites) * 100.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn persists_more_than_one_batch_worth_of_rows() {
        let warehouse = InMemoryWarehouse::new();
        let mut delta = MetricBundle::new();
        // Only 17 resource tags exist; exercise chunking by writing the
        // same bundle across several distinct synthetic projects instead.
        delta.set(ResourceTag::RelationalWrites, 1);
        let pricing = PricingTable::default();
        let mut rows = Vec::new();
        for i in 0..40 {
            rows.extend(build_rows(
                "2026-07-28T00:00:00Z",
                &format!("project-{i}"),
                &delta,
                &pricing,
                "external-api",
                1.0,
                "direct read",
            ));
        }
        persist_batched(&warehouse, rows).await.unwrap();
    }
}
