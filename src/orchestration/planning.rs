//! # Run Planning
//!
//! Pure functions deciding where discovery looks and in what order resources
//! are processed. Nothing here touches discovery, handlers or the network.
//!
//! Plans are expressed as indices into the discovered resource list, so the
//! executor never reorders or copies the resources themselves.

use crate::config::{ExecutionStrategy, LightsOutConfig};
use crate::models::{DiscoveredResource, ResourceAction};
use std::collections::HashSet;

/// A set of resources dispatched together; the next batch starts only after
/// every member has completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Shared priority, when the batch is a single priority group
    pub priority: Option<u32>,
    /// Indices into the discovered resource list, in dispatch order
    pub members: Vec<usize>,
}

/// Regions discovery should search.
///
/// 1. A target group present with a non-empty region list wins.
/// 2. Otherwise, when any region group is non-empty, the de-duplicated union
///    of all groups in name order (first occurrence kept).
/// 3. Otherwise the legacy flat list, possibly empty.
pub fn resolve_regions(config: &LightsOutConfig, target_group: Option<&str>) -> Vec<String> {
    if let Some(regions) = target_group
        .and_then(|name| config.region_groups.get(name))
        .filter(|regions| !regions.is_empty())
    {
        return regions.clone();
    }

    if config.region_groups.values().any(|regions| !regions.is_empty()) {
        let mut seen = HashSet::new();
        return config
            .region_groups
            .values()
            .flatten()
            .filter(|region| seen.insert(region.as_str()))
            .cloned()
            .collect();
    }

    config.regions.clone()
}

/// Processing order as indices into `resources`.
///
/// Start sorts by ascending priority, stop by descending; both are stable so
/// equal priorities keep discovery order. Status keeps discovery order.
pub fn order_for_action(resources: &[DiscoveredResource], action: ResourceAction) -> Vec<usize> {
    let mut order: Vec<usize> = (0..resources.len()).collect();
    match action {
        ResourceAction::Start => order.sort_by_key(|&i| resources[i].priority),
        ResourceAction::Stop => {
            order.sort_by(|&a, &b| resources[b].priority.cmp(&resources[a].priority))
        }
        ResourceAction::Status => {}
    }
    order
}

/// Split an ordered index list into contiguous runs of equal priority
pub fn partition_by_priority(resources: &[DiscoveredResource], order: &[usize]) -> Vec<Batch> {
    let mut batches: Vec<Batch> = Vec::new();
    for &index in order {
        let priority = resources[index].priority;
        match batches.last_mut() {
            Some(batch) if batch.priority == Some(priority) => batch.members.push(index),
            _ => batches.push(Batch {
                priority: Some(priority),
                members: vec![index],
            }),
        }
    }
    batches
}

/// Batches for one run of `action` under `strategy`
pub fn plan_batches(
    resources: &[DiscoveredResource],
    action: ResourceAction,
    strategy: ExecutionStrategy,
) -> Vec<Batch> {
    if resources.is_empty() {
        return Vec::new();
    }

    let order = order_for_action(resources, action);
    let singletons = |order: Vec<usize>| -> Vec<Batch> {
        order
            .into_iter()
            .map(|i| Batch {
                priority: Some(resources[i].priority),
                members: vec![i],
            })
            .collect()
    };

    match (action, strategy) {
        (_, ExecutionStrategy::Sequential) => singletons(order),
        (ResourceAction::Status, _) | (_, ExecutionStrategy::Parallel) => vec![Batch {
            priority: None,
            members: order,
        }],
        (_, ExecutionStrategy::GroupedParallel) => partition_by_priority(resources, &order),
    }
}
