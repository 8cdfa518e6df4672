//! Property tests over randomly shaped asset DAGs.

use async_trait::async_trait;
use proptest::prelude::*;
use rustc_hash::FxHashSet;
use std::sync::Arc;

use assetgraph::asset::{Asset, AssetError};
use assetgraph::graphs::{JobGraph, compose_flow, topological_sort};
use assetgraph::types::{DepsData, MaterializeArgs};

struct PropAsset {
    name: String,
    deps: Vec<Arc<dyn Asset>>,
}

#[async_trait]
impl Asset for PropAsset {
    fn name(&self) -> &str {
        &self.name
    }

    fn deps(&self) -> Vec<Arc<dyn Asset>> {
        self.deps.clone()
    }

    async fn policy(&self, _: &MaterializeArgs, _: &DepsData) -> Result<bool, AssetError> {
        Ok(true)
    }

    async fn read(&self, _: &MaterializeArgs) -> Result<serde_json::Value, AssetError> {
        Ok(serde_json::Value::Null)
    }
}

/// Upper-triangular adjacency (i depends on j only for j > i), which makes
/// every generated graph a DAG by construction.
fn dag_strategy() -> impl Strategy<Value = Vec<Vec<bool>>> {
    (2usize..8).prop_flat_map(|n| {
        prop::collection::vec(prop::collection::vec(any::<bool>(), n), n)
    })
}

fn build_assets(adjacency: &[Vec<bool>]) -> Arc<dyn Asset> {
    let n = adjacency.len();
    let mut assets: Vec<Option<Arc<dyn Asset>>> = vec![None; n];
    for i in (0..n).rev() {
        let deps: Vec<Arc<dyn Asset>> = (i + 1..n)
            .filter(|j| adjacency[i][*j])
            .map(|j| assets[j].clone().expect("built bottom-up"))
            .collect();
        assets[i] = Some(Arc::new(PropAsset {
            name: format!("asset_{i}"),
            deps,
        }));
    }
    assets[0].clone().expect("root built")
}

/// Nodes reachable from 0 through declared upper-triangle edges.
fn reachable(adjacency: &[Vec<bool>]) -> FxHashSet<usize> {
    let n = adjacency.len();
    let mut seen = FxHashSet::default();
    let mut stack = vec![0usize];
    while let Some(i) = stack.pop() {
        if !seen.insert(i) {
            continue;
        }
        for j in i + 1..n {
            if adjacency[i][j] {
                stack.push(j);
            }
        }
    }
    seen
}

proptest! {
    #[test]
    fn jobs_equal_distinct_reachable_assets(adjacency in dag_strategy()) {
        let graph = JobGraph::build(build_assets(&adjacency), &vec!["house".to_string()]);
        let expected = reachable(&adjacency);
        prop_assert_eq!(graph.jobs.len(), expected.len());

        let names: FxHashSet<&str> = graph.jobs.iter().map(|j| j.name.as_str()).collect();
        prop_assert_eq!(names.len(), graph.jobs.len(), "no duplicate jobs");
    }

    #[test]
    fn edges_are_exactly_declared_reachable_pairs(adjacency in dag_strategy()) {
        let graph = JobGraph::build(build_assets(&adjacency), &vec!["house".to_string()]);
        let live = reachable(&adjacency);
        let n = adjacency.len();

        let expected: usize = live
            .iter()
            .map(|i| (i + 1..n).filter(|j| adjacency[*i][*j]).count())
            .sum();
        prop_assert_eq!(graph.dependencies.len(), expected);

        // No duplicate (parent, dependency) pairs.
        let pairs: FxHashSet<(u32, u32)> = graph
            .dependencies
            .iter()
            .map(|e| (e.job.0, e.depends_on.0))
            .collect();
        prop_assert_eq!(pairs.len(), graph.dependencies.len());
    }

    #[test]
    fn topological_order_honors_every_edge(adjacency in dag_strategy()) {
        let graph = JobGraph::build(build_assets(&adjacency), &vec!["house".to_string()]);
        let order = topological_sort(&graph).unwrap();
        prop_assert_eq!(order.len(), graph.jobs.len());

        let position = |id| order.iter().position(|j| *j == id).unwrap();
        for edge in &graph.dependencies {
            prop_assert!(position(edge.depends_on) < position(edge.job));
        }
    }

    #[test]
    fn flow_carries_identical_args_for_any_shape(
        adjacency in dag_strategy(),
        args in prop::collection::vec("[a-z0-9]{1,8}", 1..4),
    ) {
        let graph = JobGraph::build(build_assets(&adjacency), &args);
        let order = topological_sort(&graph).unwrap();
        let flow = compose_flow(&graph, &order, &args);

        let mut stack = vec![&flow];
        while let Some(node) = stack.pop() {
            prop_assert_eq!(&node.data, &args);
            stack.extend(node.children.iter());
        }
    }
}
