//! Cycle-safe topological ordering of a job graph.

use super::GraphError;
use super::builder::JobGraph;
use crate::types::JobId;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Order jobs so that for every edge `(job, depends_on)`, `depends_on`
/// occurs before `job`.
///
/// Depth-first post-order over the depends-on relation with three-color
/// marking: a job is appended only after all of its dependencies have been
/// appended, and revisiting an in-progress job means a back-edge — the
/// registry declares a cycle, which is fatal for the whole request.
///
/// DFS roots iterate in ascending job id, which makes the order stable with
/// respect to input iteration order among independent branches; callers must
/// not assume any particular order among mutually independent jobs beyond
/// the dependency guarantee. The originally requested root (job 0) always
/// sorts last, since every other job is one of its transitive dependencies.
pub fn topological_sort(graph: &JobGraph) -> Result<Vec<JobId>, GraphError> {
    let n = graph.jobs.len();
    let mut deps_by_job: Vec<Vec<JobId>> = vec![Vec::new(); n];
    for edge in &graph.dependencies {
        deps_by_job[edge.job.index()].push(edge.depends_on);
    }

    let mut marks = vec![Mark::Unvisited; n];
    let mut order: Vec<JobId> = Vec::with_capacity(n);
    // (job, entered): entered=false is the pre-visit, entered=true closes it
    let mut stack: Vec<(JobId, bool)> = Vec::new();

    for root in 0..n {
        if marks[root] == Mark::Done {
            continue;
        }
        stack.push((JobId(root as u32), false));
        while let Some((job, entered)) = stack.pop() {
            if entered {
                marks[job.index()] = Mark::Done;
                order.push(job);
                continue;
            }
            match marks[job.index()] {
                Mark::Done => continue,
                // Popping a pre-visit for a job still on the current path is
                // a back-edge.
                Mark::InProgress => {
                    return Err(GraphError::CycleDetected {
                        asset: graph.job(job).name.clone(),
                    });
                }
                Mark::Unvisited => {
                    marks[job.index()] = Mark::InProgress;
                    stack.push((job, true));
                    for dep in &deps_by_job[job.index()] {
                        stack.push((*dep, false));
                    }
                }
            }
        }
    }

    Ok(order)
}
