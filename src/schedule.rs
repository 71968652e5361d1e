//! Linearization of the task registry.
//!
//! A depth-first walk over the resolved graph: roots in registration order,
//! dependencies in declaration order, every task visited once. The order is
//! therefore a pure function of the registry.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::error::ConvertError;
use crate::graph::Registry;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Active,
    Done,
}

/// The registry's task names such that every task follows its
/// dependencies.
pub fn order(registry: &Registry) -> Result<Vec<&str>, ConvertError> {
    let graph = registry.graph()?;
    let nodes = resolve(&graph)?;
    Ok(nodes.into_iter().map(|node| graph[node]).collect())
}

fn resolve(graph: &DiGraph<&str, ()>) -> Result<Vec<NodeIndex>, ConvertError> {
    let mut marks = vec![Mark::Unvisited; graph.node_count()];
    let mut order = Vec::with_capacity(graph.node_count());

    for node in graph.node_indices() {
        visit(graph, node, &mut marks, &mut order)?;
    }

    Ok(order)
}

fn visit(
    graph: &DiGraph<&str, ()>,
    node: NodeIndex,
    marks: &mut [Mark],
    order: &mut Vec<NodeIndex>,
) -> Result<(), ConvertError> {
    match marks[node.index()] {
        Mark::Done => return Ok(()),
        Mark::Active => return Err(ConvertError::CycleDetected(graph[node].to_string())),
        Mark::Unvisited => {}
    }

    marks[node.index()] = Mark::Active;

    // petgraph yields the most recently added edge first
    let mut dependencies: Vec<_> = graph.neighbors_directed(node, Direction::Incoming).collect();
    dependencies.reverse();
    for dependency in dependencies {
        visit(graph, dependency, marks, order)?;
    }

    marks[node.index()] = Mark::Done;
    order.push(node);

    Ok(())
}

/// Consumes the registry, returning its tasks in execution order.
pub fn schedule(registry: Registry) -> Result<Vec<Task>, ConvertError> {
    let order = {
        let graph = registry.graph()?;
        resolve(&graph)?
    };

    let mut slots: Vec<Option<Task>> = registry.into_tasks().into_iter().map(Some).collect();
    let tasks: Vec<Task> = order
        .into_iter()
        .filter_map(|node| slots[node.index()].take())
        .collect();

    debug!(
        order = ?tasks.iter().map(|task| task.name.as_str()).collect::<Vec<_>>(),
        "scheduled tasks"
    );

    Ok(tasks)
}
