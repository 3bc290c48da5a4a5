// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dependency graph over plugin ids.
//!
//! Produces a load order with dependencies first (Kahn's algorithm with a
//! sorted ready set, so the order is deterministic) and reports every
//! `requires` cycle. Edges to unknown ids are ignored here; the registry
//! reports those as missing dependencies.

use std::collections::{BTreeMap, BTreeSet};

/// Result of resolving the `requires` graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Acyclic nodes, dependencies before dependents, followed by nodes that
    /// only depend (transitively) on a cycle.
    pub order: Vec<String>,
    /// Each cycle's members, sorted. Disjoint.
    pub cycles: Vec<Vec<String>>,
}

/// Resolve a graph given as `id -> requires`.
pub fn resolve(graph: &BTreeMap<String, Vec<String>>) -> Resolution {
    // Deduplicated edges to known nodes only.
    let edges: BTreeMap<&str, BTreeSet<&str>> = graph
        .iter()
        .map(|(id, requires)| {
            let deps = requires
                .iter()
                .map(String::as_str)
                .filter(|d| graph.contains_key(*d))
                .collect();
            (id.as_str(), deps)
        })
        .collect();

    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut pending: BTreeMap<&str, usize> = BTreeMap::new();
    for (id, deps) in &edges {
        pending.insert(*id, deps.len());
        for dep in deps {
            dependents.entry(*dep).or_default().push(*id);
        }
    }

    let mut ready: BTreeSet<&str> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut order = Vec::with_capacity(edges.len());
    while let Some(id) = ready.pop_first() {
        order.push(id.to_string());
        for dependent in dependents.get(id).into_iter().flatten() {
            if let Some(count) = pending.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    // Whatever is left sits on a cycle or downstream of one.
    let placed: BTreeSet<&str> = order.iter().map(String::as_str).collect();
    let leftover: BTreeSet<&str> = edges
        .keys()
        .copied()
        .filter(|id| !placed.contains(id))
        .collect();

    let reach: BTreeMap<&str, BTreeSet<&str>> = leftover
        .iter()
        .map(|id| (*id, reachable(*id, &edges, &leftover)))
        .collect();

    let mut cycles = Vec::new();
    let mut grouped: BTreeSet<&str> = BTreeSet::new();
    for id in &leftover {
        if grouped.contains(id) || !reach[id].contains(id) {
            continue;
        }
        let members: Vec<String> = reach[id]
            .iter()
            .filter(|other| reach[*other].contains(id))
            .map(|m| m.to_string())
            .collect();
        grouped.extend(reach[id].iter().filter(|other| reach[*other].contains(id)));
        cycles.push(members);
    }

    order.extend(
        leftover
            .iter()
            .filter(|id| !grouped.contains(*id))
            .map(|id| id.to_string()),
    );

    Resolution { order, cycles }
}

/// Nodes reachable from `start` in one or more steps, within `within`.
fn reachable<'a>(
    start: &'a str,
    edges: &BTreeMap<&'a str, BTreeSet<&'a str>>,
    within: &BTreeSet<&'a str>,
) -> BTreeSet<&'a str> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<&str> = edges[start].iter().copied().collect();
    while let Some(node) = stack.pop() {
        if within.contains(node) && seen.insert(node) {
            stack.extend(edges[node].iter().copied());
        }
    }
    seen
}
