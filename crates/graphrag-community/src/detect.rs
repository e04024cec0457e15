//! Community detection: fetch the entity graph, compute connected
//! components in memory, write assignments back.
//!
//! Components are ordered by size descending and assigned integer ids
//! starting at 0, so community 0 is always the largest.

use std::collections::HashMap;

use graphrag_graph::queries::EntityAdjacency;
use graphrag_graph::GraphClient;

use crate::error::{CommunityError, Result};
use crate::types::CommunityStats;
use crate::unionfind::UnionFind;

/// Run detection against the graph and persist the assignments.
pub async fn detect_communities(graph: &GraphClient) -> Result<CommunityStats> {
    let adjacency = graph.fetch_entity_adjacency().await?;
    if adjacency.is_empty() {
        return Err(CommunityError::EmptyGraph);
    }

    let components = compute_components(&adjacency);

    let mut assignments = Vec::new();
    for (id, members) in components.iter().enumerate() {
        for name in members {
            assignments.push((name.clone(), id as i64));
        }
    }
    graph.assign_communities(&assignments).await?;

    let stats = compute_stats(&adjacency, &components);
    tracing::info!(
        communities = stats.community_count,
        nodes = stats.node_count,
        relationships = stats.relationship_count,
        largest = stats.largest_community_size,
        "Community detection complete"
    );

    Ok(stats)
}

/// Connected components over the undirected entity adjacency.
///
/// Members within a component are sorted by name; components are sorted by
/// size descending, then by first member, so assignment is deterministic.
pub fn compute_components(adjacency: &[EntityAdjacency]) -> Vec<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for adj in adjacency {
        intern(&mut names, &mut index, &adj.name);
        for neighbor in &adj.neighbors {
            intern(&mut names, &mut index, neighbor);
        }
    }

    let mut uf = UnionFind::new(names.len());
    for adj in adjacency {
        let a = index[&adj.name];
        for neighbor in &adj.neighbors {
            uf.union(a, index[neighbor]);
        }
    }

    let mut groups: HashMap<usize, Vec<String>> = HashMap::new();
    for (i, name) in names.iter().enumerate() {
        groups.entry(uf.find(i)).or_default().push(name.clone());
    }

    let mut components: Vec<Vec<String>> = groups.into_values().collect();
    for component in &mut components {
        component.sort();
    }
    components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
    components
}

/// Statistics over the detected components.
pub fn compute_stats(
    adjacency: &[EntityAdjacency],
    components: &[Vec<String>],
) -> CommunityStats {
    let sizes: Vec<usize> = components.iter().map(|c| c.len()).collect();

    let mut distribution = std::collections::BTreeMap::new();
    for &size in &sizes {
        *distribution.entry(size).or_insert(0) += 1;
    }

    // Each undirected relationship appears once from each endpoint.
    let relationship_count = adjacency.iter().map(|a| a.neighbors.len()).sum::<usize>() / 2;

    CommunityStats {
        community_count: components.len(),
        community_distribution: distribution,
        node_count: sizes.iter().sum(),
        relationship_count,
        largest_community_size: sizes.iter().copied().max().unwrap_or(0),
        smallest_community_size: sizes.iter().copied().min().unwrap_or(0),
    }
}

fn intern(names: &mut Vec<String>, index: &mut HashMap<String, usize>, name: &str) -> usize {
    if let Some(&i) = index.get(name) {
        return i;
    }
    let i = names.len();
    names.push(name.to_string());
    index.insert(name.to_string(), i);
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adj(name: &str, neighbors: &[&str]) -> EntityAdjacency {
        EntityAdjacency {
            name: name.to_string(),
            neighbors: neighbors.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn two_components_split_correctly() {
        let adjacency = vec![
            adj("A", &["B"]),
            adj("B", &["A", "C"]),
            adj("C", &["B"]),
            adj("X", &["Y"]),
            adj("Y", &["X"]),
        ];

        let components = compute_components(&adjacency);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0], vec!["A", "B", "C"]);
        assert_eq!(components[1], vec!["X", "Y"]);
    }

    #[test]
    fn largest_component_gets_id_zero() {
        let adjacency = vec![
            adj("LONER", &[]),
            adj("P", &["Q", "R", "S"]),
            adj("Q", &["P"]),
            adj("R", &["P"]),
            adj("S", &["P"]),
        ];

        let components = compute_components(&adjacency);
        assert_eq!(components[0].len(), 4);
        assert_eq!(components[1], vec!["LONER"]);
    }

    #[test]
    fn singleton_entities_form_own_communities() {
        let adjacency = vec![adj("A", &[]), adj("B", &[]), adj("C", &[])];
        let components = compute_components(&adjacency);
        assert_eq!(components.len(), 3);
        assert!(components.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn neighbor_only_entities_are_counted() {
        // "B" never appears as a row, only as a neighbor.
        let adjacency = vec![adj("A", &["B"])];
        let components = compute_components(&adjacency);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0], vec!["A", "B"]);
    }

    #[test]
    fn stats_reflect_components() {
        let adjacency = vec![
            adj("A", &["B"]),
            adj("B", &["A"]),
            adj("X", &[]),
        ];
        let components = compute_components(&adjacency);
        let stats = compute_stats(&adjacency, &components);

        assert_eq!(stats.community_count, 2);
        assert_eq!(stats.node_count, 3);
        assert_eq!(stats.relationship_count, 1);
        assert_eq!(stats.largest_community_size, 2);
        assert_eq!(stats.smallest_community_size, 1);
        assert_eq!(stats.community_distribution.get(&1), Some(&1));
        assert_eq!(stats.community_distribution.get(&2), Some(&1));
    }

    #[test]
    fn deterministic_ordering_for_equal_sizes() {
        let adjacency = vec![
            adj("M", &["N"]),
            adj("N", &["M"]),
            adj("A", &["B"]),
            adj("B", &["A"]),
        ];

        let components = compute_components(&adjacency);
        assert_eq!(components[0], vec!["A", "B"]);
        assert_eq!(components[1], vec!["M", "N"]);
    }
}
