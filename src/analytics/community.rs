//! Community detection — greedy modularity maximization
//!
//! Agglomerative Clauset–Newman–Moore: start with every node in its own
//! community and repeatedly merge the connected pair with the best
//! modularity gain until no merge improves modularity. Group indices are
//! 1-based and ordered by community size (largest first); they are not
//! guaranteed stable across calls once the underlying graph changes.
//!
//! Degenerate inputs (no edges) fall back to a single group for all nodes —
//! the caller always receives a usable partition.

use std::collections::HashMap;

/// Assign each node a 1-based community group
pub fn detect_communities(adjacency: &[Vec<usize>]) -> Vec<usize> {
    let n = adjacency.len();
    if n == 0 {
        return Vec::new();
    }
    let degree_total: usize = adjacency.iter().map(|nb| nb.len()).sum();
    if degree_total == 0 {
        // No edges: nothing to maximize, single group
        return vec![1; n];
    }
    let two_m = degree_total as f64;

    // Full-matrix convention: e_ij = edges(i,j) / 2m for i != j, stored once
    // per unordered pair; a_i = degree sum of community i / 2m.
    // Merge gain: dQ = 2 * (e_ij - a_i * a_j).
    let mut between: HashMap<(usize, usize), f64> = HashMap::new();
    for (i, neighbors) in adjacency.iter().enumerate() {
        for &j in neighbors {
            if i < j {
                *between.entry((i, j)).or_insert(0.0) += 1.0 / two_m;
            }
        }
    }
    let mut weight: Vec<f64> = adjacency.iter().map(|nb| nb.len() as f64 / two_m).collect();
    let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();

    loop {
        // Best connected pair by modularity gain; ties break toward the
        // smallest pair so the partition is deterministic for a given input
        let mut best: Option<((usize, usize), f64)> = None;
        for (&pair, &e) in &between {
            let gain = 2.0 * (e - weight[pair.0] * weight[pair.1]);
            let better = match best {
                None => true,
                Some((best_pair, best_gain)) => {
                    gain > best_gain + f64::EPSILON
                        || ((gain - best_gain).abs() <= f64::EPSILON && pair < best_pair)
                }
            };
            if better {
                best = Some((pair, gain));
            }
        }

        let Some(((keep, gone), gain)) = best else {
            break;
        };
        if gain <= 0.0 {
            break;
        }

        // Merge community `gone` into `keep`
        let moved = std::mem::take(&mut members[gone]);
        members[keep].extend(moved);
        weight[keep] += weight[gone];
        weight[gone] = 0.0;

        let mut updates: Vec<(usize, f64)> = Vec::new();
        between.retain(|&(i, j), e| {
            if (i, j) == (keep, gone) {
                return false;
            }
            let other = if i == gone {
                Some(j)
            } else if j == gone {
                Some(i)
            } else {
                None
            };
            match other {
                Some(other) => {
                    if other != keep {
                        updates.push((other, *e));
                    }
                    false
                }
                None => true,
            }
        });
        for (other, e) in updates {
            let pair = if other < keep { (other, keep) } else { (keep, other) };
            *between.entry(pair).or_insert(0.0) += e;
        }
    }

    // Order surviving communities by size, largest first
    let mut survivors: Vec<&Vec<usize>> = members.iter().filter(|m| !m.is_empty()).collect();
    survivors.sort_by_key(|m| (std::cmp::Reverse(m.len()), m[0]));

    let mut groups = vec![1usize; n];
    for (index, community) in survivors.iter().enumerate() {
        for &node in community.iter() {
            groups[node] = index + 1;
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two triangles joined by a single bridge edge
    fn two_triangles() -> Vec<Vec<usize>> {
        vec![
            vec![1, 2],
            vec![0, 2],
            vec![0, 1, 3],
            vec![2, 4, 5],
            vec![3, 5],
            vec![3, 4],
        ]
    }

    #[test]
    fn two_triangles_split_into_two_groups() {
        let groups = detect_communities(&two_triangles());
        assert_eq!(groups.len(), 6);
        // each triangle lands in one group
        assert_eq!(groups[0], groups[1]);
        assert_eq!(groups[1], groups[2]);
        assert_eq!(groups[3], groups[4]);
        assert_eq!(groups[4], groups[5]);
        assert_ne!(groups[0], groups[3]);
        // 1-based indices
        assert!(groups.iter().all(|&g| g >= 1 && g <= 2));
    }

    #[test]
    fn edgeless_graph_falls_back_to_single_group() {
        let groups = detect_communities(&[vec![], vec![], vec![]]);
        assert_eq!(groups, vec![1, 1, 1]);
    }

    #[test]
    fn empty_graph_yields_no_groups() {
        assert!(detect_communities(&[]).is_empty());
    }

    #[test]
    fn connected_pair_merges_into_one_group() {
        let groups = detect_communities(&[vec![1], vec![0]]);
        assert_eq!(groups, vec![1, 1]);
    }

    #[test]
    fn partition_is_deterministic_for_identical_input() {
        let a = detect_communities(&two_triangles());
        let b = detect_communities(&two_triangles());
        assert_eq!(a, b);
    }
}
