//! Importance scoring — PageRank with a degree-centrality fallback
//!
//! Scores are computed over the undirected simple graph induced by the
//! input. PageRank non-convergence is not an error the caller sees: the
//! fallback keeps visualization alive with plain degree centrality.

/// PageRank failed to converge within the iteration budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonConvergence;

/// Power-iteration PageRank over an undirected adjacency list.
///
/// Dangling (degree-0) nodes redistribute their rank uniformly. Converges
/// when the L1 delta between iterations drops below `tolerance`.
pub fn pagerank(
    adjacency: &[Vec<usize>],
    damping: f64,
    max_iterations: usize,
    tolerance: f64,
) -> Result<Vec<f64>, NonConvergence> {
    let n = adjacency.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    let n_f = n as f64;
    let mut rank = vec![1.0 / n_f; n];

    for _ in 0..max_iterations {
        let dangling: f64 = adjacency
            .iter()
            .zip(&rank)
            .filter(|(neighbors, _)| neighbors.is_empty())
            .map(|(_, r)| *r)
            .sum();

        let uniform = (1.0 - damping) / n_f + damping * dangling / n_f;
        let mut next = vec![uniform; n];
        for (i, neighbors) in adjacency.iter().enumerate() {
            if neighbors.is_empty() {
                continue;
            }
            let share = damping * rank[i] / neighbors.len() as f64;
            for &j in neighbors {
                next[j] += share;
            }
        }

        let delta: f64 = rank.iter().zip(&next).map(|(a, b)| (a - b).abs()).sum();
        rank = next;
        if delta < tolerance {
            return Ok(rank);
        }
    }

    Err(NonConvergence)
}

/// Degree centrality: degree divided by the maximum possible degree.
/// Graphs with a single node score 1.0 by convention.
pub fn degree_centrality(adjacency: &[Vec<usize>]) -> Vec<f64> {
    let n = adjacency.len();
    if n <= 1 {
        return vec![1.0; n];
    }
    let scale = 1.0 / (n as f64 - 1.0);
    adjacency
        .iter()
        .map(|neighbors| neighbors.len() as f64 * scale)
        .collect()
}
