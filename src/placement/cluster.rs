use std::collections::VecDeque;

use super::geometry::distance;
use super::types::Anchor;

/// Single-linkage grouping: two anchors share a cluster when a chain of
/// anchors, each within `link` of the next, connects them.
///
/// Returns clusters of input indices. Clusters are ordered by their lowest
/// index and members are sorted, so the split is deterministic.
pub fn spatial_clusters<P>(anchors: &[Anchor<P>], link: f32) -> Vec<Vec<usize>> {
    let mut assigned = vec![false; anchors.len()];
    let mut clusters = Vec::new();

    for seed in 0..anchors.len() {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;
        let mut members = vec![seed];
        let mut queue = VecDeque::from([seed]);
        while let Some(current) = queue.pop_front() {
            let origin = anchors[current].position();
            for (other, anchor) in anchors.iter().enumerate() {
                if assigned[other] || !(distance(origin, anchor.position()) <= link) {
                    continue;
                }
                assigned[other] = true;
                members.push(other);
                queue.push_back(other);
            }
        }
        members.sort_unstable();
        clusters.push(members);
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchors(points: &[(f32, f32)]) -> Vec<Anchor<()>> {
        points
            .iter()
            .map(|&(x, y)| Anchor::new(x, y, 12.0, ()))
            .collect()
    }

    #[test]
    fn chains_are_linked_transitively() {
        // 0-1 and 1-2 are within reach, 0-2 is not.
        let input = anchors(&[(0.0, 0.0), (100.0, 0.0), (200.0, 0.0), (1000.0, 0.0)]);
        let clusters = spatial_clusters(&input, 120.0);
        assert_eq!(clusters, vec![vec![0, 1, 2], vec![3]]);
    }

    #[test]
    fn every_anchor_lands_in_exactly_one_cluster() {
        let input = anchors(&[(0.0, 0.0), (500.0, 0.0), (10.0, 10.0), (510.0, 5.0), (900.0, 900.0)]);
        let clusters = spatial_clusters(&input, 120.0);
        let mut seen: Vec<usize> = clusters.iter().flatten().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        assert_eq!(clusters[0], vec![0, 2]);
        assert_eq!(clusters[1], vec![1, 3]);
    }

    #[test]
    fn empty_input_has_no_clusters() {
        let clusters = spatial_clusters::<()>(&[], 120.0);
        assert!(clusters.is_empty());
    }
}
