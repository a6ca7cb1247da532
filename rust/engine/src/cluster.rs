// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rectangle clustering.
//!
//! Footprints on one wall that lie within the cluster gap of each other
//! belong to one physical penetration (a tray with conduits beside it) and
//! get a single opening. Merging is transitive: footprints are grouped as
//! connected components of the gap-overlap graph, then the grown cluster
//! rectangles are merged again until no two clusters are within the gap.

use std::collections::{BTreeMap, VecDeque};

use opening_lite_geometry::RectUv;
use rustc_hash::FxHashMap;

use crate::cancel::CancelToken;
use crate::document::WallKey;
use crate::error::Result;
use crate::projector::{PenetrationRequest, RunIds};

/// A group of footprints on one wall that share one opening.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub rect: RectUv,
    /// Runs contributing to this cluster, sorted and unique.
    pub runs: RunIds,
}

impl Cluster {
    fn absorb(&mut self, other: &Cluster) {
        self.rect = self.rect.union(&other.rect);
        self.runs.extend(other.runs.iter().copied());
        self.runs.sort_unstable();
        self.runs.dedup();
    }
}

fn find(parent: &mut [usize], i: usize) -> usize {
    if parent[i] != i {
        parent[i] = find(parent, parent[i]);
    }
    parent[i]
}

fn union(parent: &mut [usize], rank: &mut [usize], i: usize, j: usize) {
    let pi = find(parent, i);
    let pj = find(parent, j);
    if pi == pj {
        return;
    }
    if rank[pi] < rank[pj] {
        parent[pi] = pj;
    } else if rank[pi] > rank[pj] {
        parent[pj] = pi;
    } else {
        parent[pj] = pi;
        rank[pi] += 1;
    }
}

/// Clusters the footprints of one wall.
///
/// Clusters are returned in the order of their first footprint. The result
/// is a fixed point: no two returned clusters are within `gap` of each
/// other.
pub fn cluster_requests(requests: &[PenetrationRequest], gap: f64) -> Vec<Cluster> {
    let n = requests.len();
    let mut parent: Vec<usize> = (0..n).collect();
    let mut rank: Vec<usize> = vec![0; n];

    for i in 0..n {
        for j in (i + 1)..n {
            if requests[i].rect.intersects_with_gap(&requests[j].rect, gap) {
                union(&mut parent, &mut rank, i, j);
            }
        }
    }

    let mut slot_of_root: FxHashMap<usize, usize> = FxHashMap::default();
    let mut clusters: Vec<Cluster> = Vec::new();
    for (i, request) in requests.iter().enumerate() {
        let root = find(&mut parent, i);
        let piece = Cluster {
            rect: request.rect,
            runs: request.runs.clone(),
        };
        match slot_of_root.get(&root) {
            Some(&slot) => clusters[slot].absorb(&piece),
            None => {
                slot_of_root.insert(root, clusters.len());
                clusters.push(piece);
            }
        }
    }

    merge_to_fixed_point(clusters, gap)
}

/// Re-scans the cluster list pairwise, merging until nothing changes.
///
/// A union rectangle can reach footprints none of its members reached, so
/// one component pass is not always a fixed point.
fn merge_to_fixed_point(mut clusters: Vec<Cluster>, gap: f64) -> Vec<Cluster> {
    let mut changed = true;
    while changed {
        changed = false;
        let mut out: Vec<Cluster> = Vec::with_capacity(clusters.len());
        let mut rest = VecDeque::from(clusters);

        while let Some(mut current) = rest.pop_front() {
            let mut i = 0;
            while i < rest.len() {
                if current.rect.intersects_with_gap(&rest[i].rect, gap) {
                    if let Some(other) = rest.remove(i) {
                        current.absorb(&other);
                    }
                    changed = true;
                } else {
                    i += 1;
                }
            }
            out.push(current);
        }
        clusters = out;
    }
    clusters
}

/// Clusters every wall's footprints.
///
/// Cancellation is checked before each wall.
pub fn cluster_all(
    by_wall: &BTreeMap<WallKey, Vec<PenetrationRequest>>,
    gap: f64,
    cancel: &CancelToken,
) -> Result<BTreeMap<WallKey, Vec<Cluster>>> {
    let mut out = BTreeMap::new();
    for (key, requests) in by_wall {
        cancel.check()?;
        let clusters = cluster_requests(requests, gap);
        tracing::trace!(
            wall = %key,
            requests = requests.len(),
            clusters = clusters.len(),
            "Wall clustered"
        );
        out.insert(*key, clusters);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ElementId, SourceId};
    use approx::assert_relative_eq;
    use smallvec::smallvec;

    fn key() -> WallKey {
        WallKey::new(SourceId(1), ElementId(100))
    }

    fn req(id: i64, u: f64, v: f64, w: f64, h: f64) -> PenetrationRequest {
        PenetrationRequest {
            wall: key(),
            rect: RectUv::from_center(u, v, w, h),
            runs: smallvec![ElementId(id)],
        }
    }

    fn assert_fixed_point(clusters: &[Cluster], gap: f64) {
        for (i, a) in clusters.iter().enumerate() {
            for b in &clusters[i + 1..] {
                assert!(
                    !a.rect.intersects_with_gap(&b.rect, gap),
                    "{a:?} and {b:?} still mergeable"
                );
            }
        }
    }

    #[test]
    fn two_conduits_within_gap_merge() {
        let requests = [req(1, 0.0, 0.0, 0.2, 0.2), req(2, 0.25, 0.0, 0.2, 0.2)];
        let clusters = cluster_requests(&requests, 0.1);
        assert_eq!(clusters.len(), 1);
        assert_relative_eq!(clusters[0].rect.umin, -0.1, epsilon = 1e-12);
        assert_relative_eq!(clusters[0].rect.umax, 0.35, epsilon = 1e-12);
        assert_eq!(clusters[0].runs.as_slice(), &[ElementId(1), ElementId(2)]);
    }

    #[test]
    fn far_footprints_stay_apart() {
        let requests = [req(1, 0.0, 0.0, 0.2, 0.2), req(2, 2.0, 0.0, 0.2, 0.2)];
        let clusters = cluster_requests(&requests, 0.3);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].runs.as_slice(), &[ElementId(1)]);
        assert_eq!(clusters[1].runs.as_slice(), &[ElementId(2)]);
    }

    #[test]
    fn chain_merges_transitively() {
        // A-B and B-C are within the gap, A-C are not
        let a = req(1, 0.0, 0.0, 0.2, 0.2);
        let b = req(2, 0.35, 0.0, 0.2, 0.2);
        let c = req(3, 0.7, 0.0, 0.2, 0.2);
        let gap = 0.2;
        assert!(a.rect.intersects_with_gap(&b.rect, gap));
        assert!(b.rect.intersects_with_gap(&c.rect, gap));
        assert!(!a.rect.intersects_with_gap(&c.rect, gap));

        // Order must not matter: A and C first, then the bridge
        let clusters = cluster_requests(&[a, c, b], gap);
        assert_eq!(clusters.len(), 1);
        assert_eq!(
            clusters[0].runs.as_slice(),
            &[ElementId(1), ElementId(2), ElementId(3)]
        );
        assert_relative_eq!(clusters[0].rect.umin, -0.1, epsilon = 1e-12);
        assert_relative_eq!(clusters[0].rect.umax, 0.8, epsilon = 1e-12);
    }

    #[test]
    fn grown_union_reaches_new_neighbour() {
        // A and B overlap; C overlaps only their union, neither on its own
        let a = req(1, 0.5, 0.1, 1.0, 0.2);
        let b = req(2, 0.9, 0.55, 0.2, 0.9);
        let c = req(3, 0.2, 0.7, 0.2, 0.2);
        assert!(a.rect.intersects_with_gap(&b.rect, 0.0));
        assert!(!a.rect.intersects_with_gap(&c.rect, 0.0));
        assert!(!b.rect.intersects_with_gap(&c.rect, 0.0));

        let clusters = cluster_requests(&[a, b, c], 0.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].runs.len(), 3);
    }

    #[test]
    fn result_is_fixed_point() {
        let reqs: Vec<_> = (0..12)
            .map(|i| {
                let f = i as f64;
                req(i, (f * 0.37) % 2.0, (f * 0.53) % 1.5, 0.15, 0.1)
            })
            .collect();
        for gap in [0.0, 0.05, 0.2, 0.5] {
            let clusters = cluster_requests(&reqs, gap);
            assert_fixed_point(&clusters, gap);
            let total: usize = clusters.iter().map(|c| c.runs.len()).sum();
            assert_eq!(total, 12);
        }
    }

    #[test]
    fn empty_input_gives_no_clusters() {
        assert!(cluster_requests(&[], 0.3).is_empty());
    }

    #[test]
    fn cluster_all_respects_cancellation() {
        let mut by_wall = BTreeMap::new();
        by_wall.insert(key(), vec![req(1, 0.0, 0.0, 0.2, 0.2)]);
        let cancel = CancelToken::new();
        assert_eq!(cluster_all(&by_wall, 0.3, &cancel).unwrap()[&key()].len(), 1);
        cancel.cancel();
        assert!(cluster_all(&by_wall, 0.3, &cancel).is_err());
    }
}
