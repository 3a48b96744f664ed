//! Shortest paths over the waypoint heap.
//!
//! Both searches are plain Dijkstra with a binary heap. Ties are broken on
//! the lower heap index so a given graph always yields the same path.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::graph::{WaypointHeap, WaypointLink};

/// One step of a [`Path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathNode {
    pub waypoint: usize,
    /// Distance travelled from the first node, in map units.
    pub distance: u32,
}

/// Owned result of a search; the first node is the start waypoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub nodes: Vec<PathNode>,
    pub total_distance: u32,
}

impl Path {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Heap index of the `i`-th node.
    pub fn waypoint(&self, i: usize) -> Option<usize> {
        self.nodes.get(i).map(|n| n.waypoint)
    }

    pub fn last_waypoint(&self) -> Option<usize> {
        self.nodes.last().map(|n| n.waypoint)
    }
}

struct Search<'a> {
    heap: &'a WaypointHeap,
    use_shortcuts: bool,
    hunt_backwards: bool,
    dist: Vec<u32>,
    parent: Vec<Option<usize>>,
    closed: Vec<bool>,
    open: BinaryHeap<Reverse<(u32, usize)>>,
}

impl<'a> Search<'a> {
    fn new(heap: &'a WaypointHeap, start: usize, use_shortcuts: bool, hunt_backwards: bool) -> Self {
        let len = heap.len();
        let mut search = Self {
            heap,
            use_shortcuts,
            hunt_backwards,
            dist: vec![u32::MAX; len],
            parent: vec![None; len],
            closed: vec![false; len],
            open: BinaryHeap::new(),
        };
        search.dist[start] = 0;
        search.open.push(Reverse((0, start)));
        search
    }

    fn links(&self, index: usize) -> &'a [WaypointLink] {
        match self.heap.get(index) {
            Some(w) if self.hunt_backwards => &w.prev,
            Some(w) => &w.next,
            None => &[],
        }
    }

    /// Settle the next closest node and relax its links. `goal` is always
    /// enterable, even when it is a shortcut.
    fn settle_next(&mut self, goal: Option<usize>) -> Option<usize> {
        while let Some(Reverse((d, current))) = self.open.pop() {
            if self.closed[current] || d > self.dist[current] {
                continue;
            }
            self.closed[current] = true;

            for link in self.links(current) {
                let Some(neighbour) = self.heap.get(link.to) else {
                    continue;
                };
                if neighbour.shortcut && !self.use_shortcuts && Some(link.to) != goal {
                    continue;
                }
                let candidate = d.saturating_add(link.distance);
                if candidate < self.dist[link.to] {
                    self.dist[link.to] = candidate;
                    self.parent[link.to] = Some(current);
                    self.open.push(Reverse((candidate, link.to)));
                }
            }
            return Some(current);
        }
        None
    }

    fn path_to(&self, end: usize) -> Path {
        let mut nodes = Vec::new();
        let mut at = Some(end);
        while let Some(index) = at {
            nodes.push(PathNode {
                waypoint: index,
                distance: self.dist[index],
            });
            at = self.parent[index];
        }
        nodes.reverse();
        Path {
            nodes,
            total_distance: self.dist[end],
        }
    }
}

impl WaypointHeap {
    /// Shortest path from `from` to `to`. `None` when either index is out of
    /// range or `to` cannot be reached.
    pub fn pathfind(
        &self,
        from: usize,
        to: usize,
        use_shortcuts: bool,
        hunt_backwards: bool,
    ) -> Option<Path> {
        if from >= self.len() || to >= self.len() {
            return None;
        }

        let mut search = Search::new(self, from, use_shortcuts, hunt_backwards);
        while let Some(settled) = search.settle_next(Some(to)) {
            if settled == to {
                return Some(search.path_to(to));
            }
        }
        None
    }

    /// Walk the circuit from `start` until `max_distance` is covered. Returns
    /// the path to the first node at or past that distance, or to the
    /// farthest reachable node when the circuit is shorter. `None` when
    /// nothing beyond `start` is reachable.
    pub fn pathfind_through_circuit(
        &self,
        start: usize,
        max_distance: u32,
        use_shortcuts: bool,
        hunt_backwards: bool,
    ) -> Option<Path> {
        if start >= self.len() {
            return None;
        }

        let mut search = Search::new(self, start, use_shortcuts, hunt_backwards);
        let mut farthest = start;
        while let Some(settled) = search.settle_next(None) {
            if settled == start {
                continue;
            }
            if search.dist[settled] >= max_distance {
                return Some(search.path_to(settled));
            }
            if search.dist[settled] > search.dist[farthest] {
                farthest = settled;
            }
        }

        (farthest != start).then(|| search.path_to(farthest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::WaypointHeapBuilder;
    use engine_core::FixedVec3;
    use rand::prelude::*;

    /// Eight waypoints on a 1000-unit grid, looping 0 -> 7 -> 0.
    fn loop_track() -> WaypointHeap {
        let points: Vec<FixedVec3> = (0..8).map(|i| FixedVec3::from_ints(i * 1000, 0, 0)).collect();
        let mut b = WaypointHeapBuilder::new();
        for p in &points {
            b.add(*p);
        }
        for i in 0..7 {
            b.connect(i, i + 1);
        }
        b.connect(7, 0);
        b.finish_line(0);
        b.build().unwrap()
    }

    #[test]
    fn path_to_self_is_a_single_node() {
        let heap = loop_track();
        let path = heap.pathfind(3, 3, false, false).unwrap();
        assert_eq!(path.nodes, vec![PathNode { waypoint: 3, distance: 0 }]);
        assert_eq!(path.total_distance, 0);
    }

    #[test]
    fn forward_path_follows_links() {
        let heap = loop_track();
        let path = heap.pathfind(2, 5, false, false).unwrap();
        let order: Vec<usize> = path.nodes.iter().map(|n| n.waypoint).collect();
        assert_eq!(order, vec![2, 3, 4, 5]);
        assert_eq!(path.total_distance, 3000);
        assert_eq!(path.nodes[1].distance, 1000);
    }

    #[test]
    fn backwards_path_uses_prev_links() {
        let heap = loop_track();
        let path = heap.pathfind(2, 5, false, true).unwrap();
        let order: Vec<usize> = path.nodes.iter().map(|n| n.waypoint).collect();
        assert_eq!(order, vec![2, 1, 0, 7, 6, 5]);
        assert_eq!(path.last_waypoint(), Some(5));
    }

    #[test]
    fn out_of_range_indices_fail() {
        let heap = loop_track();
        assert!(heap.pathfind(0, 99, false, false).is_none());
        assert!(heap.pathfind_through_circuit(99, 10, false, true).is_none());
    }

    #[test]
    fn shortcuts_are_skipped_unless_allowed() {
        // 0 -> 1 -> 2 -> 3 the long way, 0 -> s -> 3 through a shortcut.
        let mut b = WaypointHeapBuilder::new();
        let w0 = b.add(FixedVec3::from_ints(0, 0, 0));
        let w1 = b.add(FixedVec3::from_ints(0, 1000, 0));
        let w2 = b.add(FixedVec3::from_ints(1000, 1000, 0));
        let w3 = b.add(FixedVec3::from_ints(1000, 0, 0));
        let s = b.add_shortcut(FixedVec3::from_ints(500, 0, 0));
        b.connect(w0, w1).connect(w1, w2).connect(w2, w3);
        b.connect(w0, s).connect(s, w3);
        let heap = b.build().unwrap();

        let long = heap.pathfind(w0, w3, false, false).unwrap();
        assert_eq!(long.len(), 4);
        let short = heap.pathfind(w0, w3, true, false).unwrap();
        assert_eq!(short.waypoint(1), Some(s));
        assert!(short.total_distance < long.total_distance);
    }

    #[test]
    fn unreachable_target_fails() {
        let mut b = WaypointHeapBuilder::new();
        b.add(FixedVec3::ZERO);
        b.add(FixedVec3::from_ints(10, 0, 0));
        b.connect(0, 1);
        let heap = b.build().unwrap();
        assert!(heap.pathfind(1, 0, false, false).is_none());
        assert!(heap.pathfind(1, 0, false, true).is_some());
    }

    #[test]
    fn circuit_walk_backwards_reaches_the_node_after_the_finish() {
        let heap = loop_track();
        let path = heap
            .pathfind_through_circuit(0, i32::MAX as u32, false, true)
            .unwrap();
        assert_eq!(path.last_waypoint(), Some(1));
        assert_eq!(path.total_distance, 7000);
    }

    #[test]
    fn circuit_walk_stops_at_the_cap() {
        let heap = loop_track();
        let path = heap.pathfind_through_circuit(0, 2500, false, false).unwrap();
        assert_eq!(path.last_waypoint(), Some(3));
        assert_eq!(path.total_distance, 3000);
    }

    #[test]
    fn lone_waypoint_has_no_circuit() {
        let mut b = WaypointHeapBuilder::new();
        b.add(FixedVec3::ZERO);
        let heap = b.build().unwrap();
        assert!(heap.pathfind_through_circuit(0, 100, false, true).is_none());
    }

    #[test]
    fn random_graphs_give_consistent_paths() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        for _ in 0..50 {
            let n = rng.gen_range(2..12);
            let mut b = WaypointHeapBuilder::new();
            for _ in 0..n {
                b.add(FixedVec3::from_ints(
                    rng.gen_range(-4000..4000),
                    rng.gen_range(-4000..4000),
                    rng.gen_range(0..200),
                ));
            }
            for i in 0..n {
                b.connect(i, (i + 1) % n);
                if rng.gen_bool(0.3) {
                    b.connect(i, rng.gen_range(0..n));
                }
            }
            let heap = b.build().unwrap();
            let from = rng.gen_range(0..n);
            let to = rng.gen_range(0..n);
            let path = heap.pathfind(from, to, false, false).unwrap();

            assert_eq!(path.waypoint(0), Some(from));
            assert_eq!(path.last_waypoint(), Some(to));
            let mut running = 0;
            for pair in path.nodes.windows(2) {
                let w = heap.get(pair[0].waypoint).unwrap();
                let link = w.next.iter().filter(|l| l.to == pair[1].waypoint).map(|l| l.distance).min().unwrap();
                running += link;
                assert_eq!(pair[1].distance, running);
            }
            assert_eq!(path.total_distance, running);
            assert_eq!(heap.pathfind(from, to, false, false).unwrap(), path);
        }
    }
}
