//! Waypoint heap: the track's navigation graph.

use engine_core::{approx_distance_3d, Fixed, FixedVec3, FRACBITS};
use log::debug;
use thiserror::Error;

/// Directed edge to a neighbouring waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaypointLink {
    pub to: usize,
    /// Length in whole map units.
    pub distance: u32,
}

/// Node of the navigation graph.
#[derive(Debug, Clone)]
pub struct Waypoint {
    /// Position in the heap; stable for the graph's lifetime.
    pub index: usize,
    pub position: FixedVec3,
    /// Links in the direction of travel.
    pub next: Vec<WaypointLink>,
    /// Links against the direction of travel.
    pub prev: Vec<WaypointLink>,
    /// Only used by pathfinding when shortcuts are allowed.
    pub shortcut: bool,
    pub finish_line: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("waypoint graph is empty")]
    Empty,
    #[error("link {from} -> {to} points outside the heap of {len} waypoints")]
    DanglingLink { from: usize, to: usize, len: usize },
    #[error("waypoints {first} and {second} are both marked as the finish line")]
    DuplicateFinishLine { first: usize, second: usize },
    #[error("a circuit needs at least two waypoints, got {0}")]
    CircuitTooShort(usize),
}

/// Read-only waypoint graph.
#[derive(Debug, Clone)]
pub struct WaypointHeap {
    waypoints: Vec<Waypoint>,
    finish_line: Option<usize>,
}

impl WaypointHeap {
    /// Closed loop through `points` in order, with `finish` as the finish line.
    pub fn circuit(points: &[FixedVec3], finish: usize) -> Result<Self, GraphError> {
        if points.len() < 2 {
            return Err(GraphError::CircuitTooShort(points.len()));
        }
        let mut builder = WaypointHeapBuilder::new();
        for p in points {
            builder.add(*p);
        }
        for i in 0..points.len() {
            builder.connect(i, (i + 1) % points.len());
        }
        builder.finish_line(finish);
        builder.build()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn finish_waypoint(&self) -> Option<&Waypoint> {
        self.finish_line.and_then(|i| self.waypoints.get(i))
    }

    /// Waypoint by heap index. Negative or out-of-range indices resolve to nothing.
    pub fn waypoint_at(&self, index: i32) -> Option<&Waypoint> {
        usize::try_from(index).ok().and_then(|i| self.waypoints.get(i))
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    pub fn heap_index(&self, waypoint: &Waypoint) -> usize {
        waypoint.index
    }

    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }
}

/// Collects waypoints and links, then validates them into a [`WaypointHeap`].
#[derive(Debug, Default)]
pub struct WaypointHeapBuilder {
    positions: Vec<FixedVec3>,
    shortcuts: Vec<bool>,
    links: Vec<(usize, usize)>,
    finish_lines: Vec<usize>,
}

impl WaypointHeapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a waypoint, returning its heap index.
    pub fn add(&mut self, position: FixedVec3) -> usize {
        self.positions.push(position);
        self.shortcuts.push(false);
        self.positions.len() - 1
    }

    pub fn add_shortcut(&mut self, position: FixedVec3) -> usize {
        let index = self.add(position);
        self.shortcuts[index] = true;
        index
    }

    /// One-way link in the direction of travel.
    pub fn connect(&mut self, from: usize, to: usize) -> &mut Self {
        self.links.push((from, to));
        self
    }

    pub fn finish_line(&mut self, index: usize) -> &mut Self {
        self.finish_lines.push(index);
        self
    }

    pub fn build(&self) -> Result<WaypointHeap, GraphError> {
        let len = self.positions.len();
        if len == 0 {
            return Err(GraphError::Empty);
        }

        let mut waypoints: Vec<Waypoint> = self
            .positions
            .iter()
            .zip(&self.shortcuts)
            .enumerate()
            .map(|(index, (position, shortcut))| Waypoint {
                index,
                position: *position,
                next: Vec::new(),
                prev: Vec::new(),
                shortcut: *shortcut,
                finish_line: false,
            })
            .collect();

        for &(from, to) in &self.links {
            if from >= len || to >= len {
                return Err(GraphError::DanglingLink { from, to, len });
            }
            let distance = link_distance(self.positions[from], self.positions[to]);
            waypoints[from].next.push(WaypointLink { to, distance });
            waypoints[to].prev.push(WaypointLink { to: from, distance });
        }

        let finish_line = match self.finish_lines.as_slice() {
            [] => None,
            [only] => Some(*only),
            [first, second, ..] => {
                return Err(GraphError::DuplicateFinishLine {
                    first: *first,
                    second: *second,
                })
            }
        };
        if let Some(f) = finish_line {
            match waypoints.get_mut(f) {
                Some(w) => w.finish_line = true,
                None => return Err(GraphError::DanglingLink { from: f, to: f, len }),
            }
        }

        debug!(
            "built waypoint heap: {} waypoints, {} links, finish line {:?}",
            len,
            self.links.len(),
            finish_line
        );

        Ok(WaypointHeap {
            waypoints,
            finish_line,
        })
    }
}

/// Edge length in whole map units, measured the same way the track code
/// measures everything else.
fn link_distance(a: FixedVec3, b: FixedVec3) -> u32 {
    let unit = |v: Fixed| Fixed::from_int(v.0 >> FRACBITS);
    let d = approx_distance_3d(
        unit(b.x) - unit(a.x),
        unit(b.y) - unit(a.y),
        unit(b.z) - unit(a.z),
    );
    d.to_int().max(0) as u32
}
