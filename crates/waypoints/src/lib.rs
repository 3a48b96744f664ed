//! Track navigation graph.
//!
//! A [`WaypointHeap`] is built once per level through
//! [`WaypointHeapBuilder`] and is read-only afterwards. Waypoints are
//! addressed by heap index; searches return owned [`Path`]s.

pub mod graph;
pub mod pathfind;

pub use graph::{GraphError, Waypoint, WaypointHeap, WaypointHeapBuilder, WaypointLink};
pub use pathfind::{Path, PathNode};
