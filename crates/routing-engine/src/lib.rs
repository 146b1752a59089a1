//! Routing engine.
//!
//! Acquires and caches a road network region covering an origin/destination
//! pair, snaps both points to graph nodes, runs a shortest-path search and
//! turns the resulting node path into geometry, per-edge steps and totals.
//! [`RoutingEngine`] is the single entry point for callers.

pub mod dijkstra;
pub mod engine;
pub mod provider;
pub mod route;
pub mod source;

pub use dijkstra::shortest_path;
pub use engine::{EngineSettings, RoutingEngine};
pub use provider::{coverage_radius_m, GraphProvider, Region};
pub use route::{RouteBuilder, RouteResult, Step};
pub use source::{FixtureSource, MapDataSource, OverpassSource, PbfSource};
