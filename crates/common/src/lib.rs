//! Common library for the routing service.
//!
//! This crate provides the vocabulary shared by the routing engine and the HTTP
//! layer: configuration management, error handling, telemetry utilities,
//! geodesy helpers and the road network graph model.

// Configuration management
pub mod config;
pub use config::{Config, MapSourceKind};

// Error handling types
pub mod error;
pub use error::{Result, RoutingError};

// Telemetry and observability
pub mod telemetry;

// Coordinates, bounding boxes and great-circle distance
pub mod geodesy;
pub use geodesy::{BoundingBox, Coordinate};

// Road network graph
pub mod map;
pub use map::{Edge, Node, NodeId, RawEdge, RegionData, RoadGraph};

pub use telemetry::init_tracing;
