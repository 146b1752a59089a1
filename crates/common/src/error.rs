use thiserror::Error;

use crate::map::NodeId;

// Custom Result type alias for convenient use across the project
pub type Result<T> = std::result::Result<T, RoutingError>;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("Graph not initialised: coverage must be ensured before node lookups")]
    GraphNotReady,

    #[error("Node {0} does not exist in the current graph")]
    UnknownNode(NodeId),

    #[error("No path found from node {from} to node {to}")]
    NoPathFound { from: NodeId, to: NodeId },

    #[error("Map data source returned a region without nodes")]
    EmptyRegion,

    #[error("Map data error: {0}")]
    MapData(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RoutingError {
    /// A missing path is a legitimate answer; everything else is a fault.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RoutingError::NoPathFound { .. })
    }

    /// True when the failure came from acquiring map data rather than from routing.
    pub fn is_map_data_failure(&self) -> bool {
        matches!(
            self,
            RoutingError::EmptyRegion
                | RoutingError::MapData(_)
                | RoutingError::Http(_)
                | RoutingError::Io(_)
        )
    }
}
