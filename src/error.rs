use crate::types::{LinkId, NodeId, PortId};
use thiserror::Error;

/// Errors returned by structural graph mutations.
///
/// Interaction handlers never surface these to the host; they log and
/// degrade to a no-op instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("port {0} already exists")]
    DuplicatePort(PortId),
    #[error("link {0} already exists")]
    DuplicateLink(LinkId),
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("port {0} not found")]
    PortNotFound(PortId),
    #[error("link {0} not found")]
    LinkNotFound(LinkId),
}

/// Errors raised while loading an [`EditorConfig`](crate::config::EditorConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
