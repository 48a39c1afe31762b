//! Splicing a node into an existing link.
//!
//! Dropping node `N` onto link `A -> B` replaces it with `A -> N.in` and
//! `N.out -> B`. Every port involved is emptied before reconnecting, so none
//! of them ends up carrying a stale link next to a new one. A link that
//! already ends on `N` is never spliced.

use crate::config::{SpliceConfig, SplicePolicy};
use crate::graph::{DiagramGraph, Node};
use crate::types::{LinkId, NodeId, Point, PortId};

/// The node being dropped onto the link.
#[derive(Clone, Debug, PartialEq)]
pub enum DroppedNode {
    /// A node already in the graph, e.g. one being dragged on the canvas.
    Existing(NodeId),
    /// A node not yet in the graph, e.g. dragged in from a palette.
    Detached(Node),
}

impl DroppedNode {
    pub fn id(&self) -> NodeId {
        match self {
            DroppedNode::Existing(id) => *id,
            DroppedNode::Detached(node) => node.id,
        }
    }
}

/// Why a splice stopped early.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpliceAbort {
    /// The link is gone; nothing was changed.
    LinkNotFound(LinkId),
    /// The link lacks a source or target port; nothing was changed.
    LinkEndpointMissing(LinkId),
    /// The dropped node could not be placed in the graph.
    NodeNotFound(NodeId),
    /// One end of the link is a port of the dropped node; nothing was changed.
    LinkTouchesNode { link: LinkId, node: NodeId },
    /// The dropped node has no port with the configured name. The node has
    /// already been added and positioned; the link is untouched.
    SplicePortMissing { node: NodeId, port: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpliceOutcome {
    /// The original link was replaced. A side is `None` when the rules
    /// refused that connection.
    Completed {
        upstream: Option<LinkId>,
        downstream: Option<LinkId>,
    },
    Aborted(SpliceAbort),
}

impl SpliceOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SpliceOutcome::Completed { .. })
    }

    /// Whether both replacement links were created.
    pub fn is_fully_connected(&self) -> bool {
        matches!(
            self,
            SpliceOutcome::Completed { upstream: Some(_), downstream: Some(_) }
        )
    }
}

/// Replace `link` by two links running through the dropped node.
///
/// Not safe to retry blindly: a second run with the same link id aborts with
/// [`SpliceAbort::LinkNotFound`] since the link was consumed.
#[derive(Clone, Debug)]
pub struct SpliceCommand {
    dropped: DroppedNode,
    link: LinkId,
    drop_point: Point,
    config: SpliceConfig,
}

impl SpliceCommand {
    pub fn new(dropped: DroppedNode, link: LinkId, drop_point: Point) -> Self {
        Self { dropped, link, drop_point, config: SpliceConfig::default() }
    }

    pub fn with_policy(mut self, policy: SplicePolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Use another pair of port names on the dropped node.
    pub fn with_ports(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.config.input_port = input.into();
        self.config.output_port = output.into();
        self
    }

    pub fn with_config(mut self, config: SpliceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn execute(&self, graph: &mut DiagramGraph) -> SpliceOutcome {
        let outcome = self.run(graph);
        match &outcome {
            SpliceOutcome::Completed { upstream, downstream } => log::info!(
                "Spliced node {} into {} (upstream: {:?}, downstream: {:?})",
                self.dropped.id(),
                self.link,
                upstream,
                downstream
            ),
            SpliceOutcome::Aborted(reason) => {
                log::debug!("Splice of {} into {} aborted: {:?}", self.dropped.id(), self.link, reason)
            }
        }
        outcome
    }

    fn run(&self, graph: &mut DiagramGraph) -> SpliceOutcome {
        let Some(link) = graph.link(self.link).copied() else {
            return SpliceOutcome::Aborted(SpliceAbort::LinkNotFound(self.link));
        };
        let (Some(source), Some(target)) = (link.source, link.target) else {
            return SpliceOutcome::Aborted(SpliceAbort::LinkEndpointMissing(self.link));
        };
        if graph.port(source).is_none() || graph.port(target).is_none() {
            return SpliceOutcome::Aborted(SpliceAbort::LinkEndpointMissing(self.link));
        }

        let node_id = self.dropped.id();
        if graph.port_owner(source) == Some(node_id) || graph.port_owner(target) == Some(node_id) {
            return SpliceOutcome::Aborted(SpliceAbort::LinkTouchesNode { link: self.link, node: node_id });
        }
        if !graph.contains_node(node_id) {
            let DroppedNode::Detached(node) = &self.dropped else {
                return SpliceOutcome::Aborted(SpliceAbort::NodeNotFound(node_id));
            };
            if let Err(err) = graph.add_node(node.clone()) {
                log::warn!("Cannot add dropped node {}: {}", node_id, err);
                return SpliceOutcome::Aborted(SpliceAbort::NodeNotFound(node_id));
            }
        }
        if graph.set_position(node_id, self.drop_point).is_err() {
            return SpliceOutcome::Aborted(SpliceAbort::NodeNotFound(node_id));
        }

        let Some(input) = graph.port_by_name(node_id, &self.config.input_port) else {
            return self.port_missing(node_id, &self.config.input_port);
        };
        let Some(output) = graph.port_by_name(node_id, &self.config.output_port) else {
            return self.port_missing(node_id, &self.config.output_port);
        };

        graph.remove_link(self.link);
        for port in [source, input, target, output] {
            graph.clear_port_links(port);
        }

        let upstream = self.reconnect(graph, source, input);
        let downstream = self.reconnect(graph, output, target);
        SpliceOutcome::Completed { upstream, downstream }
    }

    fn port_missing(&self, node: NodeId, port: &str) -> SpliceOutcome {
        log::warn!("Node {} has no '{}' port to splice into", node, port);
        SpliceOutcome::Aborted(SpliceAbort::SplicePortMissing { node, port: port.to_string() })
    }

    fn reconnect(&self, graph: &mut DiagramGraph, from: PortId, to: PortId) -> Option<LinkId> {
        graph.clear_port_links(from);
        graph.clear_port_links(to);

        match self.config.policy {
            SplicePolicy::RespectRules => {
                let verdict = graph.validate_ports(from, to);
                if !verdict.is_valid() {
                    log::warn!("Splice leaves {} -> {} unconnected: {:?}", from, to, verdict);
                    return None;
                }
                graph.connect(from, to)
            }
            SplicePolicy::Force => match graph.connect_unchecked(from, to) {
                Ok(id) => Some(id),
                Err(err) => {
                    log::warn!("Cannot force link {} -> {}: {}", from, to, err);
                    None
                }
            },
        }
    }
}
