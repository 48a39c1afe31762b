use crate::error::GraphError;
use crate::types::{LinkId, NodeId, PortId, Point};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Direction of a port. Links run from an output to an input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
}

/// Named connection point on a node.
///
/// A port is owned by its node; the graph keeps a back-reference index from
/// port id to node id. `links` always mirrors the links in the graph whose
/// source or target is this port.
#[derive(Clone, Debug, PartialEq)]
pub struct Port {
    pub id: PortId,
    pub name: String,
    pub direction: PortDirection,
    /// Maximum number of attached links, `None` for unbounded.
    pub max_links: Option<usize>,
    links: BTreeSet<LinkId>,
}

impl Port {
    pub fn new(id: impl Into<PortId>, name: impl Into<String>, direction: PortDirection) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            direction,
            max_links: None,
            links: BTreeSet::new(),
        }
    }

    pub fn input(id: impl Into<PortId>, name: impl Into<String>) -> Self {
        Self::new(id, name, PortDirection::Input)
    }

    pub fn output(id: impl Into<PortId>, name: impl Into<String>) -> Self {
        Self::new(id, name, PortDirection::Output)
    }

    pub fn with_max_links(mut self, max: usize) -> Self {
        self.max_links = Some(max);
        self
    }

    /// Links currently attached to this port.
    pub fn links(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.links.iter().copied()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: Point,
    /// Locked nodes are never moved by drag gestures.
    pub locked: bool,
    ports: Vec<Port>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, position: Point) -> Self {
        Self { id: id.into(), position, locked: false, ports: Vec::new() }
    }

    pub fn with_port(mut self, port: Port) -> Self {
        self.ports.push(port);
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    fn port_mut_by_id(&mut self, id: PortId) -> Option<&mut Port> {
        self.ports.iter_mut().find(|p| p.id == id)
    }
}

/// Directed connection between two ports.
///
/// Either endpoint may be unset while a link is being built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    pub id: LinkId,
    pub source: Option<PortId>,
    pub target: Option<PortId>,
}

impl Link {
    pub fn new(id: impl Into<LinkId>, source: PortId, target: PortId) -> Self {
        Self { id: id.into(), source: Some(source), target: Some(target) }
    }

    pub fn dangling(id: impl Into<LinkId>) -> Self {
        Self { id: id.into(), source: None, target: None }
    }
}

/// The diagram model: nodes with their ports, and the links between them.
pub struct DiagramGraph {
    nodes: HashMap<NodeId, Node>,
    links: HashMap<LinkId, Link>,
    port_owners: HashMap<PortId, NodeId>,
    grid_size: f32,
    next_link_id: i32,
    validator: Box<dyn PortValidator>,
}

impl Default for DiagramGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DiagramGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagramGraph")
            .field("nodes", &self.nodes.len())
            .field("links", &self.links.len())
            .field("grid_size", &self.grid_size)
            .finish()
    }
}

impl DiagramGraph {
    /// Create an empty graph validating links with [`BasicPortValidator`].
    pub fn new() -> Self {
        Self::with_validator(BasicPortValidator)
    }

    pub fn with_validator<V: PortValidator + 'static>(validator: V) -> Self {
        Self {
            nodes: HashMap::new(),
            links: HashMap::new(),
            port_owners: HashMap::new(),
            grid_size: 0.0,
            next_link_id: 1,
            validator: Box::new(validator),
        }
    }

    pub fn set_validator<V: PortValidator + 'static>(&mut self, validator: V) {
        self.validator = Box::new(validator);
    }

    // === Grid ===

    pub fn set_grid_size(&mut self, size: f32) {
        self.grid_size = size.max(0.0);
    }

    pub fn grid_size(&self) -> f32 {
        self.grid_size
    }

    /// Snap a single coordinate to the grid (identity when the grid is off).
    pub fn grid_position(&self, value: f32) -> f32 {
        if self.grid_size <= 0.0 {
            return value;
        }
        (value / self.grid_size).round() * self.grid_size
    }

    // === Nodes ===

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add a node and register its ports.
    ///
    /// Any link ids the ports carried from elsewhere are dropped: a freshly
    /// added node starts disconnected.
    pub fn add_node(&mut self, mut node: Node) -> Result<NodeId, GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        let mut seen = BTreeSet::new();
        for port in &node.ports {
            if self.port_owners.contains_key(&port.id) || !seen.insert(port.id) {
                return Err(GraphError::DuplicatePort(port.id));
            }
        }
        for port in &mut node.ports {
            port.links.clear();
            self.port_owners.insert(port.id, node.id);
        }
        let id = node.id;
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Remove a node together with every link attached to its ports.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        let attached: Vec<LinkId> = self.links_of_node(id);
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        for link in attached {
            self.remove_link(link);
        }
        let node = self.nodes.remove(&id).ok_or(GraphError::NodeNotFound(id))?;
        for port in &node.ports {
            self.port_owners.remove(&port.id);
        }
        Ok(node)
    }

    pub fn position(&self, id: NodeId) -> Option<Point> {
        self.nodes.get(&id).map(|n| n.position)
    }

    pub fn set_position(&mut self, id: NodeId, position: Point) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        node.position = position;
        Ok(())
    }

    pub fn is_locked(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.locked)
    }

    /// All links attached to any port of the node.
    pub fn links_of_node(&self, id: NodeId) -> Vec<LinkId> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        let links: BTreeSet<LinkId> = node.ports.iter().flat_map(|p| p.links()).collect();
        links.into_iter().collect()
    }

    // === Ports ===

    pub fn port(&self, id: PortId) -> Option<&Port> {
        let owner = self.port_owners.get(&id)?;
        self.nodes.get(owner)?.ports.iter().find(|p| p.id == id)
    }

    pub fn port_owner(&self, id: PortId) -> Option<NodeId> {
        self.port_owners.get(&id).copied()
    }

    pub fn port_by_name(&self, node: NodeId, name: &str) -> Option<PortId> {
        self.nodes.get(&node)?.port(name).map(|p| p.id)
    }

    /// Links attached to the port (empty for an unknown port).
    pub fn port_links(&self, id: PortId) -> Vec<LinkId> {
        self.port(id).map(|p| p.links().collect()).unwrap_or_default()
    }

    fn port_mut(&mut self, id: PortId) -> Option<&mut Port> {
        let owner = *self.port_owners.get(&id)?;
        self.nodes.get_mut(&owner)?.port_mut_by_id(id)
    }

    // === Links ===

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    pub fn contains_link(&self, id: LinkId) -> bool {
        self.links.contains_key(&id)
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.links.values()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Find a link running from `source` to `target`.
    pub fn find_link(&self, source: PortId, target: PortId) -> Option<LinkId> {
        self.port(source)?
            .links()
            .find(|id| {
                self.links
                    .get(id)
                    .is_some_and(|l| l.source == Some(source) && l.target == Some(target))
            })
    }

    /// Allocate an unused link id.
    pub fn next_link_id(&mut self) -> LinkId {
        while self.links.contains_key(&LinkId(self.next_link_id)) {
            self.next_link_id += 1;
        }
        let id = LinkId(self.next_link_id);
        self.next_link_id += 1;
        id
    }

    /// Add a link, attaching it to whichever endpoints are set.
    pub fn add_link(&mut self, link: Link) -> Result<LinkId, GraphError> {
        if self.links.contains_key(&link.id) {
            return Err(GraphError::DuplicateLink(link.id));
        }
        for port in [link.source, link.target].into_iter().flatten() {
            if !self.port_owners.contains_key(&port) {
                return Err(GraphError::PortNotFound(port));
            }
        }
        for port in [link.source, link.target].into_iter().flatten() {
            if let Some(p) = self.port_mut(port) {
                p.links.insert(link.id);
            }
        }
        if link.id.0 >= self.next_link_id {
            self.next_link_id = link.id.0 + 1;
        }
        self.links.insert(link.id, link);
        Ok(link.id)
    }

    /// Remove a link and detach it from its ports. Unknown ids are a no-op.
    pub fn remove_link(&mut self, id: LinkId) -> Option<Link> {
        let link = self.links.remove(&id)?;
        for port in [link.source, link.target].into_iter().flatten() {
            if let Some(p) = self.port_mut(port) {
                p.links.remove(&id);
            }
        }
        Some(link)
    }

    /// Remove every link attached to the port, returning the removed ids.
    pub fn clear_port_links(&mut self, port: PortId) -> Vec<LinkId> {
        let attached = self.port_links(port);
        for id in &attached {
            self.remove_link(*id);
        }
        attached
    }

    pub fn set_link_source(&mut self, id: LinkId, port: Option<PortId>) -> Result<(), GraphError> {
        self.set_link_end(id, port, true)
    }

    pub fn set_link_target(&mut self, id: LinkId, port: Option<PortId>) -> Result<(), GraphError> {
        self.set_link_end(id, port, false)
    }

    fn set_link_end(&mut self, id: LinkId, port: Option<PortId>, source: bool) -> Result<(), GraphError> {
        if let Some(port) = port {
            if !self.port_owners.contains_key(&port) {
                return Err(GraphError::PortNotFound(port));
            }
        }
        let link = self.links.get_mut(&id).ok_or(GraphError::LinkNotFound(id))?;
        let slot = if source { &mut link.source } else { &mut link.target };
        let old = std::mem::replace(slot, port);
        let other = if source { link.target } else { link.source };

        if let Some(old) = old {
            // The link may still reference the old port through its other end.
            if other != Some(old) {
                if let Some(p) = self.port_mut(old) {
                    p.links.remove(&id);
                }
            }
        }
        if let Some(new) = port {
            if let Some(p) = self.port_mut(new) {
                p.links.insert(id);
            }
        }
        Ok(())
    }

    // === Compatibility ===

    /// Run the graph's validator on a prospective `source -> target` link.
    pub fn validate_ports(&self, source: PortId, target: PortId) -> ValidationResult {
        self.validator.validate(source, target, self)
    }

    /// Whether `source` may be linked to `target` under the graph's rules.
    pub fn can_link_ports(&self, source: PortId, target: PortId) -> bool {
        self.validate_ports(source, target).is_valid()
    }

    /// Create a link if the rules allow it.
    ///
    /// Returns `None` (and logs why) when the validator rejects the pair.
    pub fn connect(&mut self, source: PortId, target: PortId) -> Option<LinkId> {
        match self.validate_ports(source, target) {
            ValidationResult::Valid => self.connect_unchecked(source, target).ok(),
            ValidationResult::Invalid(reason) => {
                log::debug!("Refusing link {} -> {}: {}", source, target, reason);
                None
            }
        }
    }

    /// Create a link without consulting the validator.
    pub fn connect_unchecked(&mut self, source: PortId, target: PortId) -> Result<LinkId, GraphError> {
        let id = self.next_link_id();
        self.add_link(Link::new(id, source, target))
    }
}

// ============================================================================
// Link Validation Framework
// ============================================================================

/// Result of link validation with optional rejection reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Link is valid
    Valid,
    /// Link is invalid with a reason
    Invalid(ValidationError),
}

impl ValidationResult {
    /// Check if the result is valid
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Combine two results (AND logic): returns first error if any
    pub fn and(self, other: ValidationResult) -> ValidationResult {
        match self {
            ValidationResult::Valid => other,
            invalid => invalid,
        }
    }
}

/// Reasons why a link validation failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Port is not part of the graph
    PortNotFound(PortId),
    /// Cannot link a port to itself
    SamePort,
    /// Cannot link ports on the same node
    SameNode,
    /// Source must be an output and target an input
    IncompatibleDirection,
    /// A link between these ports already exists
    DuplicateLink,
    /// Port has reached maximum connections
    MaxConnectionsReached { port: PortId, max: usize },
    /// Custom validation failure
    Custom(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PortNotFound(id) => write!(f, "Port {} not found", id.0),
            Self::SamePort => write!(f, "Cannot link port to itself"),
            Self::SameNode => write!(f, "Cannot link ports on same node"),
            Self::IncompatibleDirection => write!(f, "Must connect output to input"),
            Self::DuplicateLink => write!(f, "Link already exists"),
            Self::MaxConnectionsReached { port, max } => {
                write!(f, "Port {} has reached max {} connections", port.0, max)
            }
            Self::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

/// Port-compatibility rule consulted before links are created.
///
/// Implement this to add custom rules (data types, fan-out limits, ...).
/// Compose several with [`CompositeValidator`].
///
/// # Example
///
/// ```ignore
/// struct NoSelfLoops;
///
/// impl PortValidator for NoSelfLoops {
///     fn validate(&self, source: PortId, target: PortId, graph: &DiagramGraph) -> ValidationResult {
///         if graph.port_owner(source) == graph.port_owner(target) {
///             ValidationResult::Invalid(ValidationError::SameNode)
///         } else {
///             ValidationResult::Valid
///         }
///     }
/// }
/// ```
pub trait PortValidator {
    /// Check whether a link from `source` to `target` is allowed.
    fn validate(&self, source: PortId, target: PortId, graph: &DiagramGraph) -> ValidationResult;
}

/// Accepts every pair of existing ports.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl PortValidator for AllowAll {
    fn validate(&self, source: PortId, target: PortId, graph: &DiagramGraph) -> ValidationResult {
        for port in [source, target] {
            if graph.port(port).is_none() {
                return ValidationResult::Invalid(ValidationError::PortNotFound(port));
            }
        }
        ValidationResult::Valid
    }
}

/// Default validator: checks basic I/O compatibility
///
/// 1. Ports must exist
/// 2. Ports must differ and sit on different nodes
/// 3. The source must be an output, the target an input
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicPortValidator;

impl PortValidator for BasicPortValidator {
    fn validate(&self, source: PortId, target: PortId, graph: &DiagramGraph) -> ValidationResult {
        if source == target {
            return ValidationResult::Invalid(ValidationError::SamePort);
        }

        let Some(source_port) = graph.port(source) else {
            return ValidationResult::Invalid(ValidationError::PortNotFound(source));
        };
        let Some(target_port) = graph.port(target) else {
            return ValidationResult::Invalid(ValidationError::PortNotFound(target));
        };

        if graph.port_owner(source) == graph.port_owner(target) {
            return ValidationResult::Invalid(ValidationError::SameNode);
        }

        if source_port.direction != PortDirection::Output
            || target_port.direction != PortDirection::Input
        {
            return ValidationResult::Invalid(ValidationError::IncompatibleDirection);
        }

        ValidationResult::Valid
    }
}

/// Rejects links that would exceed a port's `max_links`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CapacityValidator;

impl PortValidator for CapacityValidator {
    fn validate(&self, source: PortId, target: PortId, graph: &DiagramGraph) -> ValidationResult {
        for id in [source, target] {
            let Some(port) = graph.port(id) else {
                return ValidationResult::Invalid(ValidationError::PortNotFound(id));
            };
            if let Some(max) = port.max_links {
                if port.link_count() >= max {
                    return ValidationResult::Invalid(ValidationError::MaxConnectionsReached {
                        port: id,
                        max,
                    });
                }
            }
        }
        ValidationResult::Valid
    }
}

/// Validator that prevents duplicate links
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDuplicatesValidator;

impl PortValidator for NoDuplicatesValidator {
    fn validate(&self, source: PortId, target: PortId, graph: &DiagramGraph) -> ValidationResult {
        if graph.find_link(source, target).is_some() {
            ValidationResult::Invalid(ValidationError::DuplicateLink)
        } else {
            ValidationResult::Valid
        }
    }
}

/// Composite validator that combines multiple validators
///
/// All validators must return Valid for the link to be valid (AND logic).
/// Returns the first error encountered (short-circuits on failure).
///
/// # Example
///
/// ```ignore
/// let validator = CompositeValidator::new()
///     .add(BasicPortValidator)
///     .add(NoDuplicatesValidator);
/// let graph = DiagramGraph::with_validator(validator);
/// ```
#[derive(Default)]
pub struct CompositeValidator {
    validators: Vec<Box<dyn PortValidator>>,
}

impl CompositeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validator to the composite
    ///
    /// Validators are checked in the order they were added.
    pub fn add<V: PortValidator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }
}

impl PortValidator for CompositeValidator {
    fn validate(&self, source: PortId, target: PortId, graph: &DiagramGraph) -> ValidationResult {
        for v in &self.validators {
            let result = v.validate(source, target, graph);
            if !result.is_valid() {
                return result;
            }
        }
        ValidationResult::Valid
    }
}

/// Adapts a plain predicate into a [`PortValidator`].
pub struct PredicateValidator<F>(pub F);

impl<F> PortValidator for PredicateValidator<F>
where
    F: Fn(&Port, &Port) -> bool,
{
    fn validate(&self, source: PortId, target: PortId, graph: &DiagramGraph) -> ValidationResult {
        let Some(s) = graph.port(source) else {
            return ValidationResult::Invalid(ValidationError::PortNotFound(source));
        };
        let Some(t) = graph.port(target) else {
            return ValidationResult::Invalid(ValidationError::PortNotFound(target));
        };
        if (self.0)(s, t) {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(ValidationError::Custom(format!(
                "'{}' cannot be linked to '{}'",
                s.name, t.name
            )))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Two nodes: node 1 with output 11, node 2 with inputs 21, 22 and output 23.
    fn setup_graph() -> DiagramGraph {
        let mut graph = DiagramGraph::new();
        graph
            .add_node(Node::new(1, Point::new(0.0, 0.0)).with_port(Port::output(11, "out-0")))
            .unwrap();
        graph
            .add_node(
                Node::new(2, Point::new(200.0, 0.0))
                    .with_port(Port::input(21, "in-0"))
                    .with_port(Port::input(22, "in-1"))
                    .with_port(Port::output(23, "out-0")),
            )
            .unwrap();
        graph
    }

    // ========================================================================
    // Nodes and ports
    // ========================================================================

    #[test]
    fn test_add_node_registers_ports() {
        let graph = setup_graph();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.port_owner(PortId(21)), Some(NodeId(2)));
        assert_eq!(graph.port_by_name(NodeId(2), "in-1"), Some(PortId(22)));
        assert_eq!(graph.port_by_name(NodeId(1), "in-0"), None);
    }

    #[test]
    fn test_add_node_rejects_duplicate_node() {
        let mut graph = setup_graph();
        let err = graph.add_node(Node::new(1, Point::default())).unwrap_err();
        assert_eq!(err, GraphError::DuplicateNode(NodeId(1)));
    }

    #[test]
    fn test_add_node_rejects_duplicate_port() {
        let mut graph = setup_graph();
        let err = graph
            .add_node(Node::new(3, Point::default()).with_port(Port::input(21, "in-0")))
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicatePort(PortId(21)));
        assert!(!graph.contains_node(NodeId(3)));

        let err = graph
            .add_node(
                Node::new(4, Point::default())
                    .with_port(Port::input(40, "a"))
                    .with_port(Port::output(40, "b")),
            )
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicatePort(PortId(40)));
    }

    #[test]
    fn test_remove_node_removes_attached_links() {
        let mut graph = setup_graph();
        let link = graph.connect(PortId(11), PortId(21)).unwrap();
        let removed = graph.remove_node(NodeId(2)).unwrap();
        assert_eq!(removed.id, NodeId(2));
        assert!(!graph.contains_link(link));
        assert!(graph.port_links(PortId(11)).is_empty());
        assert_eq!(graph.port_owner(PortId(21)), None);
        assert_eq!(graph.remove_node(NodeId(2)).unwrap_err(), GraphError::NodeNotFound(NodeId(2)));
    }

    #[test]
    fn test_set_position_and_lock() {
        let mut graph = setup_graph();
        graph.set_position(NodeId(1), Point::new(5.0, 6.0)).unwrap();
        assert_eq!(graph.position(NodeId(1)), Some(Point::new(5.0, 6.0)));
        assert!(!graph.is_locked(NodeId(1)));
        graph.node_mut(NodeId(1)).unwrap().locked = true;
        assert!(graph.is_locked(NodeId(1)));
        assert!(!graph.is_locked(NodeId(99)));
        assert!(graph.set_position(NodeId(99), Point::default()).is_err());
    }

    // ========================================================================
    // Grid snapping
    // ========================================================================

    #[test]
    fn test_grid_position_disabled_is_identity() {
        let graph = DiagramGraph::new();
        assert_eq!(graph.grid_position(13.7), 13.7);
    }

    #[test]
    fn test_grid_position_rounds_to_nearest() {
        let mut graph = DiagramGraph::new();
        graph.set_grid_size(10.0);
        assert_eq!(graph.grid_position(13.0), 10.0);
        assert_eq!(graph.grid_position(15.0), 20.0);
        assert_eq!(graph.grid_position(-14.0), -10.0);
    }

    // ========================================================================
    // Links
    // ========================================================================

    #[test]
    fn test_add_link_attaches_to_ports() {
        let mut graph = setup_graph();
        let id = graph.add_link(Link::new(7, PortId(11), PortId(21))).unwrap();
        assert_eq!(id, LinkId(7));
        assert_eq!(graph.port_links(PortId(11)), vec![LinkId(7)]);
        assert_eq!(graph.port_links(PortId(21)), vec![LinkId(7)]);
        assert_eq!(graph.find_link(PortId(11), PortId(21)), Some(LinkId(7)));
        // Allocation skips past explicitly added ids
        assert_eq!(graph.next_link_id(), LinkId(8));
    }

    #[test]
    fn test_add_link_rejects_unknown_port_and_duplicates() {
        let mut graph = setup_graph();
        assert_eq!(
            graph.add_link(Link::new(1, PortId(11), PortId(99))).unwrap_err(),
            GraphError::PortNotFound(PortId(99))
        );
        assert!(graph.port_links(PortId(11)).is_empty());

        graph.add_link(Link::new(1, PortId(11), PortId(21))).unwrap();
        assert_eq!(
            graph.add_link(Link::new(1, PortId(11), PortId(22))).unwrap_err(),
            GraphError::DuplicateLink(LinkId(1))
        );
    }

    #[test]
    fn test_dangling_link_can_be_completed() {
        let mut graph = setup_graph();
        let id = graph.add_link(Link::dangling(5)).unwrap();
        graph.set_link_source(id, Some(PortId(11))).unwrap();
        graph.set_link_target(id, Some(PortId(21))).unwrap();
        assert_eq!(graph.link(id).unwrap().target, Some(PortId(21)));
        assert_eq!(graph.port_links(PortId(21)), vec![id]);

        graph.set_link_target(id, Some(PortId(22))).unwrap();
        assert!(graph.port_links(PortId(21)).is_empty());
        assert_eq!(graph.port_links(PortId(22)), vec![id]);

        assert_eq!(
            graph.set_link_target(LinkId(77), None).unwrap_err(),
            GraphError::LinkNotFound(LinkId(77))
        );
    }

    #[test]
    fn test_remove_link_detaches() {
        let mut graph = setup_graph();
        let id = graph.connect(PortId(11), PortId(21)).unwrap();
        let removed = graph.remove_link(id).unwrap();
        assert_eq!(removed.source, Some(PortId(11)));
        assert!(graph.port_links(PortId(11)).is_empty());
        assert!(graph.port_links(PortId(21)).is_empty());
        assert!(graph.remove_link(id).is_none());
    }

    #[test]
    fn test_clear_port_links() {
        let mut graph = setup_graph();
        let a = graph.connect(PortId(11), PortId(21)).unwrap();
        let b = graph.connect(PortId(11), PortId(22)).unwrap();
        let removed = graph.clear_port_links(PortId(11));
        assert_eq!(removed, vec![a, b]);
        assert_eq!(graph.link_count(), 0);
    }

    #[test]
    fn test_links_of_node() {
        let mut graph = setup_graph();
        let a = graph.connect(PortId(11), PortId(21)).unwrap();
        let b = graph.connect(PortId(11), PortId(22)).unwrap();
        assert_eq!(graph.links_of_node(NodeId(2)), vec![a, b]);
        assert!(graph.links_of_node(NodeId(99)).is_empty());
    }

    // ========================================================================
    // connect() / connect_unchecked()
    // ========================================================================

    #[test]
    fn test_connect_respects_rules() {
        let mut graph = setup_graph();
        // input -> output is the wrong direction
        assert!(graph.connect(PortId(21), PortId(11)).is_none());
        assert_eq!(graph.link_count(), 0);
        assert!(graph.connect(PortId(11), PortId(21)).is_some());
    }

    #[test]
    fn test_connect_unchecked_ignores_rules() {
        let mut graph = setup_graph();
        let id = graph.connect_unchecked(PortId(21), PortId(11)).unwrap();
        assert_eq!(graph.link(id).unwrap().source, Some(PortId(21)));
        assert!(graph.connect_unchecked(PortId(21), PortId(404)).is_err());
    }

    // ========================================================================
    // Validators
    // ========================================================================

    #[test]
    fn test_basic_validator() {
        let graph = setup_graph();
        let v = BasicPortValidator;
        assert!(v.validate(PortId(11), PortId(21), &graph).is_valid());
        assert_eq!(
            v.validate(PortId(11), PortId(11), &graph),
            ValidationResult::Invalid(ValidationError::SamePort)
        );
        assert_eq!(
            v.validate(PortId(23), PortId(21), &graph),
            ValidationResult::Invalid(ValidationError::SameNode)
        );
        assert_eq!(
            v.validate(PortId(11), PortId(23), &graph),
            ValidationResult::Invalid(ValidationError::IncompatibleDirection)
        );
        assert_eq!(
            v.validate(PortId(11), PortId(999), &graph),
            ValidationResult::Invalid(ValidationError::PortNotFound(PortId(999)))
        );
    }

    #[test]
    fn test_capacity_validator() {
        let mut graph = DiagramGraph::with_validator(CapacityValidator);
        graph
            .add_node(Node::new(1, Point::default()).with_port(Port::output(1, "o").with_max_links(1)))
            .unwrap();
        graph
            .add_node(
                Node::new(2, Point::default())
                    .with_port(Port::input(2, "a"))
                    .with_port(Port::input(3, "b")),
            )
            .unwrap();
        assert!(graph.connect(PortId(1), PortId(2)).is_some());
        assert_eq!(
            graph.validate_ports(PortId(1), PortId(3)),
            ValidationResult::Invalid(ValidationError::MaxConnectionsReached { port: PortId(1), max: 1 })
        );
    }

    #[test]
    fn test_composite_validator_short_circuits() {
        let mut graph = setup_graph();
        graph.set_validator(CompositeValidator::new().add(BasicPortValidator).add(NoDuplicatesValidator));

        assert!(graph.connect(PortId(11), PortId(21)).is_some());
        assert_eq!(
            graph.validate_ports(PortId(11), PortId(21)),
            ValidationResult::Invalid(ValidationError::DuplicateLink)
        );
        assert_eq!(
            graph.validate_ports(PortId(11), PortId(11)),
            ValidationResult::Invalid(ValidationError::SamePort)
        );
    }

    #[test]
    fn test_predicate_validator() {
        let mut graph = setup_graph();
        graph.set_validator(PredicateValidator(|s: &Port, t: &Port| s.name == "out-0" && t.name == "in-1"));
        assert!(!graph.can_link_ports(PortId(11), PortId(21)));
        assert!(graph.can_link_ports(PortId(11), PortId(22)));
        match graph.validate_ports(PortId(11), PortId(21)) {
            ValidationResult::Invalid(ValidationError::Custom(msg)) => assert!(msg.contains("in-0")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_allow_all_validator() {
        let mut graph = setup_graph();
        graph.set_validator(AllowAll);
        assert!(graph.can_link_ports(PortId(21), PortId(11)));
        assert!(!graph.can_link_ports(PortId(21), PortId(1000)));
    }

    #[test]
    fn test_validation_result_and_combinator() {
        assert!(ValidationResult::Valid.and(ValidationResult::Valid).is_valid());
        assert_eq!(
            ValidationResult::Invalid(ValidationError::SameNode)
                .and(ValidationResult::Invalid(ValidationError::SamePort)),
            ValidationResult::Invalid(ValidationError::SameNode)
        );
    }

    #[test]
    fn test_validation_error_display() {
        assert_eq!(format!("{}", ValidationError::PortNotFound(PortId(42))), "Port 42 not found");
        assert_eq!(format!("{}", ValidationError::SamePort), "Cannot link port to itself");
        assert_eq!(format!("{}", ValidationError::IncompatibleDirection), "Must connect output to input");
        assert_eq!(
            format!("{}", ValidationError::MaxConnectionsReached { port: PortId(123), max: 3 }),
            "Port 123 has reached max 3 connections"
        );
        assert_eq!(format!("{}", ValidationError::Custom("Test error".to_string())), "Test error");
    }
}
