//! The connection graph of a graphical body.
//!
//! Elements of FBD, LD and SFC bodies are stored as a flat list. The wiring
//! between them is only implied by the local ids named in their inputs.
//! [`BodyGraph`] assembles the explicit view once: the nodes indexed by
//! local id and the list of edges. Building the graph checks that
//!
//! * no two elements share a local id,
//! * no two elements share an execution order id,
//! * every connection refers to an element of the same body,
//! * every continuation names exactly one connector.
//!
//! Graphs may contain cycles.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::trace;

use crate::body::{Body, Connection, ConnectionPointIn, FbdObject, Frame, LdObject, SfcObject};
use crate::error::Error;

/// The address of an element within one body.
pub type LocalId = u64;

/// A connection attached to the input side of an element.
#[derive(Clone, Copy, Debug)]
pub struct Input<'a> {
    /// The formal parameter of the receiving pin, for elements with named
    /// inputs.
    pub target_parameter: Option<&'a str>,
    pub connection: &'a Connection,
}

/// Common view of the elements of the three graphical languages.
pub trait GraphElement {
    fn frame(&self) -> &Frame;

    fn tag(&self) -> &'static str;

    /// The connections into this element, in document order.
    fn inputs(&self) -> Vec<Input<'_>>;

    fn execution_order_id(&self) -> Option<u64> {
        None
    }

    fn connector_name(&self) -> Option<&str> {
        None
    }

    fn continuation_name(&self) -> Option<&str> {
        None
    }

    fn local_id(&self) -> LocalId {
        self.frame().local_id
    }
}

fn collect<'a>(
    point: Option<&'a ConnectionPointIn>,
    target_parameter: Option<&'a str>,
    inputs: &mut Vec<Input<'a>>,
) {
    if let Some(point) = point {
        inputs.extend(point.connections.iter().map(|connection| Input {
            target_parameter,
            connection,
        }));
    }
}

impl GraphElement for FbdObject {
    fn frame(&self) -> &Frame {
        FbdObject::frame(self)
    }

    fn tag(&self) -> &'static str {
        FbdObject::tag(self)
    }

    fn inputs(&self) -> Vec<Input<'_>> {
        let mut inputs = Vec::new();
        match self {
            FbdObject::Block(block) => {
                for pin in block.input_variables.iter().chain(&block.in_out_variables) {
                    collect(
                        pin.connection_point_in.as_ref(),
                        Some(pin.formal_parameter.as_str()),
                        &mut inputs,
                    );
                }
            }
            FbdObject::ActionBlock(e) => collect(e.connection_point_in.as_ref(), None, &mut inputs),
            FbdObject::Connector(e) => collect(e.connection_point_in.as_ref(), None, &mut inputs),
            FbdObject::OutVariable(e) => collect(e.connection_point_in.as_ref(), None, &mut inputs),
            FbdObject::InOutVariable(e) => {
                collect(e.connection_point_in.as_ref(), None, &mut inputs)
            }
            FbdObject::Jump(e) => collect(e.connection_point_in.as_ref(), None, &mut inputs),
            FbdObject::Return(e) => collect(e.connection_point_in.as_ref(), None, &mut inputs),
            FbdObject::Comment(_)
            | FbdObject::Continuation(_)
            | FbdObject::InVariable(_)
            | FbdObject::Label(_) => {}
        }
        inputs
    }

    fn execution_order_id(&self) -> Option<u64> {
        match self {
            FbdObject::Block(e) => e.execution_order_id,
            FbdObject::InVariable(e) => e.execution_order_id,
            FbdObject::OutVariable(e) => e.execution_order_id,
            FbdObject::InOutVariable(e) => e.execution_order_id,
            _ => None,
        }
    }

    fn connector_name(&self) -> Option<&str> {
        match self {
            FbdObject::Connector(e) => Some(&e.name),
            _ => None,
        }
    }

    fn continuation_name(&self) -> Option<&str> {
        match self {
            FbdObject::Continuation(e) => Some(&e.name),
            _ => None,
        }
    }
}

impl GraphElement for LdObject {
    fn frame(&self) -> &Frame {
        LdObject::frame(self)
    }

    fn tag(&self) -> &'static str {
        LdObject::tag(self)
    }

    fn inputs(&self) -> Vec<Input<'_>> {
        let mut inputs = Vec::new();
        match self {
            LdObject::Contact(e) => collect(e.connection_point_in.as_ref(), None, &mut inputs),
            LdObject::Coil(e) => collect(e.connection_point_in.as_ref(), None, &mut inputs),
            LdObject::LeftPowerRail(_) => {}
            LdObject::RightPowerRail(e) => {
                for point in &e.connection_points_in {
                    collect(Some(point), None, &mut inputs);
                }
            }
            LdObject::Fbd(e) => return e.inputs(),
        }
        inputs
    }

    fn execution_order_id(&self) -> Option<u64> {
        match self {
            LdObject::Fbd(e) => e.execution_order_id(),
            _ => None,
        }
    }

    fn connector_name(&self) -> Option<&str> {
        match self {
            LdObject::Fbd(e) => e.connector_name(),
            _ => None,
        }
    }

    fn continuation_name(&self) -> Option<&str> {
        match self {
            LdObject::Fbd(e) => e.continuation_name(),
            _ => None,
        }
    }
}

impl GraphElement for SfcObject {
    fn frame(&self) -> &Frame {
        SfcObject::frame(self)
    }

    fn tag(&self) -> &'static str {
        SfcObject::tag(self)
    }

    fn inputs(&self) -> Vec<Input<'_>> {
        let mut inputs = Vec::new();
        match self {
            SfcObject::Step(e) => collect(e.connection_point_in.as_ref(), None, &mut inputs),
            SfcObject::Transition(e) => collect(e.connection_point_in.as_ref(), None, &mut inputs),
            SfcObject::SelectionDivergence(e) | SfcObject::SimultaneousDivergence(e) => {
                collect(e.connection_point_in.as_ref(), None, &mut inputs)
            }
            SfcObject::SelectionConvergence(e) | SfcObject::SimultaneousConvergence(e) => {
                for point in &e.connection_points_in {
                    collect(Some(point), None, &mut inputs);
                }
            }
            SfcObject::JumpStep(e) => collect(e.connection_point_in.as_ref(), None, &mut inputs),
            SfcObject::Fbd(e) => return e.inputs(),
        }
        inputs
    }

    fn execution_order_id(&self) -> Option<u64> {
        match self {
            SfcObject::Fbd(e) => e.execution_order_id(),
            _ => None,
        }
    }

    fn connector_name(&self) -> Option<&str> {
        match self {
            SfcObject::Fbd(e) => e.connector_name(),
            _ => None,
        }
    }

    fn continuation_name(&self) -> Option<&str> {
        match self {
            SfcObject::Fbd(e) => e.continuation_name(),
            _ => None,
        }
    }
}

/// A wire from the output of `source` to the input of `target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge<'a> {
    pub source: LocalId,
    pub target: LocalId,
    pub source_parameter: Option<&'a str>,
    pub target_parameter: Option<&'a str>,
}

/// The assembled graph of one body. Textual bodies have an empty graph.
pub struct BodyGraph<'a> {
    nodes: BTreeMap<LocalId, &'a dyn GraphElement>,
    edges: Vec<Edge<'a>>,
    continuations: BTreeMap<LocalId, LocalId>,
}

impl<'a> BodyGraph<'a> {
    /// Builds the graph of the body. `path` locates the body in errors.
    pub fn build(body: &'a Body, path: &str) -> Result<Self, Error> {
        match body {
            Body::Il(_) | Body::St(_) => Self::from_elements(Vec::new(), path),
            Body::Fbd(fbd) => Self::from_elements(
                fbd.elements.iter().map(|e| e as &dyn GraphElement).collect(),
                path,
            ),
            Body::Ld(ld) => Self::from_elements(
                ld.elements.iter().map(|e| e as &dyn GraphElement).collect(),
                path,
            ),
            Body::Sfc(sfc) => Self::from_elements(
                sfc.elements.iter().map(|e| e as &dyn GraphElement).collect(),
                path,
            ),
        }
    }

    fn from_elements(elements: Vec<&'a dyn GraphElement>, path: &str) -> Result<Self, Error> {
        let mut nodes = BTreeMap::new();
        let mut orders = HashSet::new();

        for &element in &elements {
            let id = element.local_id();
            if nodes.insert(id, element).is_some() {
                return Err(Error::DuplicateLocalId {
                    path: path.to_string(),
                    id,
                });
            }
            if let Some(order) = element.execution_order_id() {
                if !orders.insert(order) {
                    return Err(Error::DuplicateExecutionOrder {
                        path: path.to_string(),
                        order,
                    });
                }
            }
        }

        // Connections may refer forward so they are resolved once all ids
        // are known.
        let mut edges = Vec::new();
        for &element in &elements {
            for input in element.inputs() {
                let source = input.connection.ref_local_id;
                if !nodes.contains_key(&source) {
                    return Err(Error::DanglingReference {
                        path: path.to_string(),
                        id: source,
                    });
                }
                edges.push(Edge {
                    source,
                    target: element.local_id(),
                    source_parameter: input.connection.formal_parameter.as_deref(),
                    target_parameter: input.target_parameter,
                });
            }
        }

        let continuations = resolve_continuations(&elements, path)?;

        trace!(
            "{}: {} nodes, {} edges, {} continuations",
            path,
            nodes.len(),
            edges.len(),
            continuations.len()
        );

        Ok(Self {
            nodes,
            edges,
            continuations,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: LocalId) -> Option<&'a dyn GraphElement> {
        self.nodes.get(&id).copied()
    }

    /// Iterates over the nodes in ascending local id order.
    pub fn nodes(&self) -> impl Iterator<Item = (LocalId, &'a dyn GraphElement)> + '_ {
        self.nodes.iter().map(|(id, element)| (*id, *element))
    }

    pub fn edges(&self) -> &[Edge<'a>] {
        &self.edges
    }

    /// The edges that end at the element.
    pub fn inputs_of(&self, id: LocalId) -> impl Iterator<Item = &Edge<'a>> + '_ {
        self.edges.iter().filter(move |edge| edge.target == id)
    }

    /// The edges that start at the element.
    pub fn outputs_of(&self, id: LocalId) -> impl Iterator<Item = &Edge<'a>> + '_ {
        self.edges.iter().filter(move |edge| edge.source == id)
    }

    /// Maps the local id of each continuation to the local id of the
    /// connector it continues.
    pub fn continuation_sources(&self) -> &BTreeMap<LocalId, LocalId> {
        &self.continuations
    }
}

/// Connectors and continuations are matched by name rather than by local id.
fn resolve_continuations(
    elements: &[&dyn GraphElement],
    path: &str,
) -> Result<BTreeMap<LocalId, LocalId>, Error> {
    let mut connectors: HashMap<&str, Vec<LocalId>> = HashMap::new();
    for element in elements {
        if let Some(name) = element.connector_name() {
            connectors.entry(name).or_default().push(element.local_id());
        }
    }

    let mut continuations = BTreeMap::new();
    for element in elements {
        let Some(name) = element.continuation_name() else {
            continue;
        };
        match connectors.get(name).map(Vec::as_slice) {
            Some([connector]) => {
                continuations.insert(element.local_id(), *connector);
            }
            Some([_, _, ..]) => {
                return Err(Error::AmbiguousContinuation {
                    path: path.to_string(),
                    name: name.to_string(),
                })
            }
            _ => {
                return Err(Error::UnresolvedContinuation {
                    path: path.to_string(),
                    name: name.to_string(),
                })
            }
        }
    }

    Ok(continuations)
}
