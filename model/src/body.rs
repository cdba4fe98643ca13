//! Bodies of POUs, actions and transitions.
//!
//! A body is written in exactly one language. Textual bodies (IL, ST) hold
//! their source as opaque markup. Graphical bodies (FBD, LD, SFC) hold their
//! elements in document order. Elements do not nest: each has a local id and
//! its inputs name the local ids of the elements they are wired to. See
//! [`crate::graph`] for the assembled view.

use serde::{Deserialize, Serialize};

use crate::graph::LocalId;
use crate::text::FormattedText;

token_enum! {
    pub enum EdgeModifier {
        None => "none",
        Falling => "falling",
        Rising => "rising",
    }
}

token_enum! {
    pub enum StorageModifier {
        None => "none",
        Set => "set",
        Reset => "reset",
    }
}

token_enum! {
    pub enum ActionQualifier {
        P1 => "P1",
        N => "N",
        P0 => "P0",
        R => "R",
        S => "S",
        L => "L",
        D => "D",
        P => "P",
        DS => "DS",
        DL => "DL",
        SD => "SD",
        SL => "SL",
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Body {
    #[serde(rename = "IL")]
    Il(FormattedText),
    #[serde(rename = "ST")]
    St(FormattedText),
    #[serde(rename = "FBD")]
    Fbd(Fbd),
    #[serde(rename = "LD")]
    Ld(Ld),
    #[serde(rename = "SFC")]
    Sfc(Sfc),
}

impl Body {
    /// Creates a structured text body from source text.
    pub fn st(source: &str) -> Self {
        Body::St(FormattedText::paragraph(source))
    }

    /// Creates an instruction list body from source text.
    pub fn il(source: &str) -> Self {
        Body::Il(FormattedText::paragraph(source))
    }

    pub fn fbd(elements: Vec<FbdObject>) -> Self {
        Body::Fbd(Fbd { elements })
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Body::Il(_) => "IL",
            Body::St(_) => "ST",
            Body::Fbd(_) => "FBD",
            Body::Ld(_) => "LD",
            Body::Sfc(_) => "SFC",
        }
    }

    pub fn is_graphical(&self) -> bool {
        matches!(self, Body::Fbd(_) | Body::Ld(_) | Body::Sfc(_))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Fbd {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<FbdObject>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ld {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<LdObject>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sfc {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<SfcObject>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Identity and geometry shared by every graphical element.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub local_id: LocalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl Frame {
    pub fn new(local_id: LocalId) -> Self {
        Self {
            local_id,
            ..Default::default()
        }
    }

    pub fn at(local_id: LocalId, x: f64, y: f64) -> Self {
        Self {
            local_id,
            position: Some(Point::new(x, y)),
            ..Default::default()
        }
    }
}

/// A wire from the output of the element `ref_local_id`. When the source
/// element has several outputs, `formal_parameter` names the one used.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub ref_local_id: LocalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formal_parameter: Option<String>,
    /// Route points of the drawn wire.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<Point>,
}

impl Connection {
    pub fn to(ref_local_id: LocalId) -> Self {
        Self {
            ref_local_id,
            formal_parameter: None,
            positions: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPointIn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel_position: Option<Point>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,
}

impl ConnectionPointIn {
    pub fn from(connections: Vec<Connection>) -> Self {
        Self {
            rel_position: None,
            connections,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPointOut {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel_position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formal_parameter: Option<String>,
}

/// Elements that may appear in any graphical body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FbdObject {
    Block(Block),
    ActionBlock(ActionBlock),
    Comment(Comment),
    Connector(Connector),
    Continuation(Continuation),
    InVariable(InVariable),
    OutVariable(OutVariable),
    InOutVariable(InOutVariable),
    Jump(Jump),
    Label(Label),
    Return(Return),
}

impl FbdObject {
    pub fn frame(&self) -> &Frame {
        match self {
            FbdObject::Block(e) => &e.frame,
            FbdObject::ActionBlock(e) => &e.frame,
            FbdObject::Comment(e) => &e.frame,
            FbdObject::Connector(e) => &e.frame,
            FbdObject::Continuation(e) => &e.frame,
            FbdObject::InVariable(e) => &e.frame,
            FbdObject::OutVariable(e) => &e.frame,
            FbdObject::InOutVariable(e) => &e.frame,
            FbdObject::Jump(e) => &e.frame,
            FbdObject::Label(e) => &e.frame,
            FbdObject::Return(e) => &e.frame,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            FbdObject::Block(_) => "block",
            FbdObject::ActionBlock(_) => "actionBlock",
            FbdObject::Comment(_) => "comment",
            FbdObject::Connector(_) => "connector",
            FbdObject::Continuation(_) => "continuation",
            FbdObject::InVariable(_) => "inVariable",
            FbdObject::OutVariable(_) => "outVariable",
            FbdObject::InOutVariable(_) => "inOutVariable",
            FbdObject::Jump(_) => "jump",
            FbdObject::Label(_) => "label",
            FbdObject::Return(_) => "return",
        }
    }
}

/// Elements of a ladder diagram. Any [`FbdObject`] may also appear.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LdObject {
    Contact(Contact),
    Coil(Coil),
    LeftPowerRail(LeftPowerRail),
    RightPowerRail(RightPowerRail),
    #[serde(untagged)]
    Fbd(FbdObject),
}

impl LdObject {
    pub fn frame(&self) -> &Frame {
        match self {
            LdObject::Contact(e) => &e.frame,
            LdObject::Coil(e) => &e.frame,
            LdObject::LeftPowerRail(e) => &e.frame,
            LdObject::RightPowerRail(e) => &e.frame,
            LdObject::Fbd(e) => e.frame(),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            LdObject::Contact(_) => "contact",
            LdObject::Coil(_) => "coil",
            LdObject::LeftPowerRail(_) => "leftPowerRail",
            LdObject::RightPowerRail(_) => "rightPowerRail",
            LdObject::Fbd(e) => e.tag(),
        }
    }
}

/// Elements of a sequential function chart. Any [`FbdObject`] may also
/// appear.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SfcObject {
    Step(Step),
    Transition(SfcTransition),
    SelectionDivergence(Divergence),
    SelectionConvergence(Convergence),
    SimultaneousDivergence(Divergence),
    SimultaneousConvergence(Convergence),
    JumpStep(JumpStep),
    #[serde(untagged)]
    Fbd(FbdObject),
}

impl SfcObject {
    pub fn frame(&self) -> &Frame {
        match self {
            SfcObject::Step(e) => &e.frame,
            SfcObject::Transition(e) => &e.frame,
            SfcObject::SelectionDivergence(e) | SfcObject::SimultaneousDivergence(e) => &e.frame,
            SfcObject::SelectionConvergence(e) | SfcObject::SimultaneousConvergence(e) => {
                &e.frame
            }
            SfcObject::JumpStep(e) => &e.frame,
            SfcObject::Fbd(e) => e.frame(),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            SfcObject::Step(_) => "step",
            SfcObject::Transition(_) => "transition",
            SfcObject::SelectionDivergence(_) => "selectionDivergence",
            SfcObject::SelectionConvergence(_) => "selectionConvergence",
            SfcObject::SimultaneousDivergence(_) => "simultaneousDivergence",
            SfcObject::SimultaneousConvergence(_) => "simultaneousConvergence",
            SfcObject::JumpStep(_) => "jumpStep",
            SfcObject::Fbd(e) => e.tag(),
        }
    }
}

/// A call of a function or function block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(flatten)]
    pub frame: Frame,
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_order_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_variables: Vec<BlockVariable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub in_out_variables: Vec<BlockVariable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_variables: Vec<BlockVariable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

impl Block {
    pub fn new(frame: Frame, type_name: impl Into<String>) -> Self {
        Self {
            frame,
            type_name: type_name.into(),
            instance_name: None,
            execution_order_id: None,
            input_variables: Vec::new(),
            in_out_variables: Vec::new(),
            output_variables: Vec::new(),
            documentation: None,
        }
    }
}

/// A pin of a block, named by the formal parameter of the called POU.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockVariable {
    pub formal_parameter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge: Option<EdgeModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_in: Option<ConnectionPointIn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_out: Option<ConnectionPointOut>,
}

impl BlockVariable {
    pub fn input(formal_parameter: impl Into<String>, connections: Vec<Connection>) -> Self {
        Self {
            formal_parameter: formal_parameter.into(),
            negated: None,
            edge: None,
            connection_point_in: Some(ConnectionPointIn::from(connections)),
            connection_point_out: None,
        }
    }

    pub fn output(formal_parameter: impl Into<String>) -> Self {
        Self {
            formal_parameter: formal_parameter.into(),
            negated: None,
            edge: None,
            connection_point_in: None,
            connection_point_out: Some(ConnectionPointOut::default()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionBlock {
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_in: Option<ConnectionPointIn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionBlockAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionBlockAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<ActionQualifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator: Option<String>,
    #[serde(flatten)]
    pub source: BodyRef,
}

/// Exactly one of a named action or transition, or a body written in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BodyRef {
    #[serde(rename = "reference")]
    Reference(Reference),
    #[serde(rename = "inline")]
    Inline(Box<InlineBody>),
}

impl BodyRef {
    pub fn reference(name: impl Into<String>) -> Self {
        BodyRef::Reference(Reference { name: name.into() })
    }

    pub fn inline(name: Option<String>, body: Body) -> Self {
        BodyRef::Inline(Box::new(InlineBody { name, body }))
    }

    pub fn tag(&self) -> &'static str {
        match self {
            BodyRef::Reference(_) => "reference",
            BodyRef::Inline(_) => "inline",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InlineBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub body: Body,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(flatten)]
    pub frame: Frame,
    pub content: FormattedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

/// Sends the signal at its input to every continuation with the same name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    #[serde(flatten)]
    pub frame: Frame,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_in: Option<ConnectionPointIn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

/// Continues the signal of the connector with the same name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Continuation {
    #[serde(flatten)]
    pub frame: Frame,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_out: Option<ConnectionPointOut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

/// Reads an expression into the diagram.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InVariable {
    #[serde(flatten)]
    pub frame: Frame,
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge: Option<EdgeModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_order_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_out: Option<ConnectionPointOut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

impl InVariable {
    pub fn new(frame: Frame, expression: impl Into<String>) -> Self {
        Self {
            frame,
            expression: expression.into(),
            negated: None,
            edge: None,
            storage: None,
            execution_order_id: None,
            connection_point_out: Some(ConnectionPointOut::default()),
            documentation: None,
        }
    }
}

/// Writes the signal at its input to an expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutVariable {
    #[serde(flatten)]
    pub frame: Frame,
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge: Option<EdgeModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_order_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_in: Option<ConnectionPointIn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

impl OutVariable {
    pub fn new(frame: Frame, expression: impl Into<String>, connections: Vec<Connection>) -> Self {
        Self {
            frame,
            expression: expression.into(),
            negated: None,
            edge: None,
            storage: None,
            execution_order_id: None,
            connection_point_in: Some(ConnectionPointIn::from(connections)),
            documentation: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InOutVariable {
    #[serde(flatten)]
    pub frame: Frame,
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge: Option<EdgeModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_order_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_in: Option<ConnectionPointIn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_out: Option<ConnectionPointOut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Jump {
    #[serde(flatten)]
    pub frame: Frame,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_in: Option<ConnectionPointIn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Label {
    #[serde(flatten)]
    pub frame: Frame,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Return {
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_in: Option<ConnectionPointIn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(flatten)]
    pub frame: Frame,
    pub variable: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge: Option<EdgeModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_in: Option<ConnectionPointIn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_out: Option<ConnectionPointOut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coil {
    #[serde(flatten)]
    pub frame: Frame,
    pub variable: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge: Option<EdgeModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_in: Option<ConnectionPointIn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_out: Option<ConnectionPointOut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeftPowerRail {
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connection_points_out: Vec<ConnectionPointOut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RightPowerRail {
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connection_points_in: Vec<ConnectionPointIn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(flatten)]
    pub frame: Frame,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_step: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_in: Option<ConnectionPointIn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_out: Option<ConnectionPointOut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_out_action: Option<ConnectionPointOut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

impl Step {
    pub fn new(frame: Frame, name: impl Into<String>) -> Self {
        Self {
            frame,
            name: name.into(),
            initial_step: None,
            connection_point_in: None,
            connection_point_out: None,
            connection_point_out_action: None,
            documentation: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SfcTransition {
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_in: Option<ConnectionPointIn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_out: Option<ConnectionPointOut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<BodyRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

/// One input branching into several outputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Divergence {
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_in: Option<ConnectionPointIn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connection_points_out: Vec<ConnectionPointOut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

/// Several inputs joined into one output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Convergence {
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connection_points_in: Vec<ConnectionPointIn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_out: Option<ConnectionPointOut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpStep {
    #[serde(flatten)]
    pub frame: Frame,
    pub target_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_point_in: Option<ConnectionPointIn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_when_ld_holds_fbd_object_then_fbd_tag() {
        let element = LdObject::Fbd(FbdObject::Label(Label {
            frame: Frame::new(7),
            label: "End".to_string(),
            documentation: None,
        }));
        assert_eq!(element.tag(), "label");
        assert_eq!(element.frame().local_id, 7);
    }

    #[test]
    fn serialize_when_in_variable_then_frame_is_flattened() {
        let element = FbdObject::InVariable(InVariable::new(Frame::at(1, 10.0, 20.0), "a"));

        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["inVariable"]["localId"], 1);
        assert_eq!(json["inVariable"]["position"]["x"], 10.0);
        assert_eq!(json["inVariable"]["expression"], "a");
        assert!(json["inVariable"].get("width").is_none());
    }

    #[test]
    fn deserialize_when_sfc_holds_fbd_object_then_untagged_fbd() {
        let json = r#"[
            {"step":{"localId":1,"name":"Init","initialStep":true}},
            {"inVariable":{"localId":2,"expression":"start"}}
        ]"#;

        let elements: Vec<SfcObject> = serde_json::from_str(json).unwrap();

        assert_eq!(elements[0].tag(), "step");
        assert!(matches!(&elements[1], SfcObject::Fbd(FbdObject::InVariable(v)) if v.expression == "start"));
    }

    #[test]
    fn serialize_when_action_with_reference_then_source_is_flattened() {
        let action = ActionBlockAction {
            qualifier: Some(ActionQualifier::N),
            duration: None,
            indicator: None,
            source: BodyRef::reference("Fill"),
        };

        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, r#"{"qualifier":"N","reference":{"name":"Fill"}}"#);
    }

    #[test]
    fn st_when_source_then_paragraph_markup() {
        let Body::St(text) = Body::st("x := 1;") else {
            panic!("expected ST body");
        };
        assert_eq!(text.markup(), "<xhtml:p>x := 1;</xhtml:p>");
    }
}
