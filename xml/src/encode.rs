//! PLCopen XML writer using the quick-xml event writer
//!
//! The output is deterministic: elements are written in schema order,
//! variable lists in the order of [`VarRole::ALL`], and absent optional
//! values are left out. Writing a document that was just read therefore
//! gives the same bytes each time.

use std::fmt::Display;

use log::debug;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use plcopen_model::*;

use crate::{TC6_NAMESPACE, XHTML_NAMESPACE};

type XmlWriter = Writer<Vec<u8>>;

trait ToXml {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlOptions {
    /// Number of spaces per nesting level, or `None` to write everything
    /// on one line.
    pub indent: Option<usize>,
    /// Writes the `<?xml ...?>` declaration.
    pub declaration: bool,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            indent: Some(2),
            declaration: true,
        }
    }
}

/// Validates the project and writes it as PLCopen XML.
pub fn to_string(project: &Project) -> Result<String, Error> {
    to_string_with_options(project, &XmlOptions::default())
}

pub fn to_string_with_options(project: &Project, options: &XmlOptions) -> Result<String, Error> {
    project.validate()?;

    let mut writer = match options.indent {
        Some(indent) => Writer::new_with_indent(Vec::new(), b' ', indent),
        None => Writer::new(Vec::new()),
    };
    if options.declaration {
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(write_error)?;
    }
    project.write_xml(&mut writer)?;

    let xml = String::from_utf8(writer.into_inner()).map_err(write_error)?;
    debug!("Wrote {} bytes of XML", xml.len());
    Ok(xml)
}

fn write_error<E: Display>(err: E) -> Error {
    Error::Write(err.to_string())
}

/// Attributes of a start tag. Absent optional values are skipped.
#[derive(Default)]
struct Attrs(Vec<(&'static str, String)>);

impl Attrs {
    fn new() -> Self {
        Self::default()
    }

    fn add(mut self, name: &'static str, value: impl Display) -> Self {
        self.0.push((name, value.to_string()));
        self
    }

    fn opt(self, name: &'static str, value: Option<impl Display>) -> Self {
        match value {
            Some(value) => self.add(name, value),
            None => self,
        }
    }
}

fn start_tag<'a>(tag_name: &'a str, attrs: &Attrs) -> BytesStart<'a> {
    let mut elem = BytesStart::new(tag_name);
    for (name, value) in attrs.0.iter() {
        let value = escape_attribute(value);
        elem.push_attribute((name.as_bytes(), value.as_bytes()));
    }
    elem
}

/// Escapes an attribute value. Tabs and line ends become character
/// references, otherwise a reader normalizes them to spaces.
fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in escape(value).chars() {
        match c {
            '\t' => escaped.push_str("&#9;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Escapes character data. A carriage return becomes a character reference,
/// otherwise a reader folds `\r\n` into `\n`.
fn escape_text(content: &str) -> String {
    escape(content).replace('\r', "&#13;")
}

fn write_tag_start(writer: &mut XmlWriter, tag_name: &str) -> Result<(), Error> {
    write_tag_start_with_attrs(writer, tag_name, &Attrs::new())
}

fn write_tag_start_with_attrs(
    writer: &mut XmlWriter,
    tag_name: &str,
    attrs: &Attrs,
) -> Result<(), Error> {
    writer
        .write_event(Event::Start(start_tag(tag_name, attrs)))
        .map_err(write_error)
}

fn write_tag_end(writer: &mut XmlWriter, tag_name: &str) -> Result<(), Error> {
    writer
        .write_event(Event::End(BytesEnd::new(tag_name)))
        .map_err(write_error)
}

fn write_empty(writer: &mut XmlWriter, tag_name: &str, attrs: &Attrs) -> Result<(), Error> {
    writer
        .write_event(Event::Empty(start_tag(tag_name, attrs)))
        .map_err(write_error)
}

/// Writes an element whose children are written by `children`. When
/// `has_children` is false the element is written as an empty tag and
/// `children` is not called.
fn write_element<F>(
    writer: &mut XmlWriter,
    tag_name: &str,
    attrs: &Attrs,
    has_children: bool,
    children: F,
) -> Result<(), Error>
where
    F: FnOnce(&mut XmlWriter) -> Result<(), Error>,
{
    if !has_children {
        return write_empty(writer, tag_name, attrs);
    }
    write_tag_start_with_attrs(writer, tag_name, attrs)?;
    children(writer)?;
    write_tag_end(writer, tag_name)
}

/// Writes an element holding escaped character data.
fn write_tag(writer: &mut XmlWriter, tag_name: &str, content: &str) -> Result<(), Error> {
    if content.is_empty() {
        return write_empty(writer, tag_name, &Attrs::new());
    }
    write_tag_start(writer, tag_name)?;
    writer
        .write_event(Event::Text(BytesText::from_escaped(escape_text(content))))
        .map_err(write_error)?;
    write_tag_end(writer, tag_name)
}

/// Writes an element holding formatted text. The markup is copied as is
/// once it is known to parse in place.
fn write_markup(writer: &mut XmlWriter, tag_name: &str, text: &FormattedText) -> Result<(), Error> {
    if text.is_empty() {
        return write_empty(writer, tag_name, &Attrs::new());
    }
    check_markup(tag_name, text)?;
    write_tag_start(writer, tag_name)?;
    writer
        .write_event(Event::Text(BytesText::from_escaped(text.markup())))
        .map_err(write_error)?;
    write_tag_end(writer, tag_name)
}

/// Parses the markup as the content of an element that binds the same
/// namespaces as the written root.
fn check_markup(tag_name: &str, text: &FormattedText) -> Result<(), Error> {
    let wrapped = format!(
        "<{tag} xmlns=\"{}\" xmlns:xhtml=\"{}\">{}</{tag}>",
        TC6_NAMESPACE,
        XHTML_NAMESPACE,
        text.markup(),
        tag = tag_name,
    );
    match roxmltree::Document::parse(&wrapped) {
        Ok(_) => Ok(()),
        Err(err) => Err(Error::Write(format!(
            "content of <{}> is not well-formed markup: {}",
            tag_name, err
        ))),
    }
}

fn write_documentation(
    writer: &mut XmlWriter,
    documentation: &Option<FormattedText>,
) -> Result<(), Error> {
    match documentation {
        Some(text) => write_markup(writer, "documentation", text),
        None => Ok(()),
    }
}

fn write_point(writer: &mut XmlWriter, tag_name: &str, point: &Point) -> Result<(), Error> {
    write_empty(
        writer,
        tag_name,
        &Attrs::new().add("x", point.x).add("y", point.y),
    )
}

impl ToXml for Project {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        let attrs = Attrs::new()
            .add("xmlns", TC6_NAMESPACE)
            .add("xmlns:xhtml", XHTML_NAMESPACE);
        write_tag_start_with_attrs(writer, "project", &attrs)?;

        self.file_header.write_xml(writer)?;
        self.content_header.write_xml(writer)?;
        if let Some(types) = &self.types {
            types.write_xml(writer)?;
        }
        if let Some(instances) = &self.instances {
            instances.write_xml(writer)?;
        }

        write_tag_end(writer, "project")
    }
}

impl ToXml for FileHeader {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        let attrs = Attrs::new()
            .add("companyName", &self.company_name)
            .opt("companyURL", self.company_url.as_ref())
            .add("productName", &self.product_name)
            .add("productVersion", &self.product_version)
            .opt("productRelease", self.product_release.as_ref())
            .add("creationDateTime", &self.creation_date_time)
            .opt("contentDescription", self.content_description.as_ref());
        write_empty(writer, "fileHeader", &attrs)
    }
}

impl ToXml for ContentHeader {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        let attrs = Attrs::new()
            .add("name", &self.name)
            .opt("version", self.version.as_ref())
            .opt("modificationDateTime", self.modification_date_time.as_ref())
            .opt("organization", self.organization.as_ref())
            .opt("author", self.author.as_ref())
            .opt("language", self.language.as_ref());
        let has_children = self.comment.is_some() || self.coordinate_info.is_some();

        write_element(writer, "contentHeader", &attrs, has_children, |writer| {
            if let Some(comment) = &self.comment {
                write_tag(writer, "Comment", comment)?;
            }
            if let Some(info) = &self.coordinate_info {
                info.write_xml(writer)?;
            }
            Ok(())
        })
    }
}

impl ToXml for CoordinateInfo {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        write_tag_start(writer, "coordinateInfo")?;
        if let Some(page_size) = &self.page_size {
            write_point(writer, "pageSize", page_size)?;
        }
        for (tag_name, scaling) in [("fbd", &self.fbd), ("ld", &self.ld), ("sfc", &self.sfc)] {
            write_tag_start(writer, tag_name)?;
            write_point(writer, "scaling", scaling)?;
            write_tag_end(writer, tag_name)?;
        }
        write_tag_end(writer, "coordinateInfo")
    }
}

impl ToXml for Types {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        write_tag_start(writer, "types")?;

        write_element(
            writer,
            "dataTypes",
            &Attrs::new(),
            !self.data_types.is_empty(),
            |writer| {
                for decl in self.data_types.iter() {
                    decl.write_xml(writer)?;
                }
                Ok(())
            },
        )?;
        write_element(writer, "pous", &Attrs::new(), !self.pous.is_empty(), |writer| {
            for pou in self.pous.iter() {
                pou.write_xml(writer)?;
            }
            Ok(())
        })?;

        write_tag_end(writer, "types")
    }
}

impl ToXml for DataTypeDecl {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        write_tag_start_with_attrs(writer, "dataType", &Attrs::new().add("name", &self.name))?;
        write_data_type(writer, "baseType", &self.base_type)?;
        if let Some(value) = &self.initial_value {
            write_value(writer, "initialValue", &Attrs::new(), value)?;
        }
        write_documentation(writer, &self.documentation)?;
        write_tag_end(writer, "dataType")
    }
}

/// Writes `data_type` as the single child of a container element.
fn write_data_type(writer: &mut XmlWriter, container: &str, data_type: &DataType) -> Result<(), Error> {
    write_tag_start(writer, container)?;
    data_type.write_xml(writer)?;
    write_tag_end(writer, container)
}

impl ToXml for DataType {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        let tag_name = self.tag();
        match self {
            DataType::String(string) | DataType::WString(string) => write_empty(
                writer,
                tag_name,
                &Attrs::new().opt("length", string.length),
            ),
            DataType::Derived(derived) => {
                write_empty(writer, tag_name, &Attrs::new().add("name", &derived.name))
            }
            DataType::Array(array) => {
                write_tag_start(writer, tag_name)?;
                for dimension in array.dimensions.iter() {
                    write_range(writer, "dimension", dimension.lower, dimension.upper)?;
                }
                write_data_type(writer, "baseType", &array.base_type)?;
                write_tag_end(writer, tag_name)
            }
            DataType::Enum(enumeration) => {
                write_tag_start(writer, tag_name)?;
                write_element(
                    writer,
                    "values",
                    &Attrs::new(),
                    !enumeration.values.is_empty(),
                    |writer| {
                        for value in enumeration.values.iter() {
                            write_element(
                                writer,
                                "value",
                                &Attrs::new().add("name", &value.name),
                                value.documentation.is_some(),
                                |writer| write_documentation(writer, &value.documentation),
                            )?;
                        }
                        Ok(())
                    },
                )?;
                if let Some(base_type) = &enumeration.base_type {
                    write_data_type(writer, "baseType", base_type)?;
                }
                write_tag_end(writer, tag_name)
            }
            DataType::Pointer(pointer) => {
                write_tag_start(writer, tag_name)?;
                write_data_type(writer, "baseType", &pointer.base_type)?;
                write_tag_end(writer, tag_name)
            }
            DataType::Struct(structure) => {
                let has_children =
                    !structure.variables.is_empty() || structure.documentation.is_some();
                write_element(writer, tag_name, &Attrs::new(), has_children, |writer| {
                    for variable in structure.variables.iter() {
                        variable.write_xml(writer)?;
                    }
                    write_documentation(writer, &structure.documentation)
                })
            }
            DataType::SubrangeSigned(subrange) => {
                write_tag_start(writer, tag_name)?;
                write_range(writer, "range", subrange.range.lower, subrange.range.upper)?;
                write_data_type(writer, "baseType", &subrange.base_type)?;
                write_tag_end(writer, tag_name)
            }
            DataType::SubrangeUnsigned(subrange) => {
                write_tag_start(writer, tag_name)?;
                write_range(writer, "range", subrange.range.lower, subrange.range.upper)?;
                write_data_type(writer, "baseType", &subrange.base_type)?;
                write_tag_end(writer, tag_name)
            }
            _ => write_empty(writer, tag_name, &Attrs::new()),
        }
    }
}

fn write_range(
    writer: &mut XmlWriter,
    tag_name: &str,
    lower: impl Display,
    upper: impl Display,
) -> Result<(), Error> {
    write_empty(
        writer,
        tag_name,
        &Attrs::new().add("lower", lower).add("upper", upper),
    )
}

/// Writes `value` as the single child of a container element.
fn write_value(
    writer: &mut XmlWriter,
    container: &str,
    attrs: &Attrs,
    value: &Value,
) -> Result<(), Error> {
    write_tag_start_with_attrs(writer, container, attrs)?;
    match value {
        Value::Simple(simple) => write_empty(
            writer,
            "simpleValue",
            &Attrs::new().add("value", &simple.value),
        )?,
        Value::Array(array) => {
            write_element(
                writer,
                "arrayValue",
                &Attrs::new(),
                !array.values.is_empty(),
                |writer| {
                    for element in array.values.iter() {
                        let attrs = Attrs::new().opt("repetitionValue", element.repetition_value);
                        write_value(writer, "value", &attrs, &element.value)?;
                    }
                    Ok(())
                },
            )?;
        }
        Value::Struct(structure) => {
            write_element(
                writer,
                "structValue",
                &Attrs::new(),
                !structure.values.is_empty(),
                |writer| {
                    for element in structure.values.iter() {
                        let attrs = Attrs::new().add("member", &element.member);
                        write_value(writer, "value", &attrs, &element.value)?;
                    }
                    Ok(())
                },
            )?;
        }
    }
    write_tag_end(writer, container)
}

impl ToXml for Pou {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        let attrs = Attrs::new()
            .add("name", &self.name)
            .add("pouType", self.pou_type);
        let has_children = self.interface.is_some()
            || !self.actions.is_empty()
            || !self.transitions.is_empty()
            || self.body.is_some()
            || self.documentation.is_some();

        write_element(writer, "pou", &attrs, has_children, |writer| {
            if let Some(interface) = &self.interface {
                interface.write_xml(writer)?;
            }
            if !self.actions.is_empty() {
                write_tag_start(writer, "actions")?;
                for action in self.actions.iter() {
                    write_named_body(writer, "action", &action.name, &action.body, &action.documentation)?;
                }
                write_tag_end(writer, "actions")?;
            }
            if !self.transitions.is_empty() {
                write_tag_start(writer, "transitions")?;
                for transition in self.transitions.iter() {
                    write_named_body(
                        writer,
                        "transition",
                        &transition.name,
                        &transition.body,
                        &transition.documentation,
                    )?;
                }
                write_tag_end(writer, "transitions")?;
            }
            if let Some(body) = &self.body {
                write_body(writer, "body", &Attrs::new(), body)?;
            }
            write_documentation(writer, &self.documentation)
        })
    }
}

fn write_named_body(
    writer: &mut XmlWriter,
    tag_name: &str,
    name: &str,
    body: &Body,
    documentation: &Option<FormattedText>,
) -> Result<(), Error> {
    write_tag_start_with_attrs(writer, tag_name, &Attrs::new().add("name", name))?;
    write_body(writer, "body", &Attrs::new(), body)?;
    write_documentation(writer, documentation)?;
    write_tag_end(writer, tag_name)
}

impl ToXml for Interface {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        let has_children = self.return_type.is_some()
            || self.var_lists().next().is_some()
            || self.documentation.is_some();

        write_element(writer, "interface", &Attrs::new(), has_children, |writer| {
            if let Some(return_type) = &self.return_type {
                write_data_type(writer, "returnType", return_type)?;
            }
            for (role, list) in self.var_lists() {
                write_var_list(writer, role.as_str(), list)?;
            }
            write_documentation(writer, &self.documentation)
        })
    }
}

fn write_var_list(writer: &mut XmlWriter, tag_name: &str, list: &VarList) -> Result<(), Error> {
    let attrs = Attrs::new()
        .opt("name", list.name.as_ref())
        .opt("constant", list.constant)
        .opt("retain", list.retain)
        .opt("nonretain", list.nonretain)
        .opt("persistent", list.persistent);
    let has_children = !list.variables.is_empty() || list.documentation.is_some();

    write_element(writer, tag_name, &attrs, has_children, |writer| {
        for variable in list.variables.iter() {
            variable.write_xml(writer)?;
        }
        write_documentation(writer, &list.documentation)
    })
}

impl ToXml for Variable {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        let attrs = Attrs::new()
            .add("name", &self.name)
            .opt("address", self.address.as_ref());
        write_tag_start_with_attrs(writer, "variable", &attrs)?;
        write_data_type(writer, "type", &self.var_type)?;
        if let Some(value) = &self.initial_value {
            write_value(writer, "initialValue", &Attrs::new(), value)?;
        }
        write_documentation(writer, &self.documentation)?;
        write_tag_end(writer, "variable")
    }
}

/// Writes `body` as the single child of a container element.
fn write_body(writer: &mut XmlWriter, container: &str, attrs: &Attrs, body: &Body) -> Result<(), Error> {
    write_tag_start_with_attrs(writer, container, attrs)?;
    let tag_name = body.tag();
    match body {
        Body::Il(text) | Body::St(text) => write_markup(writer, tag_name, text)?,
        Body::Fbd(fbd) => {
            write_element(writer, tag_name, &Attrs::new(), !fbd.elements.is_empty(), |writer| {
                for element in fbd.elements.iter() {
                    element.write_xml(writer)?;
                }
                Ok(())
            })?;
        }
        Body::Ld(ld) => {
            write_element(writer, tag_name, &Attrs::new(), !ld.elements.is_empty(), |writer| {
                for element in ld.elements.iter() {
                    element.write_xml(writer)?;
                }
                Ok(())
            })?;
        }
        Body::Sfc(sfc) => {
            write_element(writer, tag_name, &Attrs::new(), !sfc.elements.is_empty(), |writer| {
                for element in sfc.elements.iter() {
                    element.write_xml(writer)?;
                }
                Ok(())
            })?;
        }
    }
    write_tag_end(writer, container)
}

fn frame_attrs(frame: &Frame) -> Attrs {
    Attrs::new()
        .add("localId", frame.local_id)
        .opt("width", frame.width)
        .opt("height", frame.height)
}

fn write_position(writer: &mut XmlWriter, frame: &Frame) -> Result<(), Error> {
    match &frame.position {
        Some(position) => write_point(writer, "position", position),
        None => Ok(()),
    }
}

fn write_connection_point_in(
    writer: &mut XmlWriter,
    tag_name: &str,
    point: &ConnectionPointIn,
) -> Result<(), Error> {
    let has_children = point.rel_position.is_some() || !point.connections.is_empty();
    write_element(writer, tag_name, &Attrs::new(), has_children, |writer| {
        if let Some(rel_position) = &point.rel_position {
            write_point(writer, "relPosition", rel_position)?;
        }
        for connection in point.connections.iter() {
            let attrs = Attrs::new()
                .add("refLocalId", connection.ref_local_id)
                .opt("formalParameter", connection.formal_parameter.as_ref());
            write_element(
                writer,
                "connection",
                &attrs,
                !connection.positions.is_empty(),
                |writer| {
                    for position in connection.positions.iter() {
                        write_point(writer, "position", position)?;
                    }
                    Ok(())
                },
            )?;
        }
        Ok(())
    })
}

fn write_connection_point_out(
    writer: &mut XmlWriter,
    tag_name: &str,
    point: &ConnectionPointOut,
) -> Result<(), Error> {
    let attrs = Attrs::new().opt("formalParameter", point.formal_parameter.as_ref());
    write_element(writer, tag_name, &attrs, point.rel_position.is_some(), |writer| {
        match &point.rel_position {
            Some(rel_position) => write_point(writer, "relPosition", rel_position),
            None => Ok(()),
        }
    })
}

fn write_opt_in(writer: &mut XmlWriter, point: &Option<ConnectionPointIn>) -> Result<(), Error> {
    match point {
        Some(point) => write_connection_point_in(writer, "connectionPointIn", point),
        None => Ok(()),
    }
}

fn write_opt_out(writer: &mut XmlWriter, point: &Option<ConnectionPointOut>) -> Result<(), Error> {
    match point {
        Some(point) => write_connection_point_out(writer, "connectionPointOut", point),
        None => Ok(()),
    }
}

/// Writes a graphical element: the frame attributes followed by `attrs`,
/// then `position`, the children written by `children` and
/// `documentation`.
fn write_graphical<F>(
    writer: &mut XmlWriter,
    tag_name: &str,
    frame: &Frame,
    attrs: Attrs,
    documentation: &Option<FormattedText>,
    has_children: bool,
    children: F,
) -> Result<(), Error>
where
    F: FnOnce(&mut XmlWriter) -> Result<(), Error>,
{
    let mut all = frame_attrs(frame);
    all.0.extend(attrs.0);
    let has_children = has_children || frame.position.is_some() || documentation.is_some();

    write_element(writer, tag_name, &all, has_children, |writer| {
        write_position(writer, frame)?;
        children(writer)?;
        write_documentation(writer, documentation)
    })
}

fn modifier_attrs(
    attrs: Attrs,
    negated: Option<bool>,
    edge: Option<EdgeModifier>,
    storage: Option<StorageModifier>,
) -> Attrs {
    attrs
        .opt("negated", negated)
        .opt("edge", edge)
        .opt("storage", storage)
}

impl ToXml for FbdObject {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        let tag_name = self.tag();
        match self {
            FbdObject::Block(block) => {
                let attrs = Attrs::new()
                    .add("typeName", &block.type_name)
                    .opt("instanceName", block.instance_name.as_ref())
                    .opt("executionOrderId", block.execution_order_id);
                write_graphical(writer, tag_name, &block.frame, attrs, &block.documentation, true, |writer| {
                    write_block_variables(writer, "inputVariables", &block.input_variables)?;
                    write_block_variables(writer, "inOutVariables", &block.in_out_variables)?;
                    write_block_variables(writer, "outputVariables", &block.output_variables)
                })
            }
            FbdObject::ActionBlock(block) => {
                let has_children = block.connection_point_in.is_some() || !block.actions.is_empty();
                write_graphical(
                    writer,
                    tag_name,
                    &block.frame,
                    Attrs::new(),
                    &block.documentation,
                    has_children,
                    |writer| {
                        write_opt_in(writer, &block.connection_point_in)?;
                        for action in block.actions.iter() {
                            let attrs = Attrs::new()
                                .opt("qualifier", action.qualifier)
                                .opt("duration", action.duration.as_ref())
                                .opt("indicator", action.indicator.as_ref());
                            write_body_ref(writer, "action", attrs, &action.source)?;
                        }
                        Ok(())
                    },
                )
            }
            FbdObject::Comment(comment) => write_graphical(
                writer,
                tag_name,
                &comment.frame,
                Attrs::new(),
                &comment.documentation,
                true,
                |writer| write_markup(writer, "content", &comment.content),
            ),
            FbdObject::Connector(connector) => write_graphical(
                writer,
                tag_name,
                &connector.frame,
                Attrs::new().add("name", &connector.name),
                &connector.documentation,
                connector.connection_point_in.is_some(),
                |writer| write_opt_in(writer, &connector.connection_point_in),
            ),
            FbdObject::Continuation(continuation) => write_graphical(
                writer,
                tag_name,
                &continuation.frame,
                Attrs::new().add("name", &continuation.name),
                &continuation.documentation,
                continuation.connection_point_out.is_some(),
                |writer| write_opt_out(writer, &continuation.connection_point_out),
            ),
            FbdObject::InVariable(variable) => {
                let attrs = modifier_attrs(Attrs::new(), variable.negated, variable.edge, variable.storage)
                    .opt("executionOrderId", variable.execution_order_id);
                write_graphical(writer, tag_name, &variable.frame, attrs, &variable.documentation, true, |writer| {
                    write_opt_out(writer, &variable.connection_point_out)?;
                    write_tag(writer, "expression", &variable.expression)
                })
            }
            FbdObject::OutVariable(variable) => {
                let attrs = modifier_attrs(Attrs::new(), variable.negated, variable.edge, variable.storage)
                    .opt("executionOrderId", variable.execution_order_id);
                write_graphical(writer, tag_name, &variable.frame, attrs, &variable.documentation, true, |writer| {
                    write_opt_in(writer, &variable.connection_point_in)?;
                    write_tag(writer, "expression", &variable.expression)
                })
            }
            FbdObject::InOutVariable(variable) => {
                let attrs = modifier_attrs(Attrs::new(), variable.negated, variable.edge, variable.storage)
                    .opt("executionOrderId", variable.execution_order_id);
                write_graphical(writer, tag_name, &variable.frame, attrs, &variable.documentation, true, |writer| {
                    write_opt_in(writer, &variable.connection_point_in)?;
                    write_opt_out(writer, &variable.connection_point_out)?;
                    write_tag(writer, "expression", &variable.expression)
                })
            }
            FbdObject::Jump(jump) => write_graphical(
                writer,
                tag_name,
                &jump.frame,
                Attrs::new().add("label", &jump.label),
                &jump.documentation,
                jump.connection_point_in.is_some(),
                |writer| write_opt_in(writer, &jump.connection_point_in),
            ),
            FbdObject::Label(label) => write_graphical(
                writer,
                tag_name,
                &label.frame,
                Attrs::new().add("label", &label.label),
                &label.documentation,
                false,
                |_| Ok(()),
            ),
            FbdObject::Return(ret) => write_graphical(
                writer,
                tag_name,
                &ret.frame,
                Attrs::new(),
                &ret.documentation,
                ret.connection_point_in.is_some(),
                |writer| write_opt_in(writer, &ret.connection_point_in),
            ),
        }
    }
}

fn write_block_variables(
    writer: &mut XmlWriter,
    tag_name: &str,
    pins: &[BlockVariable],
) -> Result<(), Error> {
    write_element(writer, tag_name, &Attrs::new(), !pins.is_empty(), |writer| {
        for pin in pins.iter() {
            let attrs = Attrs::new()
                .add("formalParameter", &pin.formal_parameter)
                .opt("negated", pin.negated)
                .opt("edge", pin.edge);
            let has_children =
                pin.connection_point_in.is_some() || pin.connection_point_out.is_some();
            write_element(writer, "variable", &attrs, has_children, |writer| {
                write_opt_in(writer, &pin.connection_point_in)?;
                write_opt_out(writer, &pin.connection_point_out)
            })?;
        }
        Ok(())
    })
}

/// Writes a reference to a named body or an inline body as the single
/// child of a container element.
fn write_body_ref(
    writer: &mut XmlWriter,
    container: &str,
    attrs: Attrs,
    source: &BodyRef,
) -> Result<(), Error> {
    write_tag_start_with_attrs(writer, container, &attrs)?;
    match source {
        BodyRef::Reference(reference) => write_empty(
            writer,
            "reference",
            &Attrs::new().add("name", &reference.name),
        )?,
        BodyRef::Inline(inline) => write_body(
            writer,
            "inline",
            &Attrs::new().opt("name", inline.name.as_ref()),
            &inline.body,
        )?,
    }
    write_tag_end(writer, container)
}

impl ToXml for LdObject {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        let tag_name = self.tag();
        match self {
            LdObject::Contact(contact) => {
                let attrs = modifier_attrs(Attrs::new(), contact.negated, contact.edge, contact.storage);
                write_graphical(writer, tag_name, &contact.frame, attrs, &contact.documentation, true, |writer| {
                    write_opt_in(writer, &contact.connection_point_in)?;
                    write_opt_out(writer, &contact.connection_point_out)?;
                    write_tag(writer, "variable", &contact.variable)
                })
            }
            LdObject::Coil(coil) => {
                let attrs = modifier_attrs(Attrs::new(), coil.negated, coil.edge, coil.storage);
                write_graphical(writer, tag_name, &coil.frame, attrs, &coil.documentation, true, |writer| {
                    write_opt_in(writer, &coil.connection_point_in)?;
                    write_opt_out(writer, &coil.connection_point_out)?;
                    write_tag(writer, "variable", &coil.variable)
                })
            }
            LdObject::LeftPowerRail(rail) => write_graphical(
                writer,
                tag_name,
                &rail.frame,
                Attrs::new(),
                &rail.documentation,
                !rail.connection_points_out.is_empty(),
                |writer| {
                    for point in rail.connection_points_out.iter() {
                        write_connection_point_out(writer, "connectionPointOut", point)?;
                    }
                    Ok(())
                },
            ),
            LdObject::RightPowerRail(rail) => write_graphical(
                writer,
                tag_name,
                &rail.frame,
                Attrs::new(),
                &rail.documentation,
                !rail.connection_points_in.is_empty(),
                |writer| {
                    for point in rail.connection_points_in.iter() {
                        write_connection_point_in(writer, "connectionPointIn", point)?;
                    }
                    Ok(())
                },
            ),
            LdObject::Fbd(element) => element.write_xml(writer),
        }
    }
}

impl ToXml for SfcObject {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        let tag_name = self.tag();
        match self {
            SfcObject::Step(step) => {
                let attrs = Attrs::new()
                    .add("name", &step.name)
                    .opt("initialStep", step.initial_step);
                let has_children = step.connection_point_in.is_some()
                    || step.connection_point_out.is_some()
                    || step.connection_point_out_action.is_some();
                write_graphical(writer, tag_name, &step.frame, attrs, &step.documentation, has_children, |writer| {
                    write_opt_in(writer, &step.connection_point_in)?;
                    write_opt_out(writer, &step.connection_point_out)?;
                    match &step.connection_point_out_action {
                        Some(point) => {
                            write_connection_point_out(writer, "connectionPointOutAction", point)
                        }
                        None => Ok(()),
                    }
                })
            }
            SfcObject::Transition(transition) => {
                let attrs = Attrs::new().opt("priority", transition.priority);
                let has_children = transition.connection_point_in.is_some()
                    || transition.connection_point_out.is_some()
                    || transition.condition.is_some();
                write_graphical(
                    writer,
                    tag_name,
                    &transition.frame,
                    attrs,
                    &transition.documentation,
                    has_children,
                    |writer| {
                        write_opt_in(writer, &transition.connection_point_in)?;
                        write_opt_out(writer, &transition.connection_point_out)?;
                        match &transition.condition {
                            Some(condition) => {
                                write_body_ref(writer, "condition", Attrs::new(), condition)
                            }
                            None => Ok(()),
                        }
                    },
                )
            }
            SfcObject::SelectionDivergence(divergence)
            | SfcObject::SimultaneousDivergence(divergence) => {
                let has_children = divergence.connection_point_in.is_some()
                    || !divergence.connection_points_out.is_empty();
                write_graphical(
                    writer,
                    tag_name,
                    &divergence.frame,
                    Attrs::new(),
                    &divergence.documentation,
                    has_children,
                    |writer| {
                        write_opt_in(writer, &divergence.connection_point_in)?;
                        for point in divergence.connection_points_out.iter() {
                            write_connection_point_out(writer, "connectionPointOut", point)?;
                        }
                        Ok(())
                    },
                )
            }
            SfcObject::SelectionConvergence(convergence)
            | SfcObject::SimultaneousConvergence(convergence) => {
                let has_children = !convergence.connection_points_in.is_empty()
                    || convergence.connection_point_out.is_some();
                write_graphical(
                    writer,
                    tag_name,
                    &convergence.frame,
                    Attrs::new(),
                    &convergence.documentation,
                    has_children,
                    |writer| {
                        for point in convergence.connection_points_in.iter() {
                            write_connection_point_in(writer, "connectionPointIn", point)?;
                        }
                        write_opt_out(writer, &convergence.connection_point_out)
                    },
                )
            }
            SfcObject::JumpStep(jump) => write_graphical(
                writer,
                tag_name,
                &jump.frame,
                Attrs::new().add("targetName", &jump.target_name),
                &jump.documentation,
                jump.connection_point_in.is_some(),
                |writer| write_opt_in(writer, &jump.connection_point_in),
            ),
            SfcObject::Fbd(element) => element.write_xml(writer),
        }
    }
}

impl ToXml for Instances {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        write_tag_start(writer, "instances")?;
        write_element(
            writer,
            "configurations",
            &Attrs::new(),
            !self.configurations.is_empty(),
            |writer| {
                for configuration in self.configurations.iter() {
                    configuration.write_xml(writer)?;
                }
                Ok(())
            },
        )?;
        write_tag_end(writer, "instances")
    }
}

impl ToXml for Configuration {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        let has_children = !self.resources.is_empty()
            || self.global_vars.is_some()
            || self.documentation.is_some();
        let attrs = Attrs::new().add("name", &self.name);

        write_element(writer, "configuration", &attrs, has_children, |writer| {
            for resource in self.resources.iter() {
                resource.write_xml(writer)?;
            }
            if let Some(list) = &self.global_vars {
                write_var_list(writer, "globalVars", list)?;
            }
            write_documentation(writer, &self.documentation)
        })
    }
}

impl ToXml for Resource {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        let has_children = !self.tasks.is_empty()
            || self.global_vars.is_some()
            || !self.pou_instances.is_empty()
            || self.documentation.is_some();
        let attrs = Attrs::new().add("name", &self.name);

        write_element(writer, "resource", &attrs, has_children, |writer| {
            for task in self.tasks.iter() {
                task.write_xml(writer)?;
            }
            if let Some(list) = &self.global_vars {
                write_var_list(writer, "globalVars", list)?;
            }
            for instance in self.pou_instances.iter() {
                instance.write_xml(writer)?;
            }
            write_documentation(writer, &self.documentation)
        })
    }
}

impl ToXml for Task {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        let attrs = Attrs::new()
            .add("name", &self.name)
            .add("priority", self.priority)
            .opt("interval", self.interval.as_ref())
            .opt("single", self.single.as_ref());

        write_element(writer, "task", &attrs, !self.pou_instances.is_empty(), |writer| {
            for instance in self.pou_instances.iter() {
                instance.write_xml(writer)?;
            }
            Ok(())
        })
    }
}

impl ToXml for PouInstance {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<(), Error> {
        let attrs = Attrs::new()
            .add("name", &self.name)
            .add("type", &self.type_name);
        write_element(
            writer,
            "pouInstance",
            &attrs,
            self.documentation.is_some(),
            |writer| write_documentation(writer, &self.documentation),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::from_str;
    use plcopen_test::read_shared_resource;

    fn header() -> FileHeader {
        let mut header = FileHeader::new("Acme", "Line Control", "1.0");
        header.creation_date_time = "2024-05-06T07:08:09Z".parse().unwrap();
        header
    }

    fn st_project() -> Project {
        let mut project = Project::new(header(), ContentHeader::new("Plant"));
        let mut pou = Pou::new("Main", PouType::Program);
        pou.body = Some(Body::st("x := 1;"));
        project.types_mut().pous.push(pou);
        project
    }

    #[test]
    fn to_string_when_st_program_then_canonical_text() {
        let xml = to_string(&st_project()).unwrap();

        let expected = r#"<?xml version="1.0" encoding="utf-8"?>
<project xmlns="http://www.plcopen.org/xml/tc6.xsd" xmlns:xhtml="http://www.w3.org/1999/xhtml">
  <fileHeader companyName="Acme" productName="Line Control" productVersion="1.0" creationDateTime="2024-05-06T07:08:09Z"/>
  <contentHeader name="Plant"/>
  <types>
    <dataTypes/>
    <pous>
      <pou name="Main" pouType="program">
        <body>
          <ST><xhtml:p>x := 1;</xhtml:p></ST>
        </body>
      </pou>
    </pous>
  </types>
</project>"#;
        assert_eq!(xml, expected);
    }

    #[test]
    fn to_string_when_no_declaration_and_no_indent_then_single_line() {
        let options = XmlOptions {
            indent: None,
            declaration: false,
        };
        let xml = to_string_with_options(&st_project(), &options).unwrap();

        assert!(xml.starts_with("<project "));
        assert!(!xml.contains('\n'));
    }

    #[test]
    fn to_string_when_invalid_then_error() {
        let mut project = st_project();
        project.types_mut().pous.push(Pou::new("Scale", PouType::Function));

        let err = to_string(&project).unwrap_err();
        assert!(matches!(err, Error::MissingReturnType { pou } if pou == "Scale"));
    }

    #[test]
    fn to_string_when_text_needs_escaping_then_escaped() {
        let mut project = st_project();
        project.content_header.comment = Some("a < b & c".to_string());

        let xml = to_string(&project).unwrap();
        assert!(xml.contains("<Comment>a &lt; b &amp; c</Comment>"));
        assert_eq!(from_str(&xml).unwrap(), project);
    }

    #[test]
    fn to_string_when_attribute_has_tab_and_line_end_then_restored() {
        let mut project = st_project();
        project.file_header.company_name = "Acme\tCorp\nLtd".to_string();
        project.file_header.product_name = "Line\r\nControl".to_string();

        let xml = to_string(&project).unwrap();
        assert!(xml.contains(r#"companyName="Acme&#9;Corp&#10;Ltd""#));
        assert!(xml.contains(r#"productName="Line&#13;&#10;Control""#));
        assert_eq!(from_str(&xml).unwrap(), project);
    }

    #[test]
    fn to_string_when_text_has_carriage_return_then_restored() {
        let mut project = st_project();
        project.content_header.comment = Some("line1\r\nline2".to_string());
        let mut pou = Pou::new("Lamp", PouType::FunctionBlock);
        pou.body = Some(Body::fbd(vec![FbdObject::InVariable(InVariable::new(
            Frame::new(1),
            "a\r\nb",
        ))]));
        project.types_mut().pous.push(pou);

        let xml = to_string(&project).unwrap();
        assert!(xml.contains("<Comment>line1&#13;\nline2</Comment>"));
        assert_eq!(from_str(&xml).unwrap(), project);
    }

    #[test]
    fn to_string_when_st_markup_not_well_formed_then_error() {
        let mut project = st_project();
        project.types_mut().pous[0].body = Some(Body::St(FormattedText::from_markup(
            "IF a < b THEN x := 1; END_IF;",
        )));

        let err = to_string(&project).unwrap_err();
        assert!(matches!(&err, Error::Write(message) if message.contains("<ST>")));
    }

    #[test]
    fn to_string_when_documentation_unclosed_then_error() {
        let mut project = st_project();
        project.types_mut().pous[0].documentation =
            Some(FormattedText::from_markup("<xhtml:p>open"));

        assert!(matches!(to_string(&project), Err(Error::Write(_))));
    }

    #[test]
    fn from_str_when_written_then_equal_project() {
        let mut project = st_project();
        let types = project.types_mut();
        types.data_types.push(DataTypeDecl::new(
            "T_RANGE",
            DataType::SubrangeSigned(Box::new(SubrangeSigned {
                range: RangeSigned::new(-10, 10),
                base_type: DataType::Int,
            })),
        ));
        types.data_types.push(DataTypeDecl::new(
            "T_COLOR",
            DataType::Enum(EnumType {
                values: vec![EnumValue::new("Red"), EnumValue::new("Green")],
                base_type: None,
            }),
        ));

        let mut scale = Pou::new("Scale", PouType::Function);
        let interface = scale.interface_mut();
        interface.return_type = Some(DataType::Real);
        interface.set_var_list(
            VarRole::Input,
            VarList::new(vec![Variable::new("raw", DataType::derived("T_RANGE"))]),
        );
        scale.body = Some(Body::fbd(vec![
            FbdObject::InVariable(InVariable::new(Frame::at(1, 10.0, 20.5), "raw")),
            FbdObject::OutVariable(OutVariable::new(
                Frame::new(2),
                "Scale",
                vec![Connection::to(1)],
            )),
        ]));
        types.pous.push(scale);

        let xml = to_string(&project).unwrap();
        let decoded = from_str(&xml).unwrap();
        assert_eq!(decoded, project);
    }

    #[test]
    fn to_string_when_decoded_fixture_then_stable_bytes() {
        for name in [
            "array_2d.xml",
            "fbd_and_block.xml",
            "sfc_inline_condition.xml",
            "full_project.xml",
        ] {
            let project = from_str(&read_shared_resource(name)).unwrap();

            let first = to_string(&project).unwrap();
            let second = to_string(&from_str(&first).unwrap()).unwrap();

            assert_eq!(first, second, "{}", name);
            assert_eq!(from_str(&first).unwrap(), project, "{}", name);
        }
    }

    #[test]
    fn to_string_when_optional_absent_then_attribute_absent() {
        let xml = to_string(&st_project()).unwrap();

        assert!(!xml.contains("companyURL"));
        assert!(!xml.contains("instances"));
        assert!(!xml.contains("interface"));
    }
}
