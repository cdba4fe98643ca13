//! PLCopen XML reader using roxmltree
//!
//! The document is parsed into a tree first and then walked once to build
//! the model. Every decode function receives the document path of the
//! element it reads so that errors can say where the problem is.
//!
//! Unknown child elements are rejected. Vendor data (`addData`,
//! `addDataInfo`) is skipped.

use std::fmt::Display;
use std::str::FromStr;

use log::{debug, trace};
use roxmltree::{Document, Node};

use plcopen_model::choice::Alternatives;
use plcopen_model::*;

use crate::ACCEPTED_NAMESPACES;

/// Reads and validates a PLCopen XML document.
pub fn from_str(xml: &str) -> Result<Project, Error> {
    let doc = Document::parse(xml)
        .map_err(|e| Error::malformed("document", format!("XML parse error: {}", e)))?;

    let root = doc.root_element();
    if root.tag_name().name() != "project" {
        return Err(Error::malformed(
            "document",
            format!(
                "expected root element 'project', found '{}'",
                root.tag_name().name()
            ),
        ));
    }
    match root.tag_name().namespace() {
        Some(namespace) if ACCEPTED_NAMESPACES.contains(&namespace) => {}
        namespace => {
            return Err(Error::malformed(
                "project",
                format!(
                    "unsupported namespace '{}'",
                    namespace.unwrap_or_default()
                ),
            ))
        }
    }

    let project = decode_project(root)?;
    project.validate()?;

    debug!("Read project '{}' from XML", project.content_header.name);
    Ok(project)
}

fn decode_project(node: Node) -> Result<Project, Error> {
    let path = "project";
    let mut file_header = None;
    let mut content_header = None;
    let mut types = None;
    let mut instances = None;

    for child in elements(node) {
        let tag = child.tag_name().name();
        // Paths below the root leave out `project`.
        let child_path = tag.to_string();
        match tag {
            "fileHeader" => set_once(&mut file_header, decode_file_header(child, &child_path)?, &child_path)?,
            "contentHeader" => set_once(
                &mut content_header,
                decode_content_header(child, &child_path)?,
                &child_path,
            )?,
            "types" => set_once(&mut types, decode_types(child, &child_path)?, &child_path)?,
            "instances" => set_once(&mut instances, decode_instances(child, &child_path)?, &child_path)?,
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(Project {
        file_header: required_element(file_header, "fileHeader", path)?,
        content_header: required_element(content_header, "contentHeader", path)?,
        types,
        instances,
    })
}

fn decode_file_header(node: Node, path: &str) -> Result<FileHeader, Error> {
    expect_no_children(node, path)?;
    Ok(FileHeader {
        company_name: required_string(node, "companyName", path)?,
        company_url: optional_string(node, "companyURL"),
        product_name: required_string(node, "productName", path)?,
        product_version: required_string(node, "productVersion", path)?,
        product_release: optional_string(node, "productRelease"),
        creation_date_time: required_attr(node, "creationDateTime", path)?,
        content_description: optional_string(node, "contentDescription"),
    })
}

fn decode_content_header(node: Node, path: &str) -> Result<ContentHeader, Error> {
    let mut header = ContentHeader {
        name: required_string(node, "name", path)?,
        version: optional_string(node, "version"),
        modification_date_time: optional_attr(node, "modificationDateTime", path)?,
        organization: optional_string(node, "organization"),
        author: optional_string(node, "author"),
        language: optional_string(node, "language"),
        comment: None,
        coordinate_info: None,
    };

    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "Comment" => set_once(&mut header.comment, text_content(child), &child_path)?,
            "coordinateInfo" => set_once(
                &mut header.coordinate_info,
                decode_coordinate_info(child, &child_path)?,
                &child_path,
            )?,
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(header)
}

fn decode_coordinate_info(node: Node, path: &str) -> Result<CoordinateInfo, Error> {
    let mut page_size = None;
    let mut fbd = None;
    let mut ld = None;
    let mut sfc = None;

    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "pageSize" => set_once(&mut page_size, decode_point(child, &child_path)?, &child_path)?,
            "fbd" => set_once(&mut fbd, decode_scaling(child, &child_path)?, &child_path)?,
            "ld" => set_once(&mut ld, decode_scaling(child, &child_path)?, &child_path)?,
            "sfc" => set_once(&mut sfc, decode_scaling(child, &child_path)?, &child_path)?,
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(CoordinateInfo {
        page_size,
        fbd: required_element(fbd, "fbd", path)?,
        ld: required_element(ld, "ld", path)?,
        sfc: required_element(sfc, "sfc", path)?,
    })
}

fn decode_scaling(node: Node, path: &str) -> Result<Point, Error> {
    let mut scaling = None;
    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "scaling" => set_once(&mut scaling, decode_point(child, &child_path)?, &child_path)?,
            _ => return Err(Error::unknown(path, tag)),
        }
    }
    required_element(scaling, "scaling", path)
}

fn decode_point(node: Node, path: &str) -> Result<Point, Error> {
    expect_no_children(node, path)?;
    Ok(Point {
        x: required_attr(node, "x", path)?,
        y: required_attr(node, "y", path)?,
    })
}

fn decode_types(node: Node, path: &str) -> Result<Types, Error> {
    let mut types = Types::default();

    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "dataTypes" => {
                for item in children_named(child, "dataType", &child_path)? {
                    let item_path = named_path(&child_path, item);
                    types.data_types.push(decode_data_type_decl(item, &item_path)?);
                }
            }
            "pous" => {
                for item in children_named(child, "pou", &child_path)? {
                    let item_path = named_path(&child_path, item);
                    types.pous.push(decode_pou(item, &item_path)?);
                }
            }
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(types)
}

fn decode_data_type_decl(node: Node, path: &str) -> Result<DataTypeDecl, Error> {
    let mut base_type = None;
    let mut initial_value = None;
    let mut documentation = None;

    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "baseType" => set_once(&mut base_type, decode_data_type(child, &child_path)?, &child_path)?,
            "initialValue" => {
                set_once(&mut initial_value, decode_value(child, &child_path)?, &child_path)?
            }
            "documentation" => set_once(&mut documentation, decode_markup(child), &child_path)?,
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(DataTypeDecl {
        name: required_string(node, "name", path)?,
        base_type: required_element(base_type, "baseType", path)?,
        initial_value,
        documentation,
    })
}

/// Reads the data type choice held by a container such as `baseType`,
/// `type` or `returnType`.
fn decode_data_type(node: Node, path: &str) -> Result<DataType, Error> {
    let mut choice = Alternatives::new(path);
    for child in elements(node) {
        let tag = child.tag_name().name();
        let data_type = decode_data_type_alternative(child, path)?;
        choice.push(tag, data_type);
    }
    choice.single()
}

fn decode_data_type_alternative(node: Node, container_path: &str) -> Result<DataType, Error> {
    let tag = node.tag_name().name();
    if let Some(elementary) = DataType::from_elementary_tag(tag) {
        return Ok(elementary);
    }

    let path = format!("{}/{}", container_path, tag);
    let path = path.as_str();
    let data_type = match tag {
        "string" => DataType::String(StringType {
            length: optional_attr(node, "length", path)?,
        }),
        "wstring" => DataType::WString(StringType {
            length: optional_attr(node, "length", path)?,
        }),
        "derived" => DataType::Derived(DerivedType {
            name: required_string(node, "name", path)?,
        }),
        "array" => DataType::Array(Box::new(decode_array(node, path)?)),
        "enum" => DataType::Enum(decode_enum(node, path)?),
        "pointer" => DataType::Pointer(Box::new(PointerType {
            base_type: decode_base_type_only(node, path)?,
        })),
        "struct" => {
            let (variables, documentation) = decode_variables(node, path)?;
            DataType::Struct(StructType {
                variables,
                documentation,
            })
        }
        "subrangeSigned" => {
            let (range, base_type) = decode_subrange(node, path, decode_range_signed)?;
            DataType::SubrangeSigned(Box::new(SubrangeSigned { range, base_type }))
        }
        "subrangeUnsigned" => {
            let (range, base_type) = decode_subrange(node, path, decode_range_unsigned)?;
            DataType::SubrangeUnsigned(Box::new(SubrangeUnsigned { range, base_type }))
        }
        _ => return Err(Error::unknown(container_path, tag)),
    };
    Ok(data_type)
}

fn decode_array(node: Node, path: &str) -> Result<ArrayType, Error> {
    let mut dimensions = vec![];
    let mut base_type = None;

    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "dimension" => dimensions.push(decode_range_signed(child, &child_path)?),
            "baseType" => set_once(&mut base_type, decode_data_type(child, &child_path)?, &child_path)?,
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(ArrayType {
        dimensions,
        base_type: required_element(base_type, "baseType", path)?,
    })
}

fn decode_enum(node: Node, path: &str) -> Result<EnumType, Error> {
    let mut values = None;
    let mut base_type = None;

    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "values" => {
                let mut items = vec![];
                for item in children_named(child, "value", &child_path)? {
                    let item_path = named_path(&child_path, item);
                    items.push(decode_enum_value(item, &item_path)?);
                }
                set_once(&mut values, items, &child_path)?;
            }
            "baseType" => set_once(
                &mut base_type,
                Box::new(decode_data_type(child, &child_path)?),
                &child_path,
            )?,
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(EnumType {
        values: required_element(values, "values", path)?,
        base_type,
    })
}

fn decode_enum_value(node: Node, path: &str) -> Result<EnumValue, Error> {
    let mut documentation = None;
    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "documentation" => set_once(&mut documentation, decode_markup(child), &child_path)?,
            _ => return Err(Error::unknown(path, tag)),
        }
    }
    Ok(EnumValue {
        name: required_string(node, "name", path)?,
        documentation,
    })
}

fn decode_base_type_only(node: Node, path: &str) -> Result<DataType, Error> {
    let mut base_type = None;
    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "baseType" => set_once(&mut base_type, decode_data_type(child, &child_path)?, &child_path)?,
            _ => return Err(Error::unknown(path, tag)),
        }
    }
    required_element(base_type, "baseType", path)
}

fn decode_subrange<'a, 'input, R>(
    node: Node<'a, 'input>,
    path: &str,
    decode_range: fn(Node<'a, 'input>, &str) -> Result<R, Error>,
) -> Result<(R, DataType), Error> {
    let mut range = None;
    let mut base_type = None;

    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "range" => set_once(&mut range, decode_range(child, &child_path)?, &child_path)?,
            "baseType" => set_once(&mut base_type, decode_data_type(child, &child_path)?, &child_path)?,
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok((
        required_element(range, "range", path)?,
        required_element(base_type, "baseType", path)?,
    ))
}

fn decode_range_signed(node: Node, path: &str) -> Result<RangeSigned, Error> {
    expect_no_children(node, path)?;
    Ok(RangeSigned {
        lower: required_attr(node, "lower", path)?,
        upper: required_attr(node, "upper", path)?,
    })
}

fn decode_range_unsigned(node: Node, path: &str) -> Result<RangeUnsigned, Error> {
    expect_no_children(node, path)?;
    Ok(RangeUnsigned {
        lower: required_attr(node, "lower", path)?,
        upper: required_attr(node, "upper", path)?,
    })
}

/// Reads the value choice held by a container such as `initialValue` or
/// an element of an array or structure value.
fn decode_value(node: Node, path: &str) -> Result<Value, Error> {
    let mut choice = Alternatives::new(path);
    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        let value = match tag {
            "simpleValue" => {
                expect_no_children(child, &child_path)?;
                Value::Simple(SimpleValue {
                    value: required_string(child, "value", &child_path)?,
                })
            }
            "arrayValue" => {
                let mut values = vec![];
                for item in children_named(child, "value", &child_path)? {
                    let item_path = format!("{}/value", child_path);
                    values.push(ArrayValueElement {
                        repetition_value: optional_attr(item, "repetitionValue", &item_path)?,
                        value: decode_value(item, &item_path)?,
                    });
                }
                Value::Array(ArrayValue { values })
            }
            "structValue" => {
                let mut values = vec![];
                for item in children_named(child, "value", &child_path)? {
                    let item_path = format!("{}/value", child_path);
                    values.push(StructValueElement {
                        member: required_string(item, "member", &item_path)?,
                        value: decode_value(item, &item_path)?,
                    });
                }
                Value::Struct(StructValue { values })
            }
            _ => return Err(Error::unknown(path, tag)),
        };
        choice.push(tag, value);
    }
    choice.single()
}

fn decode_pou(node: Node, path: &str) -> Result<Pou, Error> {
    trace!("Decoding {}", path);

    let mut pou = Pou::new(
        required_string(node, "name", path)?,
        required_token(node, "pouType", path, PouType::from_tag)?,
    );

    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "interface" => set_once(&mut pou.interface, decode_interface(child, &child_path)?, &child_path)?,
            "actions" => {
                for item in children_named(child, "action", &child_path)? {
                    let item_path = named_path(&child_path, item);
                    let (name, body, documentation) = decode_named_body(item, &item_path)?;
                    pou.actions.push(Action {
                        name,
                        body,
                        documentation,
                    });
                }
            }
            "transitions" => {
                for item in children_named(child, "transition", &child_path)? {
                    let item_path = named_path(&child_path, item);
                    let (name, body, documentation) = decode_named_body(item, &item_path)?;
                    pou.transitions.push(Transition {
                        name,
                        body,
                        documentation,
                    });
                }
            }
            "body" => set_once(&mut pou.body, decode_body(child, &child_path)?, &child_path)?,
            "documentation" => set_once(&mut pou.documentation, decode_markup(child), &child_path)?,
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(pou)
}

fn decode_named_body(
    node: Node,
    path: &str,
) -> Result<(String, Body, Option<FormattedText>), Error> {
    let mut body = None;
    let mut documentation = None;

    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "body" => set_once(&mut body, decode_body(child, &child_path)?, &child_path)?,
            "documentation" => set_once(&mut documentation, decode_markup(child), &child_path)?,
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok((
        required_string(node, "name", path)?,
        required_element(body, "body", path)?,
        documentation,
    ))
}

fn decode_interface(node: Node, path: &str) -> Result<Interface, Error> {
    let mut interface = Interface::default();

    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        if let Some(role) = VarRole::from_tag(tag) {
            let list = decode_var_list(child, &child_path)?;
            if interface.set_var_list(role, list).is_some() {
                return Err(Error::malformed(
                    child_path,
                    "variable list role declared more than once",
                ));
            }
            continue;
        }
        match tag {
            "returnType" => set_once(
                &mut interface.return_type,
                decode_data_type(child, &child_path)?,
                &child_path,
            )?,
            "documentation" => {
                set_once(&mut interface.documentation, decode_markup(child), &child_path)?
            }
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(interface)
}

fn decode_var_list(node: Node, path: &str) -> Result<VarList, Error> {
    let (variables, documentation) = decode_variables(node, path)?;
    Ok(VarList {
        name: optional_string(node, "name"),
        constant: optional_bool(node, "constant", path)?,
        retain: optional_bool(node, "retain", path)?,
        nonretain: optional_bool(node, "nonretain", path)?,
        persistent: optional_bool(node, "persistent", path)?,
        variables,
        documentation,
    })
}

/// Reads the `variable` children and the optional `documentation` of a
/// variable list or a structure.
fn decode_variables(
    node: Node,
    path: &str,
) -> Result<(Vec<Variable>, Option<FormattedText>), Error> {
    let mut variables = vec![];
    let mut documentation = None;

    for child in elements(node) {
        let tag = child.tag_name().name();
        match tag {
            "variable" => {
                let child_path = named_path(path, child);
                variables.push(decode_variable(child, &child_path)?);
            }
            "documentation" => {
                let child_path = format!("{}/{}", path, tag);
                set_once(&mut documentation, decode_markup(child), &child_path)?
            }
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok((variables, documentation))
}

fn decode_variable(node: Node, path: &str) -> Result<Variable, Error> {
    let mut var_type = None;
    let mut initial_value = None;
    let mut documentation = None;

    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "type" => set_once(&mut var_type, decode_data_type(child, &child_path)?, &child_path)?,
            "initialValue" => {
                set_once(&mut initial_value, decode_value(child, &child_path)?, &child_path)?
            }
            "documentation" => set_once(&mut documentation, decode_markup(child), &child_path)?,
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(Variable {
        name: required_string(node, "name", path)?,
        address: optional_string(node, "address"),
        var_type: required_element(var_type, "type", path)?,
        initial_value,
        documentation,
    })
}

/// Reads the body choice held by a container such as `body`, `inline` or
/// the inline condition of a transition.
fn decode_body(node: Node, path: &str) -> Result<Body, Error> {
    let mut choice = Alternatives::new(path);
    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        let body = match tag {
            "IL" => Body::Il(decode_markup(child)),
            "ST" => Body::St(decode_markup(child)),
            "FBD" => {
                let mut elements_of = vec![];
                for element in elements(child) {
                    let tag = element.tag_name().name();
                    let element_path = element_path(&child_path, element);
                    match decode_fbd_object(element, &element_path)? {
                        Some(object) => elements_of.push(object),
                        None => return Err(Error::unknown(&child_path, tag)),
                    }
                }
                Body::Fbd(Fbd {
                    elements: elements_of,
                })
            }
            "LD" => Body::Ld(Ld {
                elements: decode_ld_objects(child, &child_path)?,
            }),
            "SFC" => Body::Sfc(Sfc {
                elements: decode_sfc_objects(child, &child_path)?,
            }),
            "documentation" => {
                debug!("Skipped body documentation at {}", child_path);
                continue;
            }
            _ => return Err(Error::unknown(path, tag)),
        };
        choice.push(tag, body);
    }
    choice.single()
}

fn decode_ld_objects(node: Node, path: &str) -> Result<Vec<LdObject>, Error> {
    let mut objects = vec![];
    for element in elements(node) {
        let tag = element.tag_name().name();
        let element_path = element_path(path, element);
        let object = match tag {
            "contact" => {
                let (frame, variable, negated, edge, storage, cp_in, cp_out, documentation) =
                    decode_ld_variable(element, &element_path)?;
                LdObject::Contact(Contact {
                    frame,
                    variable,
                    negated,
                    edge,
                    storage,
                    connection_point_in: cp_in,
                    connection_point_out: cp_out,
                    documentation,
                })
            }
            "coil" => {
                let (frame, variable, negated, edge, storage, cp_in, cp_out, documentation) =
                    decode_ld_variable(element, &element_path)?;
                LdObject::Coil(Coil {
                    frame,
                    variable,
                    negated,
                    edge,
                    storage,
                    connection_point_in: cp_in,
                    connection_point_out: cp_out,
                    documentation,
                })
            }
            "leftPowerRail" => {
                let mut connection_points_out = vec![];
                let (frame, documentation) =
                    decode_element(element, &element_path, |child, path| {
                        match child.tag_name().name() {
                            "connectionPointOut" => connection_points_out
                                .push(decode_connection_point_out(child, path)?),
                            _ => return Ok(false),
                        }
                        Ok(true)
                    })?;
                LdObject::LeftPowerRail(LeftPowerRail {
                    frame,
                    connection_points_out,
                    documentation,
                })
            }
            "rightPowerRail" => {
                let mut connection_points_in = vec![];
                let (frame, documentation) =
                    decode_element(element, &element_path, |child, path| {
                        match child.tag_name().name() {
                            "connectionPointIn" => connection_points_in
                                .push(decode_connection_point_in(child, path)?),
                            _ => return Ok(false),
                        }
                        Ok(true)
                    })?;
                LdObject::RightPowerRail(RightPowerRail {
                    frame,
                    connection_points_in,
                    documentation,
                })
            }
            _ => match decode_fbd_object(element, &element_path)? {
                Some(object) => LdObject::Fbd(object),
                None => return Err(Error::unknown(path, tag)),
            },
        };
        objects.push(object);
    }
    Ok(objects)
}

type LdVariableParts = (
    Frame,
    String,
    Option<bool>,
    Option<EdgeModifier>,
    Option<StorageModifier>,
    Option<ConnectionPointIn>,
    Option<ConnectionPointOut>,
    Option<FormattedText>,
);

fn decode_ld_variable(node: Node, path: &str) -> Result<LdVariableParts, Error> {
    let mut variable = None;
    let mut cp_in = None;
    let mut cp_out = None;
    let (frame, documentation) = decode_element(node, path, |child, path| {
        match child.tag_name().name() {
            "variable" => set_once(&mut variable, text_content(child), path)?,
            "connectionPointIn" => {
                set_once(&mut cp_in, decode_connection_point_in(child, path)?, path)?
            }
            "connectionPointOut" => {
                set_once(&mut cp_out, decode_connection_point_out(child, path)?, path)?
            }
            _ => return Ok(false),
        }
        Ok(true)
    })?;

    Ok((
        frame,
        required_element(variable, "variable", path)?,
        optional_bool(node, "negated", path)?,
        optional_token(node, "edge", path, EdgeModifier::from_tag)?,
        optional_token(node, "storage", path, StorageModifier::from_tag)?,
        cp_in,
        cp_out,
        documentation,
    ))
}

fn decode_sfc_objects(node: Node, path: &str) -> Result<Vec<SfcObject>, Error> {
    let mut objects = vec![];
    for element in elements(node) {
        let tag = element.tag_name().name();
        let element_path = element_path(path, element);
        let object = match tag {
            "step" => SfcObject::Step(decode_step(element, &element_path)?),
            "transition" => SfcObject::Transition(decode_sfc_transition(element, &element_path)?),
            "selectionDivergence" => {
                SfcObject::SelectionDivergence(decode_divergence(element, &element_path)?)
            }
            "selectionConvergence" => {
                SfcObject::SelectionConvergence(decode_convergence(element, &element_path)?)
            }
            "simultaneousDivergence" => {
                SfcObject::SimultaneousDivergence(decode_divergence(element, &element_path)?)
            }
            "simultaneousConvergence" => {
                SfcObject::SimultaneousConvergence(decode_convergence(element, &element_path)?)
            }
            "jumpStep" => {
                let mut cp_in = None;
                let (frame, documentation) =
                    decode_element(element, &element_path, |child, path| {
                        match child.tag_name().name() {
                            "connectionPointIn" => {
                                set_once(&mut cp_in, decode_connection_point_in(child, path)?, path)?
                            }
                            _ => return Ok(false),
                        }
                        Ok(true)
                    })?;
                SfcObject::JumpStep(JumpStep {
                    frame,
                    target_name: required_string(element, "targetName", &element_path)?,
                    connection_point_in: cp_in,
                    documentation,
                })
            }
            _ => match decode_fbd_object(element, &element_path)? {
                Some(object) => SfcObject::Fbd(object),
                None => return Err(Error::unknown(path, tag)),
            },
        };
        objects.push(object);
    }
    Ok(objects)
}

fn decode_step(node: Node, path: &str) -> Result<Step, Error> {
    let mut cp_in = None;
    let mut cp_out = None;
    let mut cp_out_action = None;
    let (frame, documentation) = decode_element(node, path, |child, path| {
        match child.tag_name().name() {
            "connectionPointIn" => {
                set_once(&mut cp_in, decode_connection_point_in(child, path)?, path)?
            }
            "connectionPointOut" => {
                set_once(&mut cp_out, decode_connection_point_out(child, path)?, path)?
            }
            "connectionPointOutAction" => set_once(
                &mut cp_out_action,
                decode_connection_point_out(child, path)?,
                path,
            )?,
            _ => return Ok(false),
        }
        Ok(true)
    })?;

    Ok(Step {
        frame,
        name: required_string(node, "name", path)?,
        initial_step: optional_bool(node, "initialStep", path)?,
        connection_point_in: cp_in,
        connection_point_out: cp_out,
        connection_point_out_action: cp_out_action,
        documentation,
    })
}

fn decode_sfc_transition(node: Node, path: &str) -> Result<SfcTransition, Error> {
    let mut cp_in = None;
    let mut cp_out = None;
    let mut condition = None;
    let (frame, documentation) = decode_element(node, path, |child, path| {
        match child.tag_name().name() {
            "connectionPointIn" => {
                set_once(&mut cp_in, decode_connection_point_in(child, path)?, path)?
            }
            "connectionPointOut" => {
                set_once(&mut cp_out, decode_connection_point_out(child, path)?, path)?
            }
            "condition" => set_once(&mut condition, decode_body_ref(child, path)?, path)?,
            _ => return Ok(false),
        }
        Ok(true)
    })?;

    Ok(SfcTransition {
        frame,
        priority: optional_attr(node, "priority", path)?,
        connection_point_in: cp_in,
        connection_point_out: cp_out,
        condition,
        documentation,
    })
}

fn decode_divergence(node: Node, path: &str) -> Result<Divergence, Error> {
    let mut cp_in = None;
    let mut cp_outs = vec![];
    let (frame, documentation) = decode_element(node, path, |child, path| {
        match child.tag_name().name() {
            "connectionPointIn" => {
                set_once(&mut cp_in, decode_connection_point_in(child, path)?, path)?
            }
            "connectionPointOut" => cp_outs.push(decode_connection_point_out(child, path)?),
            _ => return Ok(false),
        }
        Ok(true)
    })?;

    Ok(Divergence {
        frame,
        connection_point_in: cp_in,
        connection_points_out: cp_outs,
        documentation,
    })
}

fn decode_convergence(node: Node, path: &str) -> Result<Convergence, Error> {
    let mut cp_ins = vec![];
    let mut cp_out = None;
    let (frame, documentation) = decode_element(node, path, |child, path| {
        match child.tag_name().name() {
            "connectionPointIn" => cp_ins.push(decode_connection_point_in(child, path)?),
            "connectionPointOut" => {
                set_once(&mut cp_out, decode_connection_point_out(child, path)?, path)?
            }
            _ => return Ok(false),
        }
        Ok(true)
    })?;

    Ok(Convergence {
        frame,
        connection_points_in: cp_ins,
        connection_point_out: cp_out,
        documentation,
    })
}

/// Reads an element that may appear in any graphical body. Returns `None`
/// when the tag is not one of these elements.
fn decode_fbd_object(node: Node, path: &str) -> Result<Option<FbdObject>, Error> {
    let object = match node.tag_name().name() {
        "block" => FbdObject::Block(decode_block(node, path)?),
        "actionBlock" => FbdObject::ActionBlock(decode_action_block(node, path)?),
        "comment" => {
            let mut content = None;
            let (frame, documentation) = decode_element(node, path, |child, path| {
                match child.tag_name().name() {
                    "content" => set_once(&mut content, decode_markup(child), path)?,
                    _ => return Ok(false),
                }
                Ok(true)
            })?;
            FbdObject::Comment(Comment {
                frame,
                content: required_element(content, "content", path)?,
                documentation,
            })
        }
        "connector" => {
            let mut cp_in = None;
            let (frame, documentation) = decode_element(node, path, |child, path| {
                match child.tag_name().name() {
                    "connectionPointIn" => {
                        set_once(&mut cp_in, decode_connection_point_in(child, path)?, path)?
                    }
                    _ => return Ok(false),
                }
                Ok(true)
            })?;
            FbdObject::Connector(Connector {
                frame,
                name: required_string(node, "name", path)?,
                connection_point_in: cp_in,
                documentation,
            })
        }
        "continuation" => {
            let mut cp_out = None;
            let (frame, documentation) = decode_element(node, path, |child, path| {
                match child.tag_name().name() {
                    "connectionPointOut" => {
                        set_once(&mut cp_out, decode_connection_point_out(child, path)?, path)?
                    }
                    _ => return Ok(false),
                }
                Ok(true)
            })?;
            FbdObject::Continuation(Continuation {
                frame,
                name: required_string(node, "name", path)?,
                connection_point_out: cp_out,
                documentation,
            })
        }
        "inVariable" => {
            let parts = decode_fbd_variable(node, path)?;
            FbdObject::InVariable(InVariable {
                frame: parts.frame,
                expression: parts.expression,
                negated: parts.negated,
                edge: parts.edge,
                storage: parts.storage,
                execution_order_id: parts.execution_order_id,
                connection_point_out: parts.connection_point_out,
                documentation: parts.documentation,
            })
        }
        "outVariable" => {
            let parts = decode_fbd_variable(node, path)?;
            FbdObject::OutVariable(OutVariable {
                frame: parts.frame,
                expression: parts.expression,
                negated: parts.negated,
                edge: parts.edge,
                storage: parts.storage,
                execution_order_id: parts.execution_order_id,
                connection_point_in: parts.connection_point_in,
                documentation: parts.documentation,
            })
        }
        "inOutVariable" => {
            let parts = decode_fbd_variable(node, path)?;
            FbdObject::InOutVariable(InOutVariable {
                frame: parts.frame,
                expression: parts.expression,
                negated: parts.negated,
                edge: parts.edge,
                storage: parts.storage,
                execution_order_id: parts.execution_order_id,
                connection_point_in: parts.connection_point_in,
                connection_point_out: parts.connection_point_out,
                documentation: parts.documentation,
            })
        }
        "jump" => {
            let mut cp_in = None;
            let (frame, documentation) = decode_element(node, path, |child, path| {
                match child.tag_name().name() {
                    "connectionPointIn" => {
                        set_once(&mut cp_in, decode_connection_point_in(child, path)?, path)?
                    }
                    _ => return Ok(false),
                }
                Ok(true)
            })?;
            FbdObject::Jump(Jump {
                frame,
                label: required_string(node, "label", path)?,
                connection_point_in: cp_in,
                documentation,
            })
        }
        "label" => {
            let (frame, documentation) = decode_element(node, path, |_, _| Ok(false))?;
            FbdObject::Label(Label {
                frame,
                label: required_string(node, "label", path)?,
                documentation,
            })
        }
        "return" => {
            let mut cp_in = None;
            let (frame, documentation) = decode_element(node, path, |child, path| {
                match child.tag_name().name() {
                    "connectionPointIn" => {
                        set_once(&mut cp_in, decode_connection_point_in(child, path)?, path)?
                    }
                    _ => return Ok(false),
                }
                Ok(true)
            })?;
            FbdObject::Return(Return {
                frame,
                connection_point_in: cp_in,
                documentation,
            })
        }
        _ => return Ok(None),
    };
    Ok(Some(object))
}

fn decode_block(node: Node, path: &str) -> Result<Block, Error> {
    let mut input_variables = vec![];
    let mut in_out_variables = vec![];
    let mut output_variables = vec![];
    let (frame, documentation) = decode_element(node, path, |child, path| {
        let pins = match child.tag_name().name() {
            "inputVariables" => &mut input_variables,
            "inOutVariables" => &mut in_out_variables,
            "outputVariables" => &mut output_variables,
            _ => return Ok(false),
        };
        for pin in children_named(child, "variable", path)? {
            let pin_path = format!(
                "{}/variable[{}]",
                path,
                pin.attribute("formalParameter").unwrap_or_default()
            );
            pins.push(decode_block_variable(pin, &pin_path)?);
        }
        Ok(true)
    })?;

    Ok(Block {
        frame,
        type_name: required_string(node, "typeName", path)?,
        instance_name: optional_string(node, "instanceName"),
        execution_order_id: optional_attr(node, "executionOrderId", path)?,
        input_variables,
        in_out_variables,
        output_variables,
        documentation,
    })
}

fn decode_block_variable(node: Node, path: &str) -> Result<BlockVariable, Error> {
    let mut cp_in = None;
    let mut cp_out = None;

    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "connectionPointIn" => set_once(
                &mut cp_in,
                decode_connection_point_in(child, &child_path)?,
                &child_path,
            )?,
            "connectionPointOut" => set_once(
                &mut cp_out,
                decode_connection_point_out(child, &child_path)?,
                &child_path,
            )?,
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(BlockVariable {
        formal_parameter: required_string(node, "formalParameter", path)?,
        negated: optional_bool(node, "negated", path)?,
        edge: optional_token(node, "edge", path, EdgeModifier::from_tag)?,
        connection_point_in: cp_in,
        connection_point_out: cp_out,
    })
}

fn decode_action_block(node: Node, path: &str) -> Result<ActionBlock, Error> {
    let mut cp_in = None;
    let mut actions = vec![];
    let (frame, documentation) = decode_element(node, path, |child, path| {
        match child.tag_name().name() {
            "connectionPointIn" => {
                set_once(&mut cp_in, decode_connection_point_in(child, path)?, path)?
            }
            "action" => actions.push(ActionBlockAction {
                qualifier: optional_token(child, "qualifier", path, ActionQualifier::from_tag)?,
                duration: optional_string(child, "duration"),
                indicator: optional_string(child, "indicator"),
                source: decode_body_ref(child, path)?,
            }),
            _ => return Ok(false),
        }
        Ok(true)
    })?;

    Ok(ActionBlock {
        frame,
        connection_point_in: cp_in,
        actions,
        documentation,
    })
}

/// Reads the choice between a named `reference` and an `inline` body.
fn decode_body_ref(node: Node, path: &str) -> Result<BodyRef, Error> {
    let mut choice = Alternatives::new(path);
    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        let source = match tag {
            "reference" => {
                expect_no_children(child, &child_path)?;
                BodyRef::reference(required_string(child, "name", &child_path)?)
            }
            "inline" => BodyRef::inline(
                optional_string(child, "name"),
                decode_body(child, &child_path)?,
            ),
            _ => return Err(Error::unknown(path, tag)),
        };
        choice.push(tag, source);
    }
    choice.single()
}

struct FbdVariableParts {
    frame: Frame,
    expression: String,
    negated: Option<bool>,
    edge: Option<EdgeModifier>,
    storage: Option<StorageModifier>,
    execution_order_id: Option<u64>,
    connection_point_in: Option<ConnectionPointIn>,
    connection_point_out: Option<ConnectionPointOut>,
    documentation: Option<FormattedText>,
}

fn decode_fbd_variable(node: Node, path: &str) -> Result<FbdVariableParts, Error> {
    let tag = node.tag_name().name();
    let accepts_in = tag != "inVariable";
    let accepts_out = tag != "outVariable";

    let mut expression = None;
    let mut cp_in = None;
    let mut cp_out = None;
    let (frame, documentation) = decode_element(node, path, |child, path| {
        match child.tag_name().name() {
            "expression" => set_once(&mut expression, text_content(child), path)?,
            "connectionPointIn" if accepts_in => {
                set_once(&mut cp_in, decode_connection_point_in(child, path)?, path)?
            }
            "connectionPointOut" if accepts_out => {
                set_once(&mut cp_out, decode_connection_point_out(child, path)?, path)?
            }
            _ => return Ok(false),
        }
        Ok(true)
    })?;

    Ok(FbdVariableParts {
        frame,
        expression: required_element(expression, "expression", path)?,
        negated: optional_bool(node, "negated", path)?,
        edge: optional_token(node, "edge", path, EdgeModifier::from_tag)?,
        storage: optional_token(node, "storage", path, StorageModifier::from_tag)?,
        execution_order_id: optional_attr(node, "executionOrderId", path)?,
        connection_point_in: cp_in,
        connection_point_out: cp_out,
        documentation,
    })
}

fn decode_connection_point_in(node: Node, path: &str) -> Result<ConnectionPointIn, Error> {
    let mut point = ConnectionPointIn::default();

    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "relPosition" => set_once(
                &mut point.rel_position,
                decode_point(child, &child_path)?,
                &child_path,
            )?,
            "connection" => point.connections.push(decode_connection(child, &child_path)?),
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(point)
}

fn decode_connection(node: Node, path: &str) -> Result<Connection, Error> {
    let mut positions = vec![];
    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "position" => positions.push(decode_point(child, &child_path)?),
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(Connection {
        ref_local_id: required_attr(node, "refLocalId", path)?,
        formal_parameter: optional_string(node, "formalParameter"),
        positions,
    })
}

fn decode_connection_point_out(node: Node, path: &str) -> Result<ConnectionPointOut, Error> {
    let mut point = ConnectionPointOut {
        rel_position: None,
        formal_parameter: optional_string(node, "formalParameter"),
    };

    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "relPosition" => set_once(
                &mut point.rel_position,
                decode_point(child, &child_path)?,
                &child_path,
            )?,
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(point)
}

/// Reads the attributes and children shared by every graphical element
/// (`localId`, size, `position` and `documentation`). Other children are
/// passed to `child`, which returns `false` for tags it does not know.
fn decode_element<'a, 'input, F>(
    node: Node<'a, 'input>,
    path: &str,
    mut child: F,
) -> Result<(Frame, Option<FormattedText>), Error>
where
    F: FnMut(Node<'a, 'input>, &str) -> Result<bool, Error>,
{
    let mut frame = Frame {
        local_id: required_attr(node, "localId", path)?,
        position: None,
        width: optional_attr(node, "width", path)?,
        height: optional_attr(node, "height", path)?,
    };
    let mut documentation = None;

    for element in elements(node) {
        let tag = element.tag_name().name();
        let element_path = format!("{}/{}", path, tag);
        match tag {
            "position" => set_once(
                &mut frame.position,
                decode_point(element, &element_path)?,
                &element_path,
            )?,
            "documentation" => {
                set_once(&mut documentation, decode_markup(element), &element_path)?
            }
            _ => {
                if !child(element, &element_path)? {
                    return Err(Error::unknown(path, tag));
                }
            }
        }
    }

    Ok((frame, documentation))
}

fn decode_instances(node: Node, path: &str) -> Result<Instances, Error> {
    let mut instances = Instances::default();

    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "configurations" => {
                for item in children_named(child, "configuration", &child_path)? {
                    let item_path = named_path(&child_path, item);
                    instances
                        .configurations
                        .push(decode_configuration(item, &item_path)?);
                }
            }
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(instances)
}

fn decode_configuration(node: Node, path: &str) -> Result<Configuration, Error> {
    let mut configuration = Configuration::new(required_string(node, "name", path)?);

    for child in elements(node) {
        let tag = child.tag_name().name();
        match tag {
            "resource" => {
                let child_path = named_path(path, child);
                configuration
                    .resources
                    .push(decode_resource(child, &child_path)?);
            }
            "globalVars" => {
                let child_path = format!("{}/{}", path, tag);
                set_once(
                    &mut configuration.global_vars,
                    decode_var_list(child, &child_path)?,
                    &child_path,
                )?
            }
            "documentation" => {
                let child_path = format!("{}/{}", path, tag);
                set_once(
                    &mut configuration.documentation,
                    decode_markup(child),
                    &child_path,
                )?
            }
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(configuration)
}

fn decode_resource(node: Node, path: &str) -> Result<Resource, Error> {
    let mut resource = Resource::new(required_string(node, "name", path)?);

    for child in elements(node) {
        let tag = child.tag_name().name();
        match tag {
            "task" => {
                let child_path = named_path(path, child);
                resource.tasks.push(decode_task(child, &child_path)?);
            }
            "globalVars" => {
                let child_path = format!("{}/{}", path, tag);
                set_once(
                    &mut resource.global_vars,
                    decode_var_list(child, &child_path)?,
                    &child_path,
                )?
            }
            "pouInstance" => {
                let child_path = named_path(path, child);
                resource
                    .pou_instances
                    .push(decode_pou_instance(child, &child_path)?);
            }
            "documentation" => {
                let child_path = format!("{}/{}", path, tag);
                set_once(&mut resource.documentation, decode_markup(child), &child_path)?
            }
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    Ok(resource)
}

fn decode_task(node: Node, path: &str) -> Result<Task, Error> {
    let mut pou_instances = vec![];
    for child in children_named(node, "pouInstance", path)? {
        let child_path = named_path(path, child);
        pou_instances.push(decode_pou_instance(child, &child_path)?);
    }

    Ok(Task {
        name: required_string(node, "name", path)?,
        priority: required_attr(node, "priority", path)?,
        interval: optional_string(node, "interval"),
        single: optional_string(node, "single"),
        pou_instances,
    })
}

fn decode_pou_instance(node: Node, path: &str) -> Result<PouInstance, Error> {
    let mut documentation = None;
    for child in elements(node) {
        let tag = child.tag_name().name();
        let child_path = format!("{}/{}", path, tag);
        match tag {
            "documentation" => set_once(&mut documentation, decode_markup(child), &child_path)?,
            _ => return Err(Error::unknown(path, tag)),
        }
    }

    // Version 2 of the schema renamed the attribute to typeName.
    let type_name = match node.attribute("type").or_else(|| node.attribute("typeName")) {
        Some(type_name) => type_name.to_string(),
        None => return Err(Error::malformed(path, "missing attribute 'type'")),
    };

    Ok(PouInstance {
        name: required_string(node, "name", path)?,
        type_name,
        documentation,
    })
}

fn is_vendor_data(node: &Node) -> bool {
    matches!(node.tag_name().name(), "addData" | "addDataInfo")
}

/// The child elements that carry model content.
fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element() && !is_vendor_data(n))
}

/// Returns the child elements, all of which must have the tag.
fn children_named<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    path: &str,
) -> Result<Vec<Node<'a, 'input>>, Error> {
    elements(node)
        .map(|child| {
            if child.tag_name().name() == tag {
                Ok(child)
            } else {
                Err(Error::unknown(path, child.tag_name().name()))
            }
        })
        .collect()
}

fn expect_no_children(node: Node, path: &str) -> Result<(), Error> {
    match elements(node).next() {
        Some(child) => Err(Error::unknown(path, child.tag_name().name())),
        None => Ok(()),
    }
}

fn named_path(parent: &str, node: Node) -> String {
    format!(
        "{}/{}[{}]",
        parent,
        node.tag_name().name(),
        node.attribute("name").unwrap_or_default()
    )
}

fn element_path(parent: &str, node: Node) -> String {
    format!(
        "{}/{}[{}]",
        parent,
        node.tag_name().name(),
        node.attribute("localId").unwrap_or_default()
    )
}

fn set_once<T>(slot: &mut Option<T>, value: T, path: &str) -> Result<(), Error> {
    if slot.is_some() {
        return Err(Error::malformed(path, "element appears more than once"));
    }
    *slot = Some(value);
    Ok(())
}

fn required_element<T>(value: Option<T>, tag: &str, path: &str) -> Result<T, Error> {
    value.ok_or_else(|| Error::malformed(path, format!("missing element '{}'", tag)))
}

fn required_string(node: Node, name: &str, path: &str) -> Result<String, Error> {
    node.attribute(name)
        .map(String::from)
        .ok_or_else(|| Error::malformed(path, format!("missing attribute '{}'", name)))
}

fn optional_string(node: Node, name: &str) -> Option<String> {
    node.attribute(name).map(String::from)
}

fn parse_attr<T>(value: &str, name: &str, path: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e| {
        Error::malformed(
            path,
            format!("attribute '{}' has invalid value '{}': {}", name, value, e),
        )
    })
}

fn required_attr<T>(node: Node, name: &str, path: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
{
    match node.attribute(name) {
        Some(value) => parse_attr(value, name, path),
        None => Err(Error::malformed(
            path,
            format!("missing attribute '{}'", name),
        )),
    }
}

fn optional_attr<T>(node: Node, name: &str, path: &str) -> Result<Option<T>, Error>
where
    T: FromStr,
    T::Err: Display,
{
    node.attribute(name)
        .map(|value| parse_attr(value, name, path))
        .transpose()
}

/// Reads an `xs:boolean` attribute.
fn optional_bool(node: Node, name: &str, path: &str) -> Result<Option<bool>, Error> {
    match node.attribute(name).map(str::trim) {
        None => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(value) => Err(Error::malformed(
            path,
            format!("attribute '{}' has invalid boolean '{}'", name, value),
        )),
    }
}

fn optional_token<T>(
    node: Node,
    name: &str,
    path: &str,
    from_tag: fn(&str) -> Option<T>,
) -> Result<Option<T>, Error> {
    match node.attribute(name) {
        None => Ok(None),
        Some(value) => from_tag(value)
            .map(Some)
            .ok_or_else(|| Error::unknown(format!("{}/@{}", path, name), value)),
    }
}

fn required_token<T>(
    node: Node,
    name: &str,
    path: &str,
    from_tag: fn(&str) -> Option<T>,
) -> Result<T, Error> {
    optional_token(node, name, path, from_tag)?
        .ok_or_else(|| Error::malformed(path, format!("missing attribute '{}'", name)))
}

fn text_content(node: Node) -> String {
    node.text().unwrap_or_default().to_string()
}

fn decode_markup(node: Node) -> FormattedText {
    FormattedText::from_markup(inner_markup(node))
}

/// Returns the source text between the start and end tags of the element,
/// exactly as it appears in the document.
fn inner_markup<'input>(node: Node<'_, 'input>) -> &'input str {
    let input = node.document().input_text();
    let Some(element) = input.get(node.range()) else {
        return "";
    };
    let Some(start) = start_tag_end(element) else {
        return "";
    };
    if element[..start].ends_with("/>") {
        return "";
    }
    let end = element.rfind("</").unwrap_or(start).max(start);
    element.get(start..end).unwrap_or_default()
}

/// Finds the end of the start tag, skipping `>` inside quoted attribute
/// values.
fn start_tag_end(element: &str) -> Option<usize> {
    let mut quote = None;
    for (index, c) in element.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => return Some(index + 1),
            None => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use plcopen_model::graph::BodyGraph;
    use plcopen_test::read_shared_resource;

    fn project_xml(types: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<project xmlns="http://www.plcopen.org/xml/tc6.xsd" xmlns:xhtml="http://www.w3.org/1999/xhtml">
  <fileHeader companyName="Acme" productName="Line Control" productVersion="1.0" creationDateTime="2024-05-06T07:08:09Z"/>
  <contentHeader name="Plant"/>
  <types>
{}
  </types>
</project>"#,
            types
        )
    }

    #[test]
    fn from_str_when_minimal_project_then_succeeds() {
        let project = from_str(&project_xml("<dataTypes/><pous/>")).unwrap();

        assert_eq!(project.file_header.company_name, "Acme");
        assert_eq!(project.file_header.company_url, None);
        assert_eq!(project.content_header.name, "Plant");
        assert_eq!(project.content_header.version, None);
        assert!(project.types.unwrap().pous.is_empty());
        assert!(project.instances.is_none());
    }

    #[test]
    fn from_str_when_not_xml_then_malformed_wire() {
        let err = from_str("<project").unwrap_err();
        assert_eq!(err.problem(), Problem::MalformedWire);
    }

    #[test]
    fn from_str_when_wrong_root_then_malformed_wire() {
        let err = from_str(r#"<xmile xmlns="http://docs.oasis-open.org/xmile/ns/XMILE/v1.0"/>"#)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedWire { message, .. } if message.contains("xmile")));
    }

    #[test]
    fn from_str_when_foreign_namespace_then_malformed_wire() {
        let err = from_str(r#"<project xmlns="urn:other"/>"#).unwrap_err();
        assert!(matches!(err, Error::MalformedWire { message, .. } if message.contains("urn:other")));
    }

    #[test]
    fn from_str_when_missing_file_header_then_malformed_wire() {
        let xml = r#"<project xmlns="http://www.plcopen.org/xml/tc6_0201"><contentHeader name="x"/></project>"#;
        let err = from_str(xml).unwrap_err();
        assert!(matches!(err, Error::MalformedWire { message, .. } if message.contains("fileHeader")));
    }

    #[test]
    fn from_str_when_two_array_dimensions_then_keeps_order() {
        let project = from_str(&read_shared_resource("array_2d.xml")).unwrap();

        let decl = project.data_type("T_ARRAY_2D").unwrap();
        let DataType::Array(array) = &decl.base_type else {
            panic!("expected array");
        };
        assert_eq!(
            array.dimensions,
            vec![RangeSigned::new(1, 5), RangeSigned::new(1, 5)]
        );
        assert_eq!(array.base_type, DataType::Real);
    }

    #[test]
    fn from_str_when_and_block_then_three_connections_resolve() {
        let project = from_str(&read_shared_resource("fbd_and_block.xml")).unwrap();

        let body = project.pou("Main").unwrap().body.as_ref().unwrap();
        let graph = BodyGraph::build(body, "body").unwrap();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.edges().len(), 3);
        assert_eq!(graph.inputs_of(4).count(), 2);
        assert_eq!(graph.outputs_of(4).next().unwrap().target, 3);
    }

    #[test]
    fn from_str_when_sfc_with_inline_condition_then_keeps_markup() {
        let project = from_str(&read_shared_resource("sfc_inline_condition.xml")).unwrap();

        let Some(Body::Sfc(sfc)) = &project.pou("Sequence").unwrap().body else {
            panic!("expected SFC body");
        };
        let SfcObject::Step(init) = &sfc.elements[0] else {
            panic!("expected step");
        };
        assert_eq!(init.name, "Init");
        assert_eq!(init.initial_step, Some(true));

        let transition = sfc
            .elements
            .iter()
            .find_map(|e| match e {
                SfcObject::Transition(t) => Some(t),
                _ => None,
            })
            .unwrap();
        let Some(BodyRef::Inline(inline)) = &transition.condition else {
            panic!("expected inline condition");
        };
        let Body::St(text) = &inline.body else {
            panic!("expected ST condition");
        };
        assert_eq!(text.markup(), "<xhtml:p>counter &gt; 0</xhtml:p>");
        assert_eq!(text.text().unwrap(), "counter > 0");
    }

    #[test]
    fn from_str_when_variable_name_repeats_then_duplicate_variable() {
        let err = from_str(&read_shared_resource("duplicate_variable.xml")).unwrap_err();
        assert!(matches!(err, Error::DuplicateVariable { name, .. } if name == "x"));
    }

    #[test]
    fn from_str_when_reference_to_missing_id_then_dangling_reference() {
        let err = from_str(&read_shared_resource("dangling_reference.xml")).unwrap_err();
        assert!(matches!(err, Error::DanglingReference { id: 99, .. }));
    }

    #[test]
    fn from_str_when_base_type_has_bool_and_int_then_invalid_choice() {
        let xml = project_xml(
            r#"<dataTypes><dataType name="T"><baseType><BOOL/><INT/></baseType></dataType></dataTypes><pous/>"#,
        );

        let err = from_str(&xml).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidChoice {
                path: "types/dataTypes/dataType[T]/baseType".to_string(),
                found: vec!["BOOL".to_string(), "INT".to_string()],
            }
        );
    }

    #[test]
    fn from_str_when_base_type_is_empty_then_invalid_choice() {
        let xml = project_xml(
            r#"<dataTypes><dataType name="T"><baseType/></dataType></dataTypes><pous/>"#,
        );

        let err = from_str(&xml).unwrap_err();
        assert!(matches!(err, Error::InvalidChoice { found, .. } if found.is_empty()));
    }

    #[test]
    fn from_str_when_unknown_data_type_tag_then_unknown_variant() {
        let xml = project_xml(
            r#"<dataTypes><dataType name="T"><baseType><FLOAT/></baseType></dataType></dataTypes><pous/>"#,
        );

        let err = from_str(&xml).unwrap_err();
        assert!(matches!(err, Error::UnknownVariant { tag, .. } if tag == "FLOAT"));
    }

    #[test]
    fn from_str_when_unknown_pou_type_then_unknown_variant() {
        let xml = project_xml(r#"<dataTypes/><pous><pou name="P" pouType="class"/></pous>"#);

        let err = from_str(&xml).unwrap_err();
        assert!(matches!(err, Error::UnknownVariant { tag, .. } if tag == "class"));
    }

    #[test]
    fn from_str_when_role_repeats_then_malformed_wire() {
        let xml = project_xml(
            r#"<dataTypes/><pous><pou name="P" pouType="program"><interface><localVars/><localVars/></interface></pou></pous>"#,
        );

        let err = from_str(&xml).unwrap_err();
        assert_eq!(err.problem(), Problem::MalformedWire);
    }

    #[test]
    fn from_str_when_optional_attributes_absent_then_none() {
        let xml = project_xml(
            r#"<dataTypes/><pous><pou name="P" pouType="program"><interface><localVars><variable name="s"><type><string/></type></variable></localVars></interface></pou></pous>"#,
        );

        let project = from_str(&xml).unwrap();
        let list = project.pou("P").unwrap().interface.as_ref().unwrap();
        let list = list.var_list(VarRole::Local).unwrap();
        assert_eq!(list.constant, None);
        assert_eq!(list.name, None);
        let variable = list.variable("s").unwrap();
        assert_eq!(variable.address, None);
        assert_eq!(variable.initial_value, None);
        assert_eq!(variable.var_type, DataType::String(StringType { length: None }));
    }

    #[test]
    fn from_str_when_vendor_data_then_skipped() {
        let xml = project_xml(
            r#"<dataTypes/><pous><pou name="P" pouType="program"><addData><data name="x" handleUnknown="discard"/></addData></pou></pous>"#,
        );

        assert!(from_str(&xml).is_ok());
    }

    #[test]
    fn from_str_when_body_has_documentation_then_reads_language() {
        let xml = project_xml(
            r#"<dataTypes/><pous><pou name="P" pouType="program"><body><ST><xhtml:p>x := 1;</xhtml:p></ST><documentation><xhtml:p>Main loop</xhtml:p></documentation></body></pou></pous>"#,
        );

        let project = from_str(&xml).unwrap();
        let pou = &project.types.unwrap().pous[0];
        assert!(matches!(&pou.body, Some(Body::St(text)) if text.text().unwrap() == "x := 1;"));
    }

    #[test]
    fn from_str_when_pou_instance_uses_type_name_then_reads_it() {
        let xml = r#"<project xmlns="http://www.plcopen.org/xml/tc6_0201">
  <fileHeader companyName="a" productName="b" productVersion="c" creationDateTime="2024-01-01T00:00:00"/>
  <contentHeader name="d"/>
  <instances><configurations><configuration name="Config">
    <resource name="Res"><task name="Fast" priority="1" interval="T#10ms"><pouInstance name="main" typeName="Main"/></task></resource>
  </configuration></configurations></instances>
</project>"#;

        let project = from_str(xml).unwrap();
        let configuration = &project.instances.unwrap().configurations[0];
        let task = &configuration.resources[0].tasks[0];
        assert_eq!(task.interval.as_deref(), Some("T#10ms"));
        assert_eq!(task.pou_instances[0].type_name, "Main");
    }

    #[test]
    fn inner_markup_when_attribute_has_angle_bracket_then_skips_it() {
        let xml = r#"<a b="x>y"><c>1 &lt; 2</c></a>"#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(inner_markup(doc.root_element()), "<c>1 &lt; 2</c>");
    }

    #[test]
    fn inner_markup_when_self_closing_then_empty() {
        let doc = Document::parse(r#"<a b="1"/>"#).unwrap();
        assert_eq!(inner_markup(doc.root_element()), "");
    }
}
