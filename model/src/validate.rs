//! Checks of the rules that the types of the model cannot express on their
//! own: unique names within a variable list, unique and resolvable local ids
//! within a body, and the return type rules of functions and programs.
//!
//! Errors name the document path of the offending entity, for example
//! `types/pous/pou[Main]/interface/localVars`.

use std::collections::HashSet;

use log::debug;

use crate::body::{Body, BodyRef, FbdObject, LdObject, SfcObject};
use crate::error::Error;
use crate::graph::BodyGraph;
use crate::pou::{Pou, PouType, VarList, Variable};
use crate::project::{Configuration, Project, Resource};
use crate::types::DataType;

pub fn validate_project(project: &Project) -> Result<(), Error> {
    if let Some(types) = &project.types {
        for decl in &types.data_types {
            let path = format!("types/dataTypes/dataType[{}]", decl.name);
            validate_data_type(&decl.base_type, &format!("{}/baseType", path))?;
        }
        for pou in &types.pous {
            validate_pou(pou, &format!("types/pous/pou[{}]", pou.name))?;
        }
    }

    if let Some(instances) = &project.instances {
        for configuration in &instances.configurations {
            validate_configuration(
                configuration,
                &format!("instances/configurations/configuration[{}]", configuration.name),
            )?;
        }
    }

    debug!("Validated project '{}'", project.content_header.name);
    Ok(())
}

pub fn validate_pou(pou: &Pou, path: &str) -> Result<(), Error> {
    match (pou.pou_type, pou.return_type()) {
        (PouType::Function, None) => {
            return Err(Error::MissingReturnType {
                pou: pou.name.clone(),
            })
        }
        (PouType::Program, Some(_)) => {
            return Err(Error::UnexpectedReturnType {
                pou: pou.name.clone(),
            })
        }
        _ => {}
    }

    if let Some(interface) = &pou.interface {
        if let Some(return_type) = &interface.return_type {
            validate_data_type(return_type, &format!("{}/interface/returnType", path))?;
        }
        for (role, list) in interface.var_lists() {
            validate_var_list(list, &format!("{}/interface/{}", path, role))?;
        }
    }

    for action in &pou.actions {
        validate_body(
            &action.body,
            &format!("{}/actions/action[{}]/body", path, action.name),
        )?;
    }
    for transition in &pou.transitions {
        validate_body(
            &transition.body,
            &format!("{}/transitions/transition[{}]/body", path, transition.name),
        )?;
    }
    if let Some(body) = &pou.body {
        validate_body(body, &format!("{}/body", path))?;
    }

    Ok(())
}

/// Checks that variable names are unique within the list. The same name
/// may appear in lists of different roles.
pub fn validate_var_list(list: &VarList, path: &str) -> Result<(), Error> {
    validate_variables(&list.variables, path)
}

fn validate_variables(variables: &[Variable], path: &str) -> Result<(), Error> {
    let mut names = HashSet::new();
    for variable in variables {
        if !names.insert(variable.name.as_str()) {
            return Err(Error::DuplicateVariable {
                path: path.to_string(),
                name: variable.name.clone(),
            });
        }
        validate_data_type(
            &variable.var_type,
            &format!("{}/variable[{}]/type", path, variable.name),
        )?;
    }
    Ok(())
}

/// Checks inline structures at any depth.
pub fn validate_data_type(data_type: &DataType, path: &str) -> Result<(), Error> {
    match data_type {
        DataType::Struct(structure) => validate_variables(&structure.variables, path),
        DataType::Array(array) => {
            validate_data_type(&array.base_type, &format!("{}/array/baseType", path))
        }
        DataType::Pointer(pointer) => {
            validate_data_type(&pointer.base_type, &format!("{}/pointer/baseType", path))
        }
        DataType::SubrangeSigned(subrange) => validate_data_type(
            &subrange.base_type,
            &format!("{}/subrangeSigned/baseType", path),
        ),
        DataType::SubrangeUnsigned(subrange) => validate_data_type(
            &subrange.base_type,
            &format!("{}/subrangeUnsigned/baseType", path),
        ),
        DataType::Enum(enumeration) => match &enumeration.base_type {
            Some(base_type) => validate_data_type(base_type, &format!("{}/enum/baseType", path)),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

/// Checks the graph of the body, then every body nested within it. A nested
/// body has its own local id space.
pub fn validate_body(body: &Body, path: &str) -> Result<(), Error> {
    let path = format!("{}/{}", path, body.tag());
    BodyGraph::build(body, &path)?;

    match body {
        Body::Fbd(fbd) => {
            for element in &fbd.elements {
                validate_nested_fbd(element, &path)?;
            }
        }
        Body::Ld(ld) => {
            for element in &ld.elements {
                if let LdObject::Fbd(element) = element {
                    validate_nested_fbd(element, &path)?;
                }
            }
        }
        Body::Sfc(sfc) => {
            for element in &sfc.elements {
                match element {
                    SfcObject::Transition(transition) => {
                        if let Some(condition) = &transition.condition {
                            validate_body_ref(
                                condition,
                                &format!("{}/transition[{}]/condition", path, transition.frame.local_id),
                            )?;
                        }
                    }
                    SfcObject::Fbd(element) => validate_nested_fbd(element, &path)?,
                    _ => {}
                }
            }
        }
        Body::Il(_) | Body::St(_) => {}
    }

    Ok(())
}

fn validate_nested_fbd(element: &FbdObject, path: &str) -> Result<(), Error> {
    if let FbdObject::ActionBlock(block) = element {
        for action in &block.actions {
            validate_body_ref(
                &action.source,
                &format!("{}/actionBlock[{}]/action", path, block.frame.local_id),
            )?;
        }
    }
    Ok(())
}

fn validate_body_ref(source: &BodyRef, path: &str) -> Result<(), Error> {
    match source {
        BodyRef::Reference(_) => Ok(()),
        BodyRef::Inline(inline) => validate_body(&inline.body, &format!("{}/inline", path)),
    }
}

fn validate_configuration(configuration: &Configuration, path: &str) -> Result<(), Error> {
    if let Some(list) = &configuration.global_vars {
        validate_var_list(list, &format!("{}/globalVars", path))?;
    }
    for resource in &configuration.resources {
        validate_resource(resource, &format!("{}/resource[{}]", path, resource.name))?;
    }
    Ok(())
}

fn validate_resource(resource: &Resource, path: &str) -> Result<(), Error> {
    if let Some(list) = &resource.global_vars {
        validate_var_list(list, &format!("{}/globalVars", path))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::*;
    use crate::pou::{Interface, VarRole};
    use crate::project::{ContentHeader, FileHeader};
    use crate::types::StructType;

    fn project_with(pou: Pou) -> Project {
        let mut project = Project::new(
            FileHeader::new("Acme", "Line Control", "1.0"),
            ContentHeader::new("Plant"),
        );
        project.types_mut().pous.push(pou);
        project
    }

    #[test]
    fn validate_when_var_list_repeats_name_then_duplicate_variable() {
        let mut pou = Pou::new("Main", PouType::Program);
        pou.interface_mut().set_var_list(
            VarRole::Local,
            VarList::new(vec![
                Variable::new("x", DataType::Int),
                Variable::new("x", DataType::Bool),
            ]),
        );

        let err = project_with(pou).validate().unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateVariable {
                path: "types/pous/pou[Main]/interface/localVars".to_string(),
                name: "x".to_string(),
            }
        );
    }

    #[test]
    fn validate_when_same_name_in_two_roles_then_ok() {
        let mut pou = Pou::new("Main", PouType::Program);
        let interface = pou.interface_mut();
        interface.set_var_list(
            VarRole::Local,
            VarList::new(vec![Variable::new("x", DataType::Int)]),
        );
        interface.set_var_list(
            VarRole::External,
            VarList::new(vec![Variable::new("x", DataType::Int)]),
        );

        assert!(project_with(pou).validate().is_ok());
    }

    #[test]
    fn validate_when_struct_repeats_member_then_duplicate_variable() {
        let mut pou = Pou::new("Main", PouType::Program);
        pou.interface_mut().set_var_list(
            VarRole::Local,
            VarList::new(vec![Variable::new(
                "point",
                DataType::Struct(StructType {
                    variables: vec![
                        Variable::new("x", DataType::Real),
                        Variable::new("x", DataType::Real),
                    ],
                    documentation: None,
                }),
            )]),
        );

        let err = project_with(pou).validate().unwrap_err();
        assert!(matches!(err, Error::DuplicateVariable { name, .. } if name == "x"));
    }

    #[test]
    fn validate_when_function_without_return_type_then_missing_return_type() {
        let pou = Pou::new("Scale", PouType::Function);

        let err = project_with(pou).validate().unwrap_err();
        assert_eq!(
            err,
            Error::MissingReturnType {
                pou: "Scale".to_string()
            }
        );
    }

    #[test]
    fn validate_when_program_with_return_type_then_unexpected_return_type() {
        let mut pou = Pou::new("Main", PouType::Program);
        pou.interface = Some(Interface {
            return_type: Some(DataType::Int),
            ..Default::default()
        });

        let err = project_with(pou).validate().unwrap_err();
        assert_eq!(err.problem(), crate::Problem::UnexpectedReturnType);
    }

    #[test]
    fn validate_when_function_block_without_return_type_then_ok() {
        let pou = Pou::new("Motor", PouType::FunctionBlock);
        assert!(project_with(pou).validate().is_ok());
    }

    #[test]
    fn validate_when_inline_condition_reuses_outer_ids_then_ok() {
        let condition = Body::fbd(vec![
            FbdObject::InVariable(InVariable::new(Frame::new(1), "a")),
            FbdObject::OutVariable(OutVariable::new(Frame::new(2), "t", vec![Connection::to(1)])),
        ]);
        let mut transition = SfcTransition {
            frame: Frame::new(2),
            priority: None,
            connection_point_in: Some(ConnectionPointIn::from(vec![Connection::to(1)])),
            connection_point_out: None,
            condition: Some(BodyRef::inline(None, condition)),
            documentation: None,
        };
        transition.priority = Some(1);

        let mut pou = Pou::new("Seq", PouType::Program);
        pou.body = Some(Body::Sfc(Sfc {
            elements: vec![
                SfcObject::Step(Step::new(Frame::new(1), "Init")),
                SfcObject::Transition(transition),
            ],
        }));

        assert!(project_with(pou).validate().is_ok());
    }

    #[test]
    fn validate_when_inline_condition_dangles_then_error_names_nested_path() {
        let condition = Body::fbd(vec![FbdObject::OutVariable(OutVariable::new(
            Frame::new(1),
            "t",
            vec![Connection::to(5)],
        ))]);
        let transition = SfcTransition {
            frame: Frame::new(4),
            priority: None,
            connection_point_in: None,
            connection_point_out: None,
            condition: Some(BodyRef::inline(Some("t0".to_string()), condition)),
            documentation: None,
        };

        let mut pou = Pou::new("Seq", PouType::Program);
        pou.body = Some(Body::Sfc(Sfc {
            elements: vec![SfcObject::Transition(transition)],
        }));

        let err = project_with(pou).validate().unwrap_err();
        assert_eq!(
            err,
            Error::DanglingReference {
                path: "types/pous/pou[Seq]/body/SFC/transition[4]/condition/inline/FBD"
                    .to_string(),
                id: 5,
            }
        );
    }
}
