//! JSON projection of the document.
//!
//! Keys are the camelCase field names of the model. Absent optional fields
//! and empty lists are left out rather than written as `null` or `[]`.
//! Choice groups are objects with a single key naming the alternative,
//! except elementary data types which are plain strings such as `"BOOL"`.

use log::debug;

use crate::error::Error;
use crate::project::Project;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JsonOptions {
    /// Indents the output for reading.
    pub pretty: bool,
}

pub fn to_string(project: &Project) -> Result<String, Error> {
    to_string_with_options(project, &JsonOptions::default())
}

pub fn to_string_with_options(project: &Project, options: &JsonOptions) -> Result<String, Error> {
    project.validate()?;

    let result = if options.pretty {
        serde_json::to_string_pretty(project)
    } else {
        serde_json::to_string(project)
    };
    let json = result.map_err(|e| Error::Write(e.to_string()))?;

    debug!("Wrote {} bytes of JSON", json.len());
    Ok(json)
}

/// Reads and validates a document.
pub fn from_str(json: &str) -> Result<Project, Error> {
    let project: Project = serde_json::from_str(json).map_err(|e| {
        Error::malformed(
            format!("line {} column {}", e.line(), e.column()),
            e.to_string(),
        )
    })?;
    project.validate()?;

    debug!("Read project '{}' from JSON", project.content_header.name);
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::*;
    use crate::pou::{Pou, PouType, VarList, VarRole, Variable};
    use crate::project::{ContentHeader, FileHeader};
    use crate::types::{DataType, DataTypeDecl, RangeSigned};
    use crate::value::Value;

    fn project() -> Project {
        let mut header = FileHeader::new("Acme", "Line Control", "1.0");
        header.creation_date_time = "2024-05-06T07:08:09Z".parse().unwrap();
        let mut project = Project::new(header, ContentHeader::new("Plant"));

        let types = project.types_mut();
        types.data_types.push(DataTypeDecl::new(
            "T_ARRAY_2D",
            DataType::array(
                vec![RangeSigned::new(1, 5), RangeSigned::new(1, 5)],
                DataType::Real,
            ),
        ));

        let mut pou = Pou::new("Main", PouType::Program);
        pou.interface_mut().set_var_list(
            VarRole::Local,
            VarList::new(vec![
                Variable::new("counter", DataType::Int).with_initial_value(Value::simple("0"))
            ]),
        );
        pou.body = Some(Body::st("counter := counter + 1;"));
        types.pous.push(pou);

        project
    }

    #[test]
    fn from_str_when_written_then_equal_project() {
        let original = project();

        let json = to_string(&original).unwrap();
        let decoded = from_str(&json).unwrap();

        assert_eq!(decoded, original);
    }

    #[test]
    fn to_string_when_optional_absent_then_no_null() {
        let json = to_string(&project()).unwrap();

        assert!(!json.contains("null"));
        assert!(!json.contains("instances"));
        assert!(!json.contains("address"));
    }

    #[test]
    fn to_string_when_pretty_then_indented() {
        let options = JsonOptions { pretty: true };
        let json = to_string_with_options(&project(), &options).unwrap();
        assert!(json.contains("\n  \"fileHeader\""));
    }

    #[test]
    fn from_str_when_not_json_then_malformed_wire() {
        let err = from_str("{ not json").unwrap_err();
        assert_eq!(err.problem(), crate::Problem::MalformedWire);
    }

    #[test]
    fn from_str_when_unknown_data_type_then_malformed_wire() {
        let json = to_string(&project()).unwrap().replace("\"REAL\"", "\"FLOAT\"");
        let err = from_str(&json).unwrap_err();
        assert!(matches!(err, Error::MalformedWire { message, .. } if message.contains("FLOAT")));
    }

    #[test]
    fn from_str_when_duplicate_local_id_then_validation_error() {
        let mut project = project();
        project.types_mut().pous[0].body = Some(Body::fbd(vec![
            FbdObject::InVariable(InVariable::new(Frame::new(1), "a")),
            FbdObject::InVariable(InVariable::new(Frame::new(1), "b")),
        ]));
        let json = serde_json::to_string(&project).unwrap();

        let err = from_str(&json).unwrap_err();
        assert!(matches!(err, Error::DuplicateLocalId { id: 1, .. }));
    }

    #[test]
    fn to_string_when_invalid_then_error_and_no_output() {
        let mut project = project();
        project.types_mut().pous.push(Pou::new("Scale", PouType::Function));

        let err = to_string(&project).unwrap_err();
        assert!(matches!(err, Error::MissingReturnType { .. }));
    }
}
