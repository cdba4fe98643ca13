//! The root of the document: headers, declared types and POUs, and the
//! configurations that instantiate them.

use serde::{Deserialize, Serialize};

use crate::body::Point;
use crate::error::Error;
use crate::pou::{Pou, VarList};
use crate::text::FormattedText;
use crate::timestamp::Timestamp;
use crate::types::DataTypeDecl;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub file_header: FileHeader,
    pub content_header: ContentHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Types>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<Instances>,
}

impl Project {
    pub fn new(file_header: FileHeader, content_header: ContentHeader) -> Self {
        Self {
            file_header,
            content_header,
            types: None,
            instances: None,
        }
    }

    /// Returns the types section, creating an empty one when there is none.
    pub fn types_mut(&mut self) -> &mut Types {
        self.types.get_or_insert_with(Types::default)
    }

    pub fn pou(&self, name: &str) -> Option<&Pou> {
        self.types
            .as_ref()
            .and_then(|types| types.pous.iter().find(|pou| pou.name == name))
    }

    pub fn data_type(&self, name: &str) -> Option<&DataTypeDecl> {
        self.types
            .as_ref()
            .and_then(|types| types.data_types.iter().find(|decl| decl.name == name))
    }

    /// Checks the rules that apply across the whole document. Decoders and
    /// encoders call this, so a document that fails here is never read or
    /// written.
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate::validate_project(self)
    }
}

/// Describes the tool and the moment that produced the file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHeader {
    pub company_name: String,
    #[serde(
        rename = "companyURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub company_url: Option<String>,
    pub product_name: String,
    pub product_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_release: Option<String>,
    pub creation_date_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_description: Option<String>,
}

impl FileHeader {
    /// Creates a header stamped with the current time.
    pub fn new(
        company_name: impl Into<String>,
        product_name: impl Into<String>,
        product_version: impl Into<String>,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            company_url: None,
            product_name: product_name.into(),
            product_version: product_version.into(),
            product_release: None,
            creation_date_time: Timestamp::now_utc(),
            content_description: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentHeader {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_date_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate_info: Option<CoordinateInfo>,
}

impl ContentHeader {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            modification_date_time: None,
            organization: None,
            author: None,
            language: None,
            comment: None,
            coordinate_info: None,
        }
    }
}

/// Page size and the scaling of each graphical language.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<Point>,
    pub fbd: Point,
    pub ld: Point,
    pub sfc: Point,
}

impl Default for CoordinateInfo {
    fn default() -> Self {
        let unit = Point::new(1.0, 1.0);
        Self {
            page_size: None,
            fbd: unit,
            ld: unit,
            sfc: unit,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Types {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_types: Vec<DataTypeDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pous: Vec<Pou>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Instances {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configurations: Vec<Configuration>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_vars: Option<VarList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

impl Configuration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: Vec::new(),
            global_vars: None,
            documentation: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_vars: Option<VarList>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pou_instances: Vec<PouInstance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
            global_vars: None,
            pou_instances: Vec::new(),
            documentation: None,
        }
    }
}

/// Runs its POU instances either cyclically at `interval` or when the
/// `single` variable rises.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub name: String,
    pub priority: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pou_instances: Vec<PouInstance>,
}

/// Binds an instance name to the name of a declared POU.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PouInstance {
    pub name: String,
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

impl PouInstance {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            documentation: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pou::PouType;

    #[test]
    fn pou_when_declared_then_found_by_name() {
        let mut project = Project::new(
            FileHeader::new("Acme", "Line Control", "1.0"),
            ContentHeader::new("Plant"),
        );
        project.types_mut().pous.push(Pou::new("Main", PouType::Program));

        assert!(project.pou("Main").is_some());
        assert!(project.pou("Other").is_none());
        assert!(project.data_type("Main").is_none());
    }

    #[test]
    fn serialize_when_header_without_optionals_then_keys_absent() {
        let mut header = FileHeader::new("Acme", "Line Control", "1.0");
        header.creation_date_time = "2024-01-01T00:00:00Z".parse().unwrap();

        let json = serde_json::to_string(&header).unwrap();
        assert_eq!(
            json,
            r#"{"companyName":"Acme","productName":"Line Control","productVersion":"1.0","creationDateTime":"2024-01-01T00:00:00Z"}"#
        );
    }

    #[test]
    fn serialize_when_company_url_then_schema_spelling() {
        let mut header = FileHeader::new("Acme", "Line Control", "1.0");
        header.company_url = Some("https://acme.example".to_string());

        let json = serde_json::to_value(&header).unwrap();
        assert_eq!(json["companyURL"], "https://acme.example");
    }
}
