//! Data types: named declarations and the data type choice group.

use serde::{Deserialize, Serialize};

use crate::pou::Variable;
use crate::text::FormattedText;
use crate::value::Value;

/// A named data type declared in `types/dataTypes`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTypeDecl {
    pub name: String,
    pub base_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

impl DataTypeDecl {
    pub fn new(name: impl Into<String>, base_type: DataType) -> Self {
        Self {
            name: name.into(),
            base_type,
            initial_value: None,
            documentation: None,
        }
    }
}

/// Exactly one of the elementary or composite data types.
///
/// The elementary types carry no content and are identified by their tag
/// alone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "BOOL")]
    Bool,
    #[serde(rename = "BYTE")]
    Byte,
    #[serde(rename = "WORD")]
    Word,
    #[serde(rename = "DWORD")]
    DWord,
    #[serde(rename = "LWORD")]
    LWord,
    #[serde(rename = "SINT")]
    SInt,
    #[serde(rename = "INT")]
    Int,
    #[serde(rename = "DINT")]
    DInt,
    #[serde(rename = "LINT")]
    LInt,
    #[serde(rename = "USINT")]
    USInt,
    #[serde(rename = "UINT")]
    UInt,
    #[serde(rename = "UDINT")]
    UDInt,
    #[serde(rename = "ULINT")]
    ULInt,
    #[serde(rename = "REAL")]
    Real,
    #[serde(rename = "LREAL")]
    LReal,
    #[serde(rename = "TIME")]
    Time,
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "DT")]
    DateAndTime,
    #[serde(rename = "TOD")]
    TimeOfDay,

    #[serde(rename = "string")]
    String(StringType),
    #[serde(rename = "wstring")]
    WString(StringType),
    #[serde(rename = "array")]
    Array(Box<ArrayType>),
    #[serde(rename = "derived")]
    Derived(DerivedType),
    #[serde(rename = "enum")]
    Enum(EnumType),
    #[serde(rename = "pointer")]
    Pointer(Box<PointerType>),
    #[serde(rename = "struct")]
    Struct(StructType),
    #[serde(rename = "subrangeSigned")]
    SubrangeSigned(Box<SubrangeSigned>),
    #[serde(rename = "subrangeUnsigned")]
    SubrangeUnsigned(Box<SubrangeUnsigned>),
}

const ELEMENTARY: &[(&str, DataType)] = &[
    ("BOOL", DataType::Bool),
    ("BYTE", DataType::Byte),
    ("WORD", DataType::Word),
    ("DWORD", DataType::DWord),
    ("LWORD", DataType::LWord),
    ("SINT", DataType::SInt),
    ("INT", DataType::Int),
    ("DINT", DataType::DInt),
    ("LINT", DataType::LInt),
    ("USINT", DataType::USInt),
    ("UINT", DataType::UInt),
    ("UDINT", DataType::UDInt),
    ("ULINT", DataType::ULInt),
    ("REAL", DataType::Real),
    ("LREAL", DataType::LReal),
    ("TIME", DataType::Time),
    ("DATE", DataType::Date),
    ("DT", DataType::DateAndTime),
    ("TOD", DataType::TimeOfDay),
];

impl DataType {
    /// Returns the elementary type with the tag, or `None` if the tag is
    /// not an elementary type.
    pub fn from_elementary_tag(tag: &str) -> Option<DataType> {
        ELEMENTARY
            .iter()
            .find(|(name, _)| *name == tag)
            .map(|(_, data_type)| data_type.clone())
    }

    pub fn is_elementary(&self) -> bool {
        ELEMENTARY.iter().any(|(_, data_type)| data_type == self)
    }

    /// Returns the wire tag of the alternative.
    pub fn tag(&self) -> &'static str {
        match self {
            DataType::Bool => "BOOL",
            DataType::Byte => "BYTE",
            DataType::Word => "WORD",
            DataType::DWord => "DWORD",
            DataType::LWord => "LWORD",
            DataType::SInt => "SINT",
            DataType::Int => "INT",
            DataType::DInt => "DINT",
            DataType::LInt => "LINT",
            DataType::USInt => "USINT",
            DataType::UInt => "UINT",
            DataType::UDInt => "UDINT",
            DataType::ULInt => "ULINT",
            DataType::Real => "REAL",
            DataType::LReal => "LREAL",
            DataType::Time => "TIME",
            DataType::Date => "DATE",
            DataType::DateAndTime => "DT",
            DataType::TimeOfDay => "TOD",
            DataType::String(_) => "string",
            DataType::WString(_) => "wstring",
            DataType::Array(_) => "array",
            DataType::Derived(_) => "derived",
            DataType::Enum(_) => "enum",
            DataType::Pointer(_) => "pointer",
            DataType::Struct(_) => "struct",
            DataType::SubrangeSigned(_) => "subrangeSigned",
            DataType::SubrangeUnsigned(_) => "subrangeUnsigned",
        }
    }

    pub fn derived(name: impl Into<String>) -> Self {
        DataType::Derived(DerivedType { name: name.into() })
    }

    pub fn array(dimensions: Vec<RangeSigned>, base_type: DataType) -> Self {
        DataType::Array(Box::new(ArrayType {
            dimensions,
            base_type,
        }))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSigned {
    pub lower: i64,
    pub upper: i64,
}

impl RangeSigned {
    pub fn new(lower: i64, upper: i64) -> Self {
        Self { lower, upper }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeUnsigned {
    pub lower: u64,
    pub upper: u64,
}

/// Dimensions are kept in declaration order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayType {
    pub dimensions: Vec<RangeSigned>,
    pub base_type: DataType,
}

/// Refers to another named type by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedType {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumType {
    pub values: Vec<EnumValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<Box<DataType>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

impl EnumValue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documentation: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerType {
    pub base_type: DataType,
}

/// Members of a structure. Member names are unique within the structure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StructType {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubrangeSigned {
    pub range: RangeSigned,
    pub base_type: DataType,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubrangeUnsigned {
    pub range: RangeUnsigned,
    pub base_type: DataType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_elementary_tag_when_every_tag_then_round_trips_through_tag() {
        for (tag, _) in ELEMENTARY {
            let data_type = DataType::from_elementary_tag(tag).unwrap();
            assert_eq!(data_type.tag(), *tag);
            assert!(data_type.is_elementary());
        }
        assert_eq!(ELEMENTARY.len(), 19);
    }

    #[test]
    fn from_elementary_tag_when_composite_tag_then_none() {
        assert_eq!(DataType::from_elementary_tag("array"), None);
        assert_eq!(DataType::from_elementary_tag("bool"), None);
    }

    #[test]
    fn is_elementary_when_derived_then_false() {
        assert!(!DataType::derived("T_MOTOR").is_elementary());
    }

    #[test]
    fn serialize_when_array_of_real_then_keeps_dimension_order() {
        let data_type = DataType::array(
            vec![RangeSigned::new(1, 5), RangeSigned::new(0, 9)],
            DataType::Real,
        );

        let json = serde_json::to_string(&data_type).unwrap();
        assert_eq!(
            json,
            r#"{"array":{"dimensions":[{"lower":1,"upper":5},{"lower":0,"upper":9}],"baseType":"REAL"}}"#
        );
    }

    #[test]
    fn serialize_when_string_without_length_then_omits_length() {
        let json = serde_json::to_string(&DataType::String(StringType::default())).unwrap();
        assert_eq!(json, r#"{"string":{}}"#);
    }
}
