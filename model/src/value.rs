//! Initial values. A value is a literal, an array of values or a structure
//! of values, nested to any depth.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    #[serde(rename = "simpleValue")]
    Simple(SimpleValue),
    #[serde(rename = "arrayValue")]
    Array(ArrayValue),
    #[serde(rename = "structValue")]
    Struct(StructValue),
}

impl Value {
    pub fn simple(value: impl Into<String>) -> Self {
        Value::Simple(SimpleValue {
            value: value.into(),
        })
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Value::Simple(_) => "simpleValue",
            Value::Array(_) => "arrayValue",
            Value::Struct(_) => "structValue",
        }
    }
}

/// A literal, interpreted according to the type of the variable it
/// initializes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleValue {
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayValue {
    pub values: Vec<ArrayValueElement>,
}

/// One element of an array value. When `repetition_value` is set the
/// element stands for that many consecutive elements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayValueElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetition_value: Option<u64>,
    pub value: Value,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructValue {
    pub values: Vec<StructValueElement>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructValueElement {
    pub member: String,
    pub value: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_when_nested_array_of_structs_then_builds_tree() {
        let json = r#"{"arrayValue":{"values":[
            {"repetitionValue":2,"value":{"structValue":{"values":[
                {"member":"speed","value":{"simpleValue":{"value":"10"}}}
            ]}}},
            {"value":{"simpleValue":{"value":"0"}}}
        ]}}"#;

        let value: Value = serde_json::from_str(json).unwrap();

        let Value::Array(array) = value else {
            panic!("expected array value");
        };
        assert_eq!(array.values.len(), 2);
        assert_eq!(array.values[0].repetition_value, Some(2));
        assert_eq!(array.values[1].repetition_value, None);
        assert_eq!(array.values[1].value, Value::simple("0"));
        assert_eq!(array.values[0].value.tag(), "structValue");
    }

    #[test]
    fn serialize_when_no_repetition_then_omits_key() {
        let element = ArrayValueElement {
            repetition_value: None,
            value: Value::simple("TRUE"),
        };
        let json = serde_json::to_string(&element).unwrap();
        assert_eq!(json, r#"{"value":{"simpleValue":{"value":"TRUE"}}}"#);
    }
}
