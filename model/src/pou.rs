//! Program organization units and their interfaces.

use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::text::FormattedText;
use crate::types::DataType;
use crate::value::Value;

token_enum! {
    /// The kind of a POU. A function must declare a return type and a
    /// program must not.
    pub enum PouType {
        Function => "function",
        FunctionBlock => "functionBlock",
        Program => "program",
    }
}

token_enum! {
    /// The scope in which the variables of a [`VarList`] are declared.
    /// Every role holds the same kind of list.
    pub enum VarRole {
        Local => "localVars",
        Temp => "tempVars",
        Input => "inputVars",
        Output => "outputVars",
        InOut => "inOutVars",
        External => "externalVars",
        Global => "globalVars",
        Access => "accessVars",
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pou {
    pub name: String,
    pub pou_type: PouType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<Interface>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<Transition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

impl Pou {
    pub fn new(name: impl Into<String>, pou_type: PouType) -> Self {
        Self {
            name: name.into(),
            pou_type,
            interface: None,
            actions: Vec::new(),
            transitions: Vec::new(),
            body: None,
            documentation: None,
        }
    }

    /// Returns the interface, creating an empty one when there is none.
    pub fn interface_mut(&mut self) -> &mut Interface {
        self.interface.get_or_insert_with(Interface::default)
    }

    pub fn return_type(&self) -> Option<&DataType> {
        self.interface.as_ref().and_then(|i| i.return_type.as_ref())
    }
}

/// The declared variables of a POU.
///
/// Each role holds at most one list. A role that is not declared is `None`,
/// which is different from a declared but empty list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_vars: Option<VarList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_vars: Option<VarList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_vars: Option<VarList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_vars: Option<VarList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_out_vars: Option<VarList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_vars: Option<VarList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_vars: Option<VarList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_vars: Option<VarList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

impl Interface {
    pub fn var_list(&self, role: VarRole) -> Option<&VarList> {
        match role {
            VarRole::Local => self.local_vars.as_ref(),
            VarRole::Temp => self.temp_vars.as_ref(),
            VarRole::Input => self.input_vars.as_ref(),
            VarRole::Output => self.output_vars.as_ref(),
            VarRole::InOut => self.in_out_vars.as_ref(),
            VarRole::External => self.external_vars.as_ref(),
            VarRole::Global => self.global_vars.as_ref(),
            VarRole::Access => self.access_vars.as_ref(),
        }
    }

    pub fn var_list_mut(&mut self, role: VarRole) -> &mut Option<VarList> {
        match role {
            VarRole::Local => &mut self.local_vars,
            VarRole::Temp => &mut self.temp_vars,
            VarRole::Input => &mut self.input_vars,
            VarRole::Output => &mut self.output_vars,
            VarRole::InOut => &mut self.in_out_vars,
            VarRole::External => &mut self.external_vars,
            VarRole::Global => &mut self.global_vars,
            VarRole::Access => &mut self.access_vars,
        }
    }

    /// Sets the list for the role and returns the list it replaced.
    pub fn set_var_list(&mut self, role: VarRole, list: VarList) -> Option<VarList> {
        self.var_list_mut(role).replace(list)
    }

    /// Returns the declared lists in role order.
    pub fn var_lists(&self) -> impl Iterator<Item = (VarRole, &VarList)> + '_ {
        VarRole::ALL
            .iter()
            .filter_map(move |role| self.var_list(*role).map(|list| (*role, list)))
    }
}

/// An ordered list of variables. Names are unique within one list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VarList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retain: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonretain: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

impl VarList {
    pub fn new(variables: Vec<Variable>) -> Self {
        Self {
            variables,
            ..Default::default()
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub var_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

impl Variable {
    pub fn new(name: impl Into<String>, var_type: DataType) -> Self {
        Self {
            name: name.into(),
            address: None,
            var_type,
            initial_value: None,
            documentation: None,
        }
    }

    pub fn with_initial_value(mut self, value: Value) -> Self {
        self.initial_value = Some(value);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub body: Body,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub name: String,
    pub body: Body,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<FormattedText>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_list_when_role_not_declared_then_none() {
        let mut interface = Interface::default();
        interface.set_var_list(VarRole::Input, VarList::default());

        assert!(interface.var_list(VarRole::Input).is_some());
        assert!(interface.var_list(VarRole::Output).is_none());
    }

    #[test]
    fn var_lists_when_several_roles_then_in_role_order() {
        let mut interface = Interface::default();
        interface.set_var_list(
            VarRole::External,
            VarList::new(vec![Variable::new("x", DataType::Int)]),
        );
        interface.set_var_list(
            VarRole::Local,
            VarList::new(vec![Variable::new("x", DataType::Int)]),
        );

        let roles: Vec<VarRole> = interface.var_lists().map(|(role, _)| role).collect();
        assert_eq!(roles, vec![VarRole::Local, VarRole::External]);
    }

    #[test]
    fn set_var_list_when_replacing_then_returns_previous() {
        let mut interface = Interface::default();
        interface.set_var_list(
            VarRole::Temp,
            VarList::new(vec![Variable::new("a", DataType::Bool)]),
        );

        let previous = interface.set_var_list(VarRole::Temp, VarList::default());
        assert_eq!(previous.unwrap().variables.len(), 1);
    }

    #[test]
    fn from_tag_when_role_tag_then_role() {
        assert_eq!(VarRole::from_tag("inOutVars"), Some(VarRole::InOut));
        assert_eq!(VarRole::from_tag("InOutVars"), None);
        assert_eq!(VarRole::ALL.len(), 8);
    }

    #[test]
    fn serialize_when_function_block_then_camel_case_token() {
        let json = serde_json::to_string(&PouType::FunctionBlock).unwrap();
        assert_eq!(json, "\"functionBlock\"");
    }

    #[test]
    fn serialize_when_variable_then_type_key() {
        let json = serde_json::to_string(&Variable::new("run", DataType::Bool)).unwrap();
        assert_eq!(json, r#"{"name":"run","type":"BOOL"}"#);
    }
}
