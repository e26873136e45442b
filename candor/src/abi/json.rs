//! The JSON ABI, as emitted by the Solidity compiler
//!
//! https://docs.soliditylang.org/en/latest/abi-spec.html#json
use super::param_type::{parse_array_suffixes, Cursor, ParamKind, ParamType};
use super::signature::{Fragment, FragmentKind, StateMutability};
use crate::error::Error;
use serde::de::{Deserialize, Deserializer, SeqAccess, Visitor};
use std::fmt;

/// A single function, event or constructor input or output
#[derive(Deserialize, PartialEq, Debug)]
pub struct Input {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default = "Vec::new")]
    pub components: Vec<Input>,
    #[serde(default)]
    pub indexed: bool,
}

/// The JSON format for a contract’s interface is given by an array of
/// function and/or event descriptions
#[derive(Deserialize, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(rename = "type", default)]
    pub operation: FragmentKind,
    pub name: Option<String>,
    #[serde(default)]
    pub payable: bool,
    #[serde(default)]
    pub constant: bool,
    pub state_mutability: Option<StateMutability>,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub inputs: Vec<Input>,
    #[serde(default)]
    pub outputs: Vec<Input>,
}

/// A whole JSON ABI document
pub struct Contract {
    pub items: Vec<Item>,
}

impl Contract {
    pub fn from_json(json: &str) -> Result<Contract, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validates every item and turns it into a [Fragment]
    pub fn fragments(&self) -> Result<Vec<Fragment>, Error> {
        self.items.iter().map(Item::to_fragment).collect()
    }
}

impl<'de> Deserialize<'de> for Contract {
    fn deserialize<D>(deserializer: D) -> Result<Contract, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(ContractVisitor)
    }
}

struct ContractVisitor;

impl<'a> Visitor<'a> for ContractVisitor {
    type Value = Contract;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("valid abi spec file")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'a>,
    {
        let mut result = Contract { items: Vec::new() };
        while let Some(item) = seq.next_element()? {
            result.items.push(item)
        }

        Ok(result)
    }
}

impl Input {
    /// Builds the typed parameter, tuple types take their members from `components`
    pub fn to_param(&self) -> Result<ParamType, Error> {
        let ty = match self.type_.strip_prefix("tuple") {
            Some(suffix) => {
                if self.components.is_empty() {
                    return Err(Error::InvalidAbiJson(format!(
                        "{}: tuple types require components",
                        self.name
                    )));
                }
                let components = self
                    .components
                    .iter()
                    .map(Input::to_param)
                    .collect::<Result<Vec<_>, _>>()?;
                let mut ty = ParamType::new(ParamKind::Tuple(components));
                let mut cursor = Cursor::new(suffix);
                parse_array_suffixes(&mut cursor, &mut ty)?;
                if !cursor.at_end() {
                    return Err(Error::InvalidAbiType(self.type_.clone()));
                }
                ty
            }
            None => ParamType::parse(&self.type_)?,
        };
        Ok(ty.with_name(self.name.as_str()).with_indexed(self.indexed))
    }
}

impl Item {
    pub fn to_fragment(&self) -> Result<Fragment, Error> {
        let name = match (self.operation, &self.name) {
            (FragmentKind::Function, Some(name))
            | (FragmentKind::Event, Some(name))
            | (FragmentKind::Error, Some(name)) => name.clone(),
            (FragmentKind::Function, None)
            | (FragmentKind::Event, None)
            | (FragmentKind::Error, None) => {
                return Err(Error::InvalidAbiJson(format!(
                    "{:?} without a name",
                    self.operation
                )))
            }
            _ => String::new(),
        };
        let inputs = self
            .inputs
            .iter()
            .map(Input::to_param)
            .collect::<Result<Vec<_>, _>>()?;
        let outputs = self
            .outputs
            .iter()
            .map(Input::to_param)
            .collect::<Result<Vec<_>, _>>()?;
        // older compilers only emit the constant and payable flags
        let state_mutability = match self.state_mutability {
            Some(m) => m,
            None if self.constant => StateMutability::View,
            None if self.payable => StateMutability::Payable,
            None => StateMutability::NonPayable,
        };
        Ok(Fragment::new(self.operation, name, inputs, outputs)?
            .with_anonymous(self.anonymous)
            .with_state_mutability(state_mutability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::parse_signature;

    const SOLIDITY_DOCS_ABI: &str = r#"[
  {
    "constant": true,
    "inputs": [
      { "name": "", "type": "bytes" },
      { "name": "", "type": "bool" },
      { "name": "", "type": "uint256[]" }
    ],
    "name": "sam",
    "outputs": [],
    "payable": false,
    "stateMutability": "pure",
    "type": "function"
  },
  {
    "constant": true,
    "inputs": [
      { "name": "x", "type": "uint32" },
      { "name": "y", "type": "bool" }
    ],
    "name": "baz",
    "outputs": [ { "name": "r", "type": "bool" } ],
    "payable": false,
    "type": "function"
  },
  {
    "inputs": [ { "name": "", "type": "bytes3[2]" } ],
    "name": "bar",
    "outputs": [],
    "type": "function"
  },
  {
    "anonymous": false,
    "inputs": [
      { "indexed": true, "name": "from", "type": "address" },
      { "indexed": false, "name": "amount", "type": "uint256" }
    ],
    "name": "Deposit",
    "type": "event"
  },
  {
    "inputs": [
      {
        "components": [
          { "name": "owner", "type": "address" },
          { "name": "values", "type": "uint256[]" }
        ],
        "name": "config",
        "type": "tuple[]"
      }
    ],
    "stateMutability": "payable",
    "type": "constructor"
  },
  { "stateMutability": "payable", "type": "receive" }
]"#;

    #[test]
    fn decode_contract() {
        let contract = Contract::from_json(SOLIDITY_DOCS_ABI).unwrap();
        assert_eq!(contract.items.len(), 6);
        assert_eq!(contract.items[0].operation, FragmentKind::Function);
        assert_eq!(
            contract.items[0].state_mutability,
            Some(StateMutability::Pure)
        );
        assert_eq!(contract.items[0].inputs[2].type_, "uint256[]");
        assert_eq!(contract.items[5].operation, FragmentKind::Receive);

        let fragments = contract.fragments().unwrap();
        assert_eq!(fragments[0].signature(), "sam(bytes,bool,uint256[])");
        // the constant flag of old compilers means view
        assert_eq!(fragments[1].state_mutability(), StateMutability::View);
        assert_eq!(
            fragments[1],
            parse_signature("function baz(uint32 x, bool y) view returns (bool r)").unwrap()
        );
        assert_eq!(fragments[2].signature(), "bar(bytes3[2])");
        assert!(fragments[3].inputs()[0].is_indexed());
        assert_eq!(fragments[4].kind(), FragmentKind::Constructor);
        assert_eq!(fragments[4].inputs()[0].canonical(), "(address,uint256[])[]");
        assert_eq!(fragments[4].inputs()[0].name(), Some("config"));
    }

    #[test]
    fn tuple_without_components() {
        let json = r#"[{"type":"function","name":"f","inputs":[{"name":"a","type":"tuple"}]}]"#;
        let contract = Contract::from_json(json).unwrap();
        assert!(matches!(
            contract.fragments(),
            Err(Error::InvalidAbiJson(_))
        ));
    }

    #[test]
    fn indexed_outside_event() {
        let json = r#"[{"type":"function","name":"f","inputs":[{"name":"a","type":"uint8","indexed":true}]}]"#;
        let contract = Contract::from_json(json).unwrap();
        assert!(contract.fragments().is_err());
    }

    #[test]
    fn missing_type_is_function() {
        let json = r#"[{"name":"f","inputs":[]}]"#;
        let contract = Contract::from_json(json).unwrap();
        assert_eq!(contract.fragments().unwrap()[0].signature(), "f()");
    }

    #[test]
    fn unknown_operation() {
        assert!(Contract::from_json(r#"[{"type":"asdf","name":"f","inputs":[]}]"#).is_err());
        assert!(Contract::from_json(r#"{"type":"function"}"#).is_err());
        let e: Result<StateMutability, _> = serde_json::from_str(r#"123"#);
        assert!(e.is_err());
    }
}
