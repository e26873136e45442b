//! Fragments, the functions, events and constructors of a contract interface,
//! and the parser for their human readable form
//!
//! ```text
//! function transfer(address to, uint256 amount) returns (bool)
//! balanceOf(address) view returns (uint256)
//! event Transfer(address indexed from, address indexed to, uint256 value)
//! constructor(string symbol) payable
//! ```
use super::param_type::{parse_param_list, Cursor, ParamType};
use crate::error::Error;
use crate::utils::keccak256;
use serde::de::{self, Deserialize, Deserializer, Unexpected, Visitor};
use std::fmt;

/// Deserializes "type" value from the ABI JSON spec
///
/// https://docs.soliditylang.org/en/latest/abi-spec.html#json
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    #[default]
    Function,
    Constructor,
    Event,
    Fallback,
    Receive,
    /// custom error declarations, newer compilers emit these in their ABI output
    Error,
}

impl<'de> Deserialize<'de> for FragmentKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(FragmentKindVisitor)
    }
}

struct FragmentKindVisitor;

impl<'de> Visitor<'de> for FragmentKindVisitor {
    type Value = FragmentKind;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a string")
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        match s {
            "function" => Ok(FragmentKind::Function),
            "constructor" => Ok(FragmentKind::Constructor),
            "event" => Ok(FragmentKind::Event),
            "fallback" => Ok(FragmentKind::Fallback),
            "receive" => Ok(FragmentKind::Receive),
            "error" => Ok(FragmentKind::Error),
            _ => Err(de::Error::invalid_value(Unexpected::Str(s), &self)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StateMutability {
    /// Specified to not read blockchain state
    Pure,
    /// Specified to not modify the blockchain state
    View,
    /// Function does not accept ether
    #[default]
    NonPayable,
    /// Function accepts ether
    Payable,
}

impl StateMutability {
    fn from_keyword(s: &str) -> Option<StateMutability> {
        match s {
            "pure" => Some(StateMutability::Pure),
            "view" | "constant" => Some(StateMutability::View),
            "nonpayable" => Some(StateMutability::NonPayable),
            "payable" => Some(StateMutability::Payable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StateMutability::Pure => "pure",
            StateMutability::View => "view",
            StateMutability::NonPayable => "nonpayable",
            StateMutability::Payable => "payable",
        }
    }
}

impl<'de> Deserialize<'de> for StateMutability {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(StateMutabilityVisitor)
    }
}

struct StateMutabilityVisitor;

impl<'de> Visitor<'de> for StateMutabilityVisitor {
    type Value = StateMutability;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a string")
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        StateMutability::from_keyword(s)
            .ok_or_else(|| de::Error::invalid_value(Unexpected::Str(s), &self))
    }
}

/// A parsed function, event or constructor
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fragment {
    pub(crate) name: String,
    pub(crate) kind: FragmentKind,
    pub(crate) inputs: Vec<ParamType>,
    pub(crate) outputs: Vec<ParamType>,
    pub(crate) anonymous: bool,
    pub(crate) state_mutability: StateMutability,
}

impl Fragment {
    /// Builds a fragment out of already parsed parts, checking that only
    /// event inputs are flagged as indexed
    pub fn new(
        kind: FragmentKind,
        name: impl Into<String>,
        inputs: Vec<ParamType>,
        outputs: Vec<ParamType>,
    ) -> Result<Fragment, Error> {
        let name = name.into();
        if kind != FragmentKind::Event && inputs.iter().any(|i| i.is_indexed()) {
            return Err(Error::InvalidSignature(format!(
                "{name}: indexed is only allowed on event inputs"
            )));
        }
        Ok(Fragment {
            name,
            kind,
            inputs,
            outputs,
            anonymous: false,
            state_mutability: StateMutability::NonPayable,
        })
    }

    pub fn with_state_mutability(mut self, state_mutability: StateMutability) -> Fragment {
        self.state_mutability = state_mutability;
        self
    }

    pub fn with_anonymous(mut self, anonymous: bool) -> Fragment {
        self.anonymous = anonymous;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    pub fn inputs(&self) -> &[ParamType] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ParamType] {
        &self.outputs
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    pub fn state_mutability(&self) -> StateMutability {
        self.state_mutability
    }

    /// The canonical signature, `name(type1,type2)`, that selectors and topics hash
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(|i| i.canonical()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// First 4 bytes of the hash of the signature, prefixes call data
    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature().as_bytes());
        let mut result: [u8; 4] = Default::default();
        result.copy_from_slice(&hash[0..4]);
        result
    }

    /// Full hash of the signature, the first topic of a non anonymous event
    pub fn topic(&self) -> [u8; 32] {
        keccak256(self.signature().as_bytes())
    }

    /// A human readable declaration, parses back into the same fragment
    pub fn format(&self) -> String {
        let params = |list: &[ParamType]| {
            list.iter()
                .map(|p| p.format())
                .collect::<Vec<String>>()
                .join(", ")
        };
        let mut out = match self.kind {
            FragmentKind::Constructor => format!("constructor({})", params(&self.inputs)),
            FragmentKind::Event => format!("event {}({})", self.name, params(&self.inputs)),
            _ => format!("function {}({})", self.name, params(&self.inputs)),
        };
        if self.anonymous {
            out.push_str(" anonymous");
        }
        if self.state_mutability != StateMutability::NonPayable {
            out.push(' ');
            out.push_str(self.state_mutability.as_str());
        }
        if !self.outputs.is_empty() {
            out.push_str(&format!(" returns ({})", params(&self.outputs)));
        }
        out
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

fn invalid_signature(cursor: &Cursor) -> Error {
    Error::InvalidSignature(cursor.source().to_string())
}

fn valid_name(name: &str) -> bool {
    match name.bytes().next() {
        Some(first) => !first.is_ascii_digit(),
        None => false,
    }
}

/// Parses a human readable fragment, a leading `function` keyword is optional
pub fn parse_signature(fragment: &str) -> Result<Fragment, Error> {
    let mut cursor = Cursor::new(fragment);
    cursor.skip_ws();
    let first = cursor.ident();
    cursor.skip_ws();

    let (kind, name) = match first {
        "event" => (FragmentKind::Event, cursor.ident()),
        "function" => (FragmentKind::Function, cursor.ident()),
        "constructor" => (FragmentKind::Constructor, ""),
        _ => (FragmentKind::Function, first),
    };
    if kind != FragmentKind::Constructor && !valid_name(name) {
        return Err(invalid_signature(&cursor));
    }

    let inputs = parse_param_list(&mut cursor, kind == FragmentKind::Event)?;
    let mut outputs = Vec::new();
    let mut anonymous = false;
    let mut state_mutability = None;

    loop {
        cursor.skip_ws();
        if cursor.at_end() {
            break;
        }
        let keyword = cursor.ident();
        match (kind, keyword) {
            (FragmentKind::Event, "anonymous") if !anonymous => anonymous = true,
            (FragmentKind::Function, "returns") if outputs.is_empty() => {
                outputs = parse_param_list(&mut cursor, false)?;
            }
            (FragmentKind::Function, _) | (FragmentKind::Constructor, _) => {
                match (StateMutability::from_keyword(keyword), state_mutability) {
                    (Some(m), None)
                        if kind == FragmentKind::Function
                            || m == StateMutability::Payable
                            || m == StateMutability::NonPayable =>
                    {
                        state_mutability = Some(m)
                    }
                    _ => return Err(invalid_signature(&cursor)),
                }
            }
            _ => return Err(invalid_signature(&cursor)),
        }
    }

    Ok(Fragment::new(kind, name, inputs, outputs)?
        .with_anonymous(anonymous)
        .with_state_mutability(state_mutability.unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::param_type::ParamKind;
    use crate::error::ErrorKind;
    use crate::utils::bytes_to_hex_str;

    #[test]
    fn plain_function() {
        let f = parse_signature("balanceOf(address)").unwrap();
        assert_eq!(f.kind(), FragmentKind::Function);
        assert_eq!(f.name(), "balanceOf");
        assert_eq!(f.signature(), "balanceOf(address)");
        assert_eq!(bytes_to_hex_str(&f.selector()), "70a08231");
    }

    #[test]
    fn documented_selectors() {
        // https://docs.soliditylang.org/en/latest/abi-spec.html#examples
        for (sig, selector) in [
            ("baz(uint32,bool)", "cdcd77c0"),
            ("bar(bytes3[2])", "fce353f6"),
            ("sam(bytes,bool,uint256[])", "a5643bf2"),
            ("f(uint256,uint32[],bytes10,bytes)", "8be65246"),
            ("function transfer(address to, uint amount)", "a9059cbb"),
        ] {
            let f = parse_signature(sig).unwrap();
            assert_eq!(bytes_to_hex_str(&f.selector()), selector, "{sig}");
        }
    }

    #[test]
    fn function_with_modifiers() {
        let f = parse_signature(
            "function totalSupply() external_is_not_a_keyword returns (uint256)",
        );
        assert!(f.is_err());

        let f = parse_signature("function totalSupply() constant returns (uint256 supply)")
            .unwrap();
        assert_eq!(f.state_mutability(), StateMutability::View);
        assert_eq!(f.outputs().len(), 1);
        assert_eq!(f.outputs()[0].name(), Some("supply"));

        let f = parse_signature("deposit() payable").unwrap();
        assert_eq!(f.state_mutability(), StateMutability::Payable);

        assert!(parse_signature("deposit() payable view").is_err());
        assert!(parse_signature("f() returns (bool) returns (bool)").is_err());
    }

    #[test]
    fn events() {
        let e = parse_signature(
            "event Transfer(address indexed from, address indexed to, uint256 value)",
        )
        .unwrap();
        assert_eq!(e.kind(), FragmentKind::Event);
        assert!(e.inputs()[0].is_indexed());
        assert!(!e.inputs()[2].is_indexed());
        assert_eq!(
            bytes_to_hex_str(&e.topic()),
            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
        let e = parse_signature("event Ping(string) anonymous").unwrap();
        assert!(e.is_anonymous());
        assert!(parse_signature("event Ping(string) view").is_err());
    }

    #[test]
    fn indexed_only_on_events() {
        let e = parse_signature("function f(uint256 indexed a)").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn constructors() {
        let c = parse_signature("constructor(string symbol, uint8 decimals) payable").unwrap();
        assert_eq!(c.kind(), FragmentKind::Constructor);
        assert_eq!(c.inputs().len(), 2);
        assert_eq!(c.state_mutability(), StateMutability::Payable);
        assert!(parse_signature("constructor() view").is_err());
    }

    #[test]
    fn tuple_params() {
        let f = parse_signature(
            "exactInputSingle((address,address,uint24,address,uint256,uint256,uint256,uint160))",
        )
        .unwrap();
        assert!(matches!(f.inputs()[0].kind(), ParamKind::Tuple(c) if c.len() == 8));
        assert_eq!(bytes_to_hex_str(&f.selector()), "414bf389");
    }

    #[test]
    fn malformed() {
        for bad in [
            "",
            "f",
            "f(",
            "1f()",
            "f(uint256",
            "f(uint256) returns",
            "f(uint256) returns (",
            "event (uint256)",
            "f(uint256) garbage",
        ] {
            assert!(parse_signature(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn format_reparses() {
        for sig in [
            "function transfer(address to, uint256 amount) returns (bool)",
            "function get() view returns (tuple(uint256 a, string b)[] list)",
            "event Transfer(address indexed from, address indexed to, uint256 value)",
            "event Raw(bytes) anonymous",
            "constructor(string name) payable",
            "f(uint256[2][] grid) pure",
        ] {
            let f = parse_signature(sig).unwrap();
            assert_eq!(parse_signature(&f.format()).unwrap(), f, "{sig}");
        }
    }
}
