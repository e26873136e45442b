//! Binds a set of parsed fragments to their selectors and topics
//!
//! An [Interface] is built once and only read afterwards, it encodes call data
//! for its functions, decodes their results and turns raw logs back into
//! event values.
use super::coder::{decode, encode};
use super::json::Contract;
use super::param_type::{ParamKind, ParamType};
use super::signature::{parse_signature, Fragment, FragmentKind};
use super::token::AbiToken;
use crate::error::Error;
use crate::utils::keccak256;
use std::collections::HashMap;

/// Stand in for the value of an indexed dynamic event input, only its hash
/// is stored in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Indexed {
    pub hash: [u8; 32],
}

/// A single decoded event input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogValue {
    Token(AbiToken),
    Indexed(Indexed),
}

impl LogValue {
    pub fn as_token(&self) -> Option<&AbiToken> {
        match self {
            LogValue::Token(t) => Some(t),
            LogValue::Indexed(_) => None,
        }
    }
}

/// An event matched and decoded out of a log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDescription {
    pub name: String,
    pub signature: String,
    pub topic: [u8; 32],
    /// One value per event input, in declaration order
    pub values: Vec<LogValue>,
}

/// A function call matched and decoded out of call data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDescription {
    pub name: String,
    pub signature: String,
    pub selector: [u8; 4],
    pub args: Vec<AbiToken>,
}

#[derive(Debug, Clone, Default)]
pub struct Interface {
    functions: Vec<Fragment>,
    events: Vec<Fragment>,
    constructor: Option<Fragment>,
    function_names: HashMap<String, usize>,
    function_signatures: HashMap<String, usize>,
    selectors: HashMap<[u8; 4], usize>,
    event_names: HashMap<String, usize>,
    event_signatures: HashMap<String, usize>,
    topics: HashMap<[u8; 32], usize>,
}

impl Interface {
    /// Indexes `fragments`, repeating a signature is an error. Fallback,
    /// receive and error fragments carry nothing to encode and are skipped.
    pub fn new(fragments: Vec<Fragment>) -> Result<Interface, Error> {
        let mut res = Interface::default();
        for fragment in fragments {
            match fragment.kind() {
                FragmentKind::Function => res.add_function(fragment)?,
                FragmentKind::Event => res.add_event(fragment)?,
                FragmentKind::Constructor => {
                    if res.constructor.is_some() {
                        return Err(Error::DuplicateFragment("constructor".to_string()));
                    }
                    res.constructor = Some(fragment);
                }
                other => debug!("Skipping {:?} fragment {}", other, fragment.name()),
            }
        }
        debug!(
            "Built interface with {} functions and {} events",
            res.functions.len(),
            res.events.len()
        );
        Ok(res)
    }

    /// Builds an interface out of a JSON ABI document
    pub fn from_json(json: &str) -> Result<Interface, Error> {
        Interface::new(Contract::from_json(json)?.fragments()?)
    }

    /// Builds an interface out of human readable fragments such as
    /// `function transfer(address to, uint256 amount) returns (bool)`
    pub fn from_signatures(signatures: &[&str]) -> Result<Interface, Error> {
        let fragments = signatures
            .iter()
            .map(|s| parse_signature(s))
            .collect::<Result<Vec<_>, _>>()?;
        Interface::new(fragments)
    }

    fn add_function(&mut self, fragment: Fragment) -> Result<(), Error> {
        let signature = fragment.signature();
        let selector = fragment.selector();
        if self.function_signatures.contains_key(&signature)
            || self.selectors.contains_key(&selector)
        {
            return Err(Error::DuplicateFragment(signature));
        }
        let idx = self.functions.len();
        if self.function_names.contains_key(fragment.name()) {
            debug!("Overloaded function {signature}, name lookups keep the first");
        } else {
            self.function_names.insert(fragment.name().to_string(), idx);
        }
        self.function_signatures.insert(signature, idx);
        self.selectors.insert(selector, idx);
        self.functions.push(fragment);
        Ok(())
    }

    fn add_event(&mut self, fragment: Fragment) -> Result<(), Error> {
        let signature = fragment.signature();
        if self.event_signatures.contains_key(&signature) {
            return Err(Error::DuplicateFragment(signature));
        }
        let idx = self.events.len();
        if self.event_names.contains_key(fragment.name()) {
            debug!("Overloaded event {signature}, name lookups keep the first");
        } else {
            self.event_names.insert(fragment.name().to_string(), idx);
        }
        // anonymous events have no topic to be found by
        if !fragment.is_anonymous() {
            self.topics.insert(fragment.topic(), idx);
        }
        self.event_signatures.insert(signature, idx);
        self.events.push(fragment);
        Ok(())
    }

    pub fn functions(&self) -> &[Fragment] {
        &self.functions
    }

    pub fn events(&self) -> &[Fragment] {
        &self.events
    }

    pub fn constructor(&self) -> Option<&Fragment> {
        self.constructor.as_ref()
    }

    /// Finds a function by name or, when `key` contains parenthesis, by its
    /// signature. Parameter names and whitespace in a signature are ignored.
    pub fn function(&self, key: &str) -> Result<&Fragment, Error> {
        let idx = if key.contains('(') {
            let signature = parse_signature(key)?.signature();
            self.function_signatures.get(&signature)
        } else {
            self.function_names.get(key)
        };
        idx.map(|i| &self.functions[*i])
            .ok_or_else(|| Error::UnknownFunction(key.to_string()))
    }

    /// Finds an event by name or by signature, see [Interface::function]
    pub fn event(&self, key: &str) -> Result<&Fragment, Error> {
        let idx = if key.contains('(') {
            let signature = parse_signature(&format!("event {key}"))?.signature();
            self.event_signatures.get(&signature)
        } else {
            self.event_names.get(key)
        };
        idx.map(|i| &self.events[*i])
            .ok_or_else(|| Error::UnknownEvent(key.to_string()))
    }

    pub fn function_by_selector(&self, selector: [u8; 4]) -> Result<&Fragment, Error> {
        self.selectors
            .get(&selector)
            .map(|i| &self.functions[*i])
            .ok_or(Error::UnknownSelector(selector))
    }

    pub fn event_by_topic(&self, topic: [u8; 32]) -> Result<&Fragment, Error> {
        self.topics
            .get(&topic)
            .map(|i| &self.events[*i])
            .ok_or(Error::UnknownTopic(topic))
    }

    /// Call data for `function`, its selector followed by the encoded arguments
    pub fn encode_function_data(&self, function: &str, args: &[AbiToken]) -> Result<Vec<u8>, Error> {
        let fragment = self.function(function)?;
        let mut out = fragment.selector().to_vec();
        out.extend(encode(fragment.inputs(), args)?);
        Ok(out)
    }

    /// Decodes the data returned by a call to `function`
    pub fn decode_function_result(&self, function: &str, data: &[u8]) -> Result<Vec<AbiToken>, Error> {
        decode(self.function(function)?.outputs(), data)
    }

    /// Matches call data to a function by its selector and decodes the arguments
    pub fn decode_function_data(&self, data: &[u8]) -> Result<CallDescription, Error> {
        if data.len() < 4 {
            return Err(Error::BufferOverrun {
                offset: 0,
                length: 4,
                available: data.len(),
            });
        }
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&data[..4]);
        let fragment = self.function_by_selector(selector)?;
        trace!("Selector {:x?} is {}", selector, fragment.signature());
        Ok(CallDescription {
            name: fragment.name().to_string(),
            signature: fragment.signature(),
            selector,
            args: decode(fragment.inputs(), &data[4..])?,
        })
    }

    /// Deployment payload, the contract bytecode followed by the encoded
    /// constructor arguments
    pub fn encode_deploy(&self, bytecode: &[u8], args: &[AbiToken]) -> Result<Vec<u8>, Error> {
        let mut out = bytecode.to_vec();
        match &self.constructor {
            Some(constructor) => out.extend(encode(constructor.inputs(), args)?),
            None if args.is_empty() => {}
            None => return Err(Error::NoConstructor),
        }
        Ok(out)
    }

    /// Decodes a log, the first topic selects the event
    pub fn parse_log(&self, topics: &[[u8; 32]], data: &[u8]) -> Result<LogDescription, Error> {
        let first = topics.first().ok_or(Error::TopicMismatch {
            expected: 1,
            got: 0,
        })?;
        let event = self.event_by_topic(*first)?;
        decode_log(event, &topics[1..], data)
    }

    /// Decodes a log as the event `name`, the only way to read anonymous events
    pub fn parse_log_for(
        &self,
        name: &str,
        topics: &[[u8; 32]],
        data: &[u8],
    ) -> Result<LogDescription, Error> {
        let event = self.event(name)?;
        if event.is_anonymous() {
            return decode_log(event, topics, data);
        }
        match topics.first() {
            Some(first) if *first == event.topic() => decode_log(event, &topics[1..], data),
            Some(first) => Err(Error::UnknownTopic(*first)),
            None => Err(Error::TopicMismatch {
                expected: 1,
                got: 0,
            }),
        }
    }

    /// Topics filtering for `event`, one optional value per indexed input where
    /// `None` matches anything. Trailing wildcards are dropped.
    pub fn encode_event_topics(
        &self,
        event: &str,
        values: &[Option<AbiToken>],
    ) -> Result<Vec<Option<[u8; 32]>>, Error> {
        let fragment = self.event(event)?;
        let indexed: Vec<&ParamType> = fragment.inputs().iter().filter(|i| i.is_indexed()).collect();
        if values.len() > indexed.len() {
            return Err(Error::UnexpectedArgument {
                expected: indexed.len(),
                got: values.len(),
            });
        }

        let mut topics = Vec::new();
        if !fragment.is_anonymous() {
            topics.push(Some(fragment.topic()));
        }
        for (ty, value) in indexed.into_iter().zip(values) {
            topics.push(match value {
                Some(v) => Some(topic_word(ty, v)?),
                None => None,
            });
        }
        while let Some(None) = topics.last() {
            topics.pop();
        }
        Ok(topics)
    }
}

fn topic_word(ty: &ParamType, value: &AbiToken) -> Result<[u8; 32], Error> {
    match (ty.kind(), value) {
        (ParamKind::String, AbiToken::String(s)) => Ok(keccak256(s.as_bytes())),
        (ParamKind::Bytes, AbiToken::UnboundedBytes(b))
        | (ParamKind::Bytes, AbiToken::Bytes(b)) => Ok(keccak256(b)),
        (ParamKind::Array(_), _) | (ParamKind::FixedArray(..), _) | (ParamKind::Tuple(_), _) => {
            Err(Error::UnsupportedOperation(format!(
                "filtering on indexed {}",
                ty.canonical()
            )))
        }
        _ => {
            let encoded = encode(std::slice::from_ref(ty), std::slice::from_ref(value))?;
            let mut word = [0u8; 32];
            word.copy_from_slice(&encoded);
            Ok(word)
        }
    }
}

// `topics` excludes the event topic itself
fn decode_log(event: &Fragment, topics: &[[u8; 32]], data: &[u8]) -> Result<LogDescription, Error> {
    let indexed_count = event.inputs().iter().filter(|i| i.is_indexed()).count();
    if topics.len() != indexed_count {
        let first = usize::from(!event.is_anonymous());
        return Err(Error::TopicMismatch {
            expected: indexed_count + first,
            got: topics.len() + first,
        });
    }

    let plain: Vec<ParamType> = event
        .inputs()
        .iter()
        .filter(|i| !i.is_indexed())
        .cloned()
        .collect();
    let mut plain_values = decode(&plain, data)?.into_iter();
    let mut topic_values = topics.iter();

    let mut values = Vec::with_capacity(event.inputs().len());
    for input in event.inputs() {
        let value = if input.is_indexed() {
            let topic = topic_values.next().ok_or(Error::TopicMismatch {
                expected: indexed_count,
                got: topics.len(),
            })?;
            if input.is_hashed_when_indexed() {
                LogValue::Indexed(Indexed { hash: *topic })
            } else {
                let mut decoded = decode(std::slice::from_ref(input), topic)?;
                LogValue::Token(decoded.remove(0))
            }
        } else {
            let token = plain_values.next().ok_or(Error::MissingArgument {
                expected: plain.len(),
                got: 0,
            })?;
            LogValue::Token(token)
        };
        values.push(value);
    }

    Ok(LogDescription {
        name: event.name().to_string(),
        signature: event.signature(),
        topic: event.topic(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::error::ErrorKind;
    use crate::utils::{bytes_to_hex_str, hex_str_to_bytes};
    use num256::Uint256;

    const ERC20: &[&str] = &[
        "function balanceOf(address owner) view returns (uint256)",
        "function transfer(address to, uint256 amount) returns (bool)",
        "function transfer(address to, uint256 amount, bytes data) returns (bool)",
        "event Transfer(address indexed from, address indexed to, uint256 value)",
        "event Named(string indexed name, uint256 indexed id, string note)",
        "event Raw(uint256 indexed a, bool b) anonymous",
        "constructor(string name, uint8 decimals)",
    ];

    fn erc20() -> Interface {
        Interface::from_signatures(ERC20).unwrap()
    }

    fn address() -> Address {
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".parse().unwrap()
    }

    fn padded(address: &Address) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(address.as_bytes());
        word
    }

    fn uint_word(v: u64) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&v.to_be_bytes());
        word
    }

    #[test]
    fn lookups() {
        let iface = erc20();
        assert_eq!(iface.functions().len(), 3);
        assert_eq!(iface.events().len(), 3);
        assert!(iface.constructor().is_some());

        // by name the first overload wins
        assert_eq!(iface.function("transfer").unwrap().inputs().len(), 2);
        let long = iface
            .function("transfer(address, uint256 amount, bytes)")
            .unwrap();
        assert_eq!(long.signature(), "transfer(address,uint256,bytes)");
        assert_eq!(
            iface.function_by_selector([0xa9, 0x05, 0x9c, 0xbb]).unwrap().signature(),
            "transfer(address,uint256)"
        );
        assert_eq!(
            iface.event("Transfer(address,address,uint256)").unwrap().name(),
            "Transfer"
        );
        assert!(matches!(
            iface.function("approve"),
            Err(Error::UnknownFunction(_))
        ));
        assert!(matches!(
            iface.function_by_selector([0; 4]),
            Err(Error::UnknownSelector(_))
        ));
    }

    #[test]
    fn duplicates_rejected() {
        let res = Interface::from_signatures(&["function f(uint256)", "f(uint256 x) view"]);
        assert!(matches!(res, Err(Error::DuplicateFragment(_))));
        let res = Interface::from_signatures(&["event E(uint8)", "event E(uint8 indexed a)"]);
        assert!(matches!(res, Err(Error::DuplicateFragment(_))));
        let res = Interface::from_signatures(&["constructor()", "constructor(uint8)"]);
        assert!(matches!(res, Err(Error::DuplicateFragment(_))));
    }

    #[test]
    fn balance_of_call() {
        let iface = erc20();
        let data = iface
            .encode_function_data("balanceOf", &[address().into()])
            .unwrap();
        assert_eq!(
            bytes_to_hex_str(&data),
            "70a082310000000000000000000000005aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
        );

        let call = iface.decode_function_data(&data).unwrap();
        assert_eq!(call.name, "balanceOf");
        assert_eq!(call.selector, [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(call.args, vec![AbiToken::Address(address())]);

        let result = iface
            .decode_function_result("balanceOf", &uint_word(1000))
            .unwrap();
        assert_eq!(result, vec![AbiToken::Uint(1000u32.into())]);

        assert_eq!(
            iface.decode_function_data(&data[..3]).unwrap_err().kind(),
            ErrorKind::BufferOverrun
        );
        assert_eq!(
            iface
                .encode_function_data("balanceOf", &[])
                .unwrap_err()
                .kind(),
            ErrorKind::MissingArgument
        );
    }

    #[test]
    fn transfer_log() {
        let iface = erc20();
        let to: Address = "0xFB6916095ca1df60bB79Ce92cE3Ea74c37c5d359".parse().unwrap();
        let topics = [
            iface.event("Transfer").unwrap().topic(),
            padded(&address()),
            padded(&to),
        ];
        assert_eq!(
            bytes_to_hex_str(&topics[0]),
            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
        let log = iface.parse_log(&topics, &uint_word(42)).unwrap();
        assert_eq!(log.name, "Transfer");
        assert_eq!(
            log.values,
            vec![
                LogValue::Token(AbiToken::Address(address())),
                LogValue::Token(AbiToken::Address(to)),
                LogValue::Token(AbiToken::Uint(42u8.into())),
            ]
        );

        let e = iface.parse_log(&topics[..2], &uint_word(42)).unwrap_err();
        assert!(matches!(e, Error::TopicMismatch { expected: 3, got: 2 }));
        assert!(iface.parse_log(&[], &[]).is_err());
        assert!(matches!(
            iface.parse_log(&[[1; 32]], &[]),
            Err(Error::UnknownTopic(_))
        ));
    }

    #[test]
    fn indexed_dynamic_values_stay_hashed() {
        let iface = erc20();
        let event = iface.event("Named").unwrap();
        let name_hash = keccak256(b"alice");
        let data = encode(
            &[ParamType::parse("string").unwrap()],
            &["hello".into()],
        )
        .unwrap();
        let log = iface
            .parse_log(&[event.topic(), name_hash, uint_word(7)], &data)
            .unwrap();
        assert_eq!(
            log.values,
            vec![
                LogValue::Indexed(Indexed { hash: name_hash }),
                LogValue::Token(AbiToken::Uint(7u8.into())),
                LogValue::Token("hello".into()),
            ]
        );
        assert_eq!(log.values[0].as_token(), None);
    }

    #[test]
    fn anonymous_event() {
        let iface = erc20();
        let log = iface
            .parse_log_for("Raw", &[uint_word(5)], &uint_word(1))
            .unwrap();
        assert_eq!(
            log.values,
            vec![
                LogValue::Token(AbiToken::Uint(Uint256::from(5u8))),
                LogValue::Token(AbiToken::Bool(true)),
            ]
        );
        // not reachable through its topic
        let topic = iface.event("Raw").unwrap().topic();
        assert!(iface.event_by_topic(topic).is_err());
    }

    #[test]
    fn parse_log_for_checks_topic() {
        let iface = erc20();
        let topics = [[9u8; 32], padded(&address()), padded(&address())];
        assert!(matches!(
            iface.parse_log_for("Transfer", &topics, &uint_word(1)),
            Err(Error::UnknownTopic(_))
        ));
    }

    #[test]
    fn event_topics() {
        let iface = erc20();
        let transfer = iface.event("Transfer").unwrap().topic();
        let topics = iface
            .encode_event_topics("Transfer", &[None, Some(address().into())])
            .unwrap();
        assert_eq!(topics, vec![Some(transfer), None, Some(padded(&address()))]);

        let topics = iface
            .encode_event_topics("Transfer", &[Some(address().into()), None])
            .unwrap();
        assert_eq!(topics, vec![Some(transfer), Some(padded(&address()))]);

        let topics = iface
            .encode_event_topics("Named", &[Some("alice".into())])
            .unwrap();
        assert_eq!(topics[1], Some(keccak256(b"alice")));

        assert_eq!(
            iface
                .encode_event_topics("Raw", &[None, None])
                .unwrap_err()
                .kind(),
            ErrorKind::UnexpectedArgument
        );
        let iface = Interface::from_signatures(&["event E(uint8[] indexed a)"]).unwrap();
        let e = iface
            .encode_event_topics("E", &[Some(AbiToken::Dynamic(vec![]))])
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::UnsupportedOperation);
    }

    #[test]
    fn deploy() {
        let iface = erc20();
        let bytecode = hex_str_to_bytes("0x6080604052").unwrap();
        let data = iface
            .encode_deploy(&bytecode, &["Token".into(), 18u8.into()])
            .unwrap();
        assert_eq!(&data[..5], bytecode.as_slice());
        assert_eq!(data.len(), 5 + 4 * 32);
        assert_eq!(data[5 + 63], 18);

        let bare = Interface::from_signatures(&["function f()"]).unwrap();
        assert_eq!(bare.encode_deploy(&bytecode, &[]).unwrap(), bytecode);
        assert!(matches!(
            bare.encode_deploy(&bytecode, &[1u8.into()]),
            Err(Error::NoConstructor)
        ));
    }

    #[test]
    fn from_json_skips_receive() {
        let json = r#"[
            {"type":"function","name":"f","inputs":[{"name":"a","type":"uint8"}],"outputs":[]},
            {"type":"receive","stateMutability":"payable"},
            {"type":"fallback"}
        ]"#;
        let iface = Interface::from_json(json).unwrap();
        assert_eq!(iface.functions().len(), 1);
        assert!(iface.constructor().is_none());
    }
}
