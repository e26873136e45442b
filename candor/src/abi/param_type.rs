//! The type side of the ABI, a tree of [ParamType] built from type strings
//! such as `uint256`, `bytes32[2][]` or `(address,(bool,string))[]`
use crate::error::Error;
use std::fmt;

/// The shape of a type, arrays and tuples hold their element types
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Address,
    Bool,
    String,
    /// dynamic length `bytes`
    Bytes,
    /// `bytesN`, N in 1..=32
    FixedBytes(usize),
    /// `intN`, N a multiple of 8 in 8..=256
    Int(usize),
    /// `uintN`, N a multiple of 8 in 8..=256
    Uint(usize),
    /// `T[]`
    Array(Box<ParamType>),
    /// `T[N]`
    FixedArray(Box<ParamType>, usize),
    /// `(T1,T2,...)`
    Tuple(Vec<ParamType>),
}

/// A single ABI parameter, its type plus the optional name and indexed flag
/// that come with it in a fragment. Immutable once built, whether the type is
/// dynamic is worked out once on construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParamType {
    kind: ParamKind,
    name: Option<String>,
    indexed: bool,
    dynamic: bool,
}

impl ParamType {
    pub fn new(kind: ParamKind) -> ParamType {
        let dynamic = match &kind {
            ParamKind::String | ParamKind::Bytes | ParamKind::Array(_) => true,
            ParamKind::FixedArray(inner, _) => inner.is_dynamic(),
            ParamKind::Tuple(components) => components.iter().any(|c| c.is_dynamic()),
            _ => false,
        };
        ParamType {
            kind,
            name: None,
            indexed: false,
            dynamic,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> ParamType {
        let name = name.into();
        self.name = if name.is_empty() { None } else { Some(name) };
        self
    }

    pub fn with_indexed(mut self, indexed: bool) -> ParamType {
        self.indexed = indexed;
        self
    }

    /// Parses a bare type string, names and the `indexed` keyword are not
    /// accepted here, see [crate::abi::parse_signature] for whole fragments
    pub fn parse(type_string: &str) -> Result<ParamType, Error> {
        let mut cursor = Cursor::new(type_string);
        cursor.skip_ws();
        let ty = parse_type(&mut cursor)?;
        cursor.skip_ws();
        if !cursor.at_end() {
            return Err(Error::InvalidAbiType(type_string.to_string()));
        }
        Ok(ty)
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Arrays and tuples are stored in event topics as a hash, just like the
    /// dynamic types, since they may not fit in a single word
    pub fn is_hashed_when_indexed(&self) -> bool {
        self.dynamic
            || matches!(
                self.kind,
                ParamKind::FixedArray(_, _) | ParamKind::Tuple(_)
            )
    }

    /// Number of 32 byte words this type takes in the head of an encoding,
    /// zero only for an empty tuple, which the parser never produces
    pub(crate) fn head_words(&self) -> usize {
        if self.dynamic {
            return 1;
        }
        match &self.kind {
            ParamKind::FixedArray(inner, size) => inner.head_words().saturating_mul(*size),
            ParamKind::Tuple(components) => components
                .iter()
                .fold(0usize, |acc, c| acc.saturating_add(c.head_words())),
            _ => 1,
        }
    }

    /// The canonical type string used for signatures, `(uint256,address)[]`
    pub fn canonical(&self) -> String {
        self.render(false)
    }

    /// Human readable form, tuple members keep their names and the parameter
    /// name and indexed flag are appended, `(uint256 a, bool b)[] indexed list`
    pub fn format(&self) -> String {
        let mut out = self.render(true);
        if self.indexed {
            out.push_str(" indexed");
        }
        if let Some(name) = &self.name {
            out.push(' ');
            out.push_str(name);
        }
        out
    }

    fn render(&self, full: bool) -> String {
        match &self.kind {
            ParamKind::Address => "address".to_string(),
            ParamKind::Bool => "bool".to_string(),
            ParamKind::String => "string".to_string(),
            ParamKind::Bytes => "bytes".to_string(),
            ParamKind::FixedBytes(size) => format!("bytes{size}"),
            ParamKind::Int(bits) => format!("int{bits}"),
            ParamKind::Uint(bits) => format!("uint{bits}"),
            ParamKind::Array(inner) => format!("{}[]", inner.render(full)),
            ParamKind::FixedArray(inner, size) => format!("{}[{}]", inner.render(full), size),
            ParamKind::Tuple(components) => {
                let parts: Vec<String> = components
                    .iter()
                    .map(|c| if full { c.format() } else { c.canonical() })
                    .collect();
                if full {
                    format!("tuple({})", parts.join(", "))
                } else {
                    format!("({})", parts.join(","))
                }
            }
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// Byte cursor over a fragment or type string
pub(crate) struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(src: &'a str) -> Cursor<'a> {
        Cursor { src, pos: 0 }
    }

    pub(crate) fn source(&self) -> &'a str {
        self.src
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    pub(crate) fn skip_ws(&mut self) {
        while let Some(b) = self.peek() {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
    }

    /// Consumes `expected` if it is the next byte
    pub(crate) fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Reads an identifier, possibly empty
    pub(crate) fn ident(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'$' {
                self.pos += 1;
            } else {
                break;
            }
        }
        &self.src[start..self.pos]
    }

    /// Looks at the next identifier without consuming it
    pub(crate) fn peek_ident(&mut self) -> &'a str {
        let start = self.pos;
        let ident = self.ident();
        self.pos = start;
        ident
    }

    fn digits(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                self.pos += 1;
            } else {
                break;
            }
        }
        &self.src[start..self.pos]
    }
}

fn invalid(cursor: &Cursor) -> Error {
    Error::InvalidAbiType(cursor.source().to_string())
}

// parses a decimal size without leading zeros
fn parse_size(digits: &str) -> Option<usize> {
    if digits.is_empty() || (digits.len() > 1 && digits.starts_with('0')) {
        return None;
    }
    digits.parse().ok()
}

fn base_kind(ident: &str) -> Option<ParamKind> {
    let kind = match ident {
        "address" => ParamKind::Address,
        "bool" => ParamKind::Bool,
        "string" => ParamKind::String,
        "bytes" => ParamKind::Bytes,
        "int" => ParamKind::Int(256),
        "uint" => ParamKind::Uint(256),
        _ => {
            if let Some(size) = ident.strip_prefix("bytes") {
                let size = parse_size(size)?;
                if !(1..=32).contains(&size) {
                    return None;
                }
                ParamKind::FixedBytes(size)
            } else if let Some(bits) = ident.strip_prefix("uint") {
                ParamKind::Uint(integer_width(bits)?)
            } else if let Some(bits) = ident.strip_prefix("int") {
                ParamKind::Int(integer_width(bits)?)
            } else {
                return None;
            }
        }
    };
    Some(kind)
}

fn integer_width(bits: &str) -> Option<usize> {
    let bits = parse_size(bits)?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return None;
    }
    Some(bits)
}

/// Parses one type, a base identifier or a parenthesized tuple followed by
/// any number of array suffixes
pub(crate) fn parse_type(cursor: &mut Cursor) -> Result<ParamType, Error> {
    let mut ty = if cursor.peek() == Some(b'(') || cursor.peek_ident() == "tuple" {
        if cursor.peek() != Some(b'(') {
            cursor.ident();
            cursor.skip_ws();
        }
        let components = parse_param_list(cursor, false)?;
        // `()` is only valid as an empty parameter list, not as a type
        if components.is_empty() {
            return Err(invalid(cursor));
        }
        ParamType::new(ParamKind::Tuple(components))
    } else {
        let ident = cursor.ident();
        ParamType::new(base_kind(ident).ok_or_else(|| invalid(cursor))?)
    };
    parse_array_suffixes(cursor, &mut ty)?;
    Ok(ty)
}

/// Applies `[]` and `[N]` suffixes, leftmost innermost
pub(crate) fn parse_array_suffixes(cursor: &mut Cursor, ty: &mut ParamType) -> Result<(), Error> {
    while cursor.eat(b'[') {
        let digits = cursor.digits();
        if !cursor.eat(b']') {
            return Err(invalid(cursor));
        }
        let inner = Box::new(ty.clone());
        *ty = if digits.is_empty() {
            ParamType::new(ParamKind::Array(inner))
        } else {
            match parse_size(digits) {
                Some(size) if size > 0 => ParamType::new(ParamKind::FixedArray(inner, size)),
                _ => return Err(invalid(cursor)),
            }
        };
    }
    Ok(())
}

/// Parses `type [indexed] [name]`
pub(crate) fn parse_param(cursor: &mut Cursor, allow_indexed: bool) -> Result<ParamType, Error> {
    cursor.skip_ws();
    let mut ty = parse_type(cursor)?;
    cursor.skip_ws();
    if cursor.peek_ident() == "indexed" {
        if !allow_indexed {
            return Err(Error::InvalidSignature(cursor.source().to_string()));
        }
        cursor.ident();
        cursor.skip_ws();
        ty = ty.with_indexed(true);
    }
    let name = cursor.ident();
    if let Some(first) = name.bytes().next() {
        if first.is_ascii_digit() {
            return Err(Error::InvalidSignature(cursor.source().to_string()));
        }
        ty = ty.with_name(name);
    }
    cursor.skip_ws();
    Ok(ty)
}

/// Parses `(param, param, ...)` including the parentheses
pub(crate) fn parse_param_list(
    cursor: &mut Cursor,
    allow_indexed: bool,
) -> Result<Vec<ParamType>, Error> {
    cursor.skip_ws();
    if !cursor.eat(b'(') {
        return Err(invalid(cursor));
    }
    let mut params = Vec::new();
    cursor.skip_ws();
    if cursor.eat(b')') {
        return Ok(params);
    }
    loop {
        params.push(parse_param(cursor, allow_indexed)?);
        if cursor.eat(b',') {
            continue;
        }
        if cursor.eat(b')') {
            return Ok(params);
        }
        return Err(invalid(cursor));
    }
}
