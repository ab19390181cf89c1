//! Formula token types
//!
//! A formula is stored as an ordered sequence of tokens. Each token carries
//! exactly one payload: an expression symbol, a numeric constant, a parameter
//! reference or a reference to another formula. The creation endpoint posts
//! tokens in a flat shape ([`TokenDescriptor`]) with one nullable field per
//! payload; normalization into [`TokenKind`] keeps only the field belonging
//! to the declared type and discards the rest.

use crate::error::{Error, Result};
use crate::id::{FormulaId, ParameterId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Expression symbols allowed in a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Symbol {
    Plus,
    Minus,
    Star,
    Slash,
    OpenBracket,
    CloseBracket,
}

impl Symbol {
    /// Text form as it appears in the wire payload
    pub fn as_str(self) -> &'static str {
        match self {
            Symbol::Plus => "+",
            Symbol::Minus => "-",
            Symbol::Star => "*",
            Symbol::Slash => "/",
            Symbol::OpenBracket => "(",
            Symbol::CloseBracket => ")",
        }
    }

    /// True for the four binary operators, false for brackets
    pub fn is_operator(self) -> bool {
        matches!(
            self,
            Symbol::Plus | Symbol::Minus | Symbol::Star | Symbol::Slash
        )
    }
}

impl FromStr for Symbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "+" => Ok(Symbol::Plus),
            "-" => Ok(Symbol::Minus),
            "*" => Ok(Symbol::Star),
            "/" => Ok(Symbol::Slash),
            "(" => Ok(Symbol::OpenBracket),
            ")" => Ok(Symbol::CloseBracket),
            other => Err(Error::InvalidSymbol(other.to_string())),
        }
    }
}

impl TryFrom<String> for Symbol {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Symbol> for String {
    fn from(s: Symbol) -> String {
        s.as_str().to_string()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which data row a parameter token reads from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueFrom {
    /// The chronologically preceding log row
    Prev,
    /// The log row being evaluated
    #[default]
    Current,
}

/// Declared type of a token descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenType {
    Constant,
    Parameter,
    Symbol,
    Formula,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::Constant => "CONSTANT",
            TokenType::Parameter => "PARAMETER",
            TokenType::Symbol => "SYMBOL",
            TokenType::Formula => "FORMULA",
        };
        f.write_str(name)
    }
}

/// Token payload, exactly one variant per token
///
/// This is the normalized form: a token can never carry a constant and a
/// parameter reference at the same time, so downstream code never polices
/// nullable fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// Operator or bracket
    Symbol(Symbol),
    /// Numeric literal
    Constant(f64),
    /// Value of a parameter in the current or previous data row
    Parameter {
        parameter_id: ParameterId,
        value_from: ValueFrom,
    },
    /// Result of another stored formula, resolved at evaluation time
    FormulaRef(FormulaId),
}

impl TokenKind {
    /// The declared type this payload corresponds to
    pub fn token_type(&self) -> TokenType {
        match self {
            TokenKind::Symbol(_) => TokenType::Symbol,
            TokenKind::Constant(_) => TokenType::Constant,
            TokenKind::Parameter { .. } => TokenType::Parameter,
            TokenKind::FormulaRef(_) => TokenType::Formula,
        }
    }

    /// The symbol, if this is a symbol token
    pub fn symbol(&self) -> Option<Symbol> {
        match self {
            TokenKind::Symbol(s) => Some(*s),
            _ => None,
        }
    }

    /// True for constants, parameter references and formula references
    pub fn is_operand(&self) -> bool {
        !matches!(self, TokenKind::Symbol(_))
    }
}

/// One positioned element of a formula's token sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    /// 0-based index defining evaluation order, unique within a formula
    pub position: u32,
    pub kind: TokenKind,
}

impl Token {
    /// Create a token at the given position
    pub fn new(position: u32, kind: TokenKind) -> Self {
        Self { position, kind }
    }
}

/// Flat token shape as posted to the formula creation endpoint
///
/// All payload fields are optional; only the one matching `type` is
/// meaningful. [`TokenDescriptor::normalize`] performs the projection and
/// returns `None` when the required field for the declared type is missing
/// (the validator turns that into a per-position error).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    #[serde(rename = "type")]
    pub token_type: TokenType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_id: Option<ParameterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula_id: Option<FormulaId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<ValueFrom>,
}

impl TokenDescriptor {
    fn empty(token_type: TokenType) -> Self {
        Self {
            token_type,
            symbol: None,
            constant: None,
            parameter_id: None,
            formula_id: None,
            value_from: None,
        }
    }

    /// Descriptor for an operator or bracket
    pub fn symbol(symbol: Symbol) -> Self {
        Self {
            symbol: Some(symbol),
            ..Self::empty(TokenType::Symbol)
        }
    }

    /// Descriptor for a numeric literal
    pub fn constant(value: f64) -> Self {
        Self {
            constant: Some(value),
            ..Self::empty(TokenType::Constant)
        }
    }

    /// Descriptor for a current-row parameter reference
    pub fn parameter(id: ParameterId) -> Self {
        Self {
            parameter_id: Some(id),
            ..Self::empty(TokenType::Parameter)
        }
    }

    /// Descriptor for a parameter reference reading from the given row
    pub fn parameter_from(id: ParameterId, value_from: ValueFrom) -> Self {
        Self {
            value_from: Some(value_from),
            ..Self::parameter(id)
        }
    }

    /// Descriptor for a reference to another formula
    pub fn formula(id: FormulaId) -> Self {
        Self {
            formula_id: Some(id),
            ..Self::empty(TokenType::Formula)
        }
    }

    /// Project the descriptor onto its declared type
    ///
    /// Fields not belonging to the declared type are dropped; `value_from`
    /// only survives on parameter tokens and defaults to
    /// [`ValueFrom::Current`] there. Returns `None` when the required field
    /// for the declared type is missing.
    pub fn normalize(&self) -> Option<TokenKind> {
        match self.token_type {
            TokenType::Symbol => self.symbol.map(TokenKind::Symbol),
            TokenType::Constant => self.constant.map(TokenKind::Constant),
            TokenType::Parameter => self.parameter_id.map(|parameter_id| TokenKind::Parameter {
                parameter_id,
                value_from: self.value_from.unwrap_or_default(),
            }),
            TokenType::Formula => self.formula_id.map(TokenKind::FormulaRef),
        }
    }
}

impl From<&TokenKind> for TokenDescriptor {
    /// Flatten a normalized token back into the wire shape
    fn from(kind: &TokenKind) -> Self {
        match *kind {
            TokenKind::Symbol(s) => TokenDescriptor::symbol(s),
            TokenKind::Constant(c) => TokenDescriptor::constant(c),
            TokenKind::Parameter {
                parameter_id,
                value_from,
            } => TokenDescriptor::parameter_from(parameter_id, value_from),
            TokenKind::FormulaRef(id) => TokenDescriptor::formula(id),
        }
    }
}
