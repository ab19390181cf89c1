//! Formula engine error types

use metron_core::{FormulaId, ParameterId, TokenType};
use std::fmt;
use thiserror::Error;

/// Result type for evaluation
pub type EvalResult<T> = std::result::Result<T, EvalError>;

/// A single validation failure, keyed by token position where one applies
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Descriptor is missing the payload field its declared type requires
    #[error("Required field for type {token_type} at position {position}")]
    MissingRequiredField {
        position: usize,
        token_type: TokenType,
    },

    /// The sequence opens with a closing bracket
    #[error("Formula must not start with a closing bracket")]
    StartsWithCloseBracket,

    /// An opening bracket immediately followed by a closing one
    #[error("Empty brackets at position {0}")]
    EmptyParenthetical(usize),

    /// Adjacent operands, adjacent operators, or a bracket in an impossible
    /// place; the position is where the sequence became inconsistent
    #[error("Awkward value at position {0}")]
    AwkwardValue(usize),

    /// More opening brackets than closing ones
    #[error("Missing closing bracket")]
    MissingClosingBracket,

    /// The sequence ends on a binary operator
    #[error("Math operation at the end of the formula")]
    MathOperationAtEnd,
}

impl ValidationError {
    /// Token position the error refers to, if it refers to one
    ///
    /// The creation endpoint keys its 400 body by this; formula-wide errors
    /// (missing closing bracket, trailing operation) return `None`.
    pub fn position(&self) -> Option<usize> {
        match self {
            ValidationError::MissingRequiredField { position, .. } => Some(*position),
            ValidationError::EmptyParenthetical(position) => Some(*position),
            ValidationError::AwkwardValue(position) => Some(*position),
            ValidationError::StartsWithCloseBracket => Some(0),
            ValidationError::MissingClosingBracket | ValidationError::MathOperationAtEnd => None,
        }
    }
}

/// Every failure found in one validation call
///
/// Per-token required-field errors are collected across all positions;
/// grammar errors short-circuit, so a grammar failure arrives alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

/// Errors that abort an evaluation call
///
/// All terminal: the evaluator never produces a partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The context has no numeric value for a parameter in the requested row
    #[error("No value for {parameter_id} at position {position}")]
    UnresolvedParameter {
        position: usize,
        parameter_id: ParameterId,
    },

    /// A referenced formula could not be fetched
    #[error("Unknown {formula_id} referenced at position {position}")]
    UnresolvedFormulaReference {
        position: usize,
        formula_id: FormulaId,
    },

    /// The reference graph cycled back to a formula already being evaluated
    #[error("Cyclic reference involving {0}")]
    CyclicReference(FormulaId),

    /// Right-hand side of a division evaluated to zero
    #[error("Division by zero at position {0}")]
    DivisionByZero(usize),

    /// Token sequence is not a well-formed expression (it bypassed
    /// validation, or the stored sequence was corrupted)
    #[error("Unexpected token at position {0}")]
    UnexpectedToken(usize),

    /// Expression ended where an operand or bracket was still expected
    #[error("Formula ended unexpectedly")]
    UnexpectedEnd,
}

/// Errors from the in-memory formula store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// A formula with this name already exists in the organisation
    #[error("Formula name already exists: {0}")]
    DuplicateName(String),

    /// No formula with this id
    #[error("Formula not found: {0}")]
    UnknownFormula(FormulaId),

    /// Another formula's tokens still reference the one being deleted
    #[error("{0} is still referenced by {1}")]
    StillReferenced(FormulaId, FormulaId),

    /// The token sequence failed validation
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    /// Rejected by the core model (duplicate position, empty name)
    #[error(transparent)]
    Model(#[from] metron_core::Error),
}
