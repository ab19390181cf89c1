//! Formula expression validation
//!
//! Runs at creation time, before anything is persisted. Two passes:
//!
//! 1. Per-token: every descriptor must carry the payload field its declared
//!    type requires. All offending positions are collected and reported
//!    together, so the caller can flag every bad token in one response.
//! 2. Grammar: a left-to-right scan of the normalized sequence tracking
//!    bracket depth and the class of the previous token. The first
//!    structural violation wins - grammar state is meaningless once broken.
//!
//! End-of-sequence checks run after the scan, trailing-operator before
//! bracket balance: `(a+` reports the dangling operator, `(a+b(` the
//! missing closing bracket. A closing bracket directly after an operator
//! reports the operator's position, since the operator is what dangles.
//! The operand-adjacency rule only fires for directly adjacent operands: a
//! bracket between two operands satisfies the grammar (`a(b)` passes here
//! and is rejected by the evaluator instead).
//!
//! Validation is pure: no store access, no side effects, nothing about
//! whether referenced ids actually exist (the authorization layer owns
//! that).

use crate::error::{ValidationError, ValidationErrors};
use metron_core::{Symbol, Token, TokenDescriptor, TokenKind};

/// Validate a descriptor sequence and normalize it into tokens
///
/// Positions are assigned from list order. On failure nothing is usable:
/// the caller must not persist a partially validated token set.
pub fn validate(descriptors: &[TokenDescriptor]) -> Result<Vec<Token>, ValidationErrors> {
    let mut missing = Vec::new();
    let mut tokens = Vec::with_capacity(descriptors.len());

    for (position, descriptor) in descriptors.iter().enumerate() {
        match descriptor.normalize() {
            Some(kind) => tokens.push(Token::new(position as u32, kind)),
            None => missing.push(ValidationError::MissingRequiredField {
                position,
                token_type: descriptor.token_type,
            }),
        }
    }

    if !missing.is_empty() {
        return Err(ValidationErrors::from(missing));
    }

    validate_expression(&tokens)?;
    Ok(tokens)
}

/// Token class as seen by the grammar scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Operand,
    Operator,
    Open,
    Close,
}

fn classify(kind: &TokenKind) -> Class {
    match kind.symbol() {
        None => Class::Operand,
        Some(s) if s.is_operator() => Class::Operator,
        Some(Symbol::OpenBracket) => Class::Open,
        Some(_) => Class::Close,
    }
}

/// Grammar check over an already-normalized token sequence
///
/// Exposed separately so stored formulas can be re-checked without going
/// back through descriptors.
pub fn validate_expression(tokens: &[Token]) -> Result<(), ValidationError> {
    let mut depth = 0usize;
    let mut prev: Option<Class> = None;

    for (i, token) in tokens.iter().enumerate() {
        let class = classify(&token.kind);
        match class {
            Class::Close => {
                if i == 0 {
                    return Err(ValidationError::StartsWithCloseBracket);
                }
                if depth == 0 {
                    return Err(ValidationError::AwkwardValue(i));
                }
                match prev {
                    Some(Class::Open) => return Err(ValidationError::EmptyParenthetical(i)),
                    Some(Class::Operator) => return Err(ValidationError::AwkwardValue(i - 1)),
                    _ => {}
                }
                depth -= 1;
            }
            Class::Open => {
                depth += 1;
            }
            Class::Operand => {
                if prev == Some(Class::Operand) {
                    return Err(ValidationError::AwkwardValue(i));
                }
            }
            Class::Operator => {
                // A leading + or - (also just after an opening bracket) is a
                // unary sign; * and / have no unary reading.
                let sign = matches!(
                    token.kind.symbol(),
                    Some(Symbol::Plus) | Some(Symbol::Minus)
                );
                match prev {
                    None | Some(Class::Open) => {
                        if !sign {
                            return Err(ValidationError::AwkwardValue(i));
                        }
                    }
                    Some(Class::Operator) => return Err(ValidationError::AwkwardValue(i)),
                    _ => {}
                }
            }
        }
        prev = Some(class);
    }

    if prev == Some(Class::Operator) {
        return Err(ValidationError::MathOperationAtEnd);
    }
    if depth != 0 {
        return Err(ValidationError::MissingClosingBracket);
    }
    Ok(())
}
