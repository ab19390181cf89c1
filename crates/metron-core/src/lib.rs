//! # metron-core
//!
//! Core data structures for the metron formula engine.
//!
//! This crate provides the fundamental types used throughout metron:
//! - [`Token`] and [`TokenKind`] - One symbolic unit of a formula expression
//! - [`TokenDescriptor`] - The flat creation-payload shape, normalized into
//!   tokens at construction time
//! - [`Formula`] - A named, ordered token sequence owned by an organisation
//! - [`ParameterId`], [`FormulaId`], [`UnitId`] - Typed references into the
//!   backing repository
//!
//! ## Example
//!
//! ```rust
//! use metron_core::{Formula, FormulaId, Symbol, Token, TokenKind};
//!
//! let tokens = vec![
//!     Token::new(0, TokenKind::Constant(2.0)),
//!     Token::new(1, TokenKind::Symbol(Symbol::Plus)),
//!     Token::new(2, TokenKind::Constant(3.0)),
//! ];
//! let formula = Formula::new(FormulaId(1), "baseline", None, tokens).unwrap();
//! assert!(!formula.has_formula);
//! ```

pub mod error;
pub mod formula;
pub mod id;
pub mod token;

// Re-exports for convenience
pub use error::{Error, Result};
pub use formula::Formula;
pub use id::{FormulaId, ParameterId, UnitId};
pub use token::{Symbol, Token, TokenDescriptor, TokenKind, TokenType, ValueFrom};
