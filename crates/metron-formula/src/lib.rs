//! # metron-formula
//!
//! Validator and evaluator for metron formula expressions.
//!
//! This crate provides:
//! - Token-sequence validation (per-token payload checks + grammar scan)
//! - Infix evaluation with operator precedence over validated tokens
//! - Cycle-guarded resolution of formula-to-formula references
//! - The [`FormulaStore`] seam plus an in-memory implementation
//!
//! ## Example
//!
//! ```rust,ignore
//! use metron_formula::{evaluate, validate, MemoryFormulaStore, RowContext};
//!
//! let tokens = validate(&descriptors)?;
//! let result = evaluate(&formula, &context)?;
//! ```

pub mod error;
pub mod evaluator;
pub mod store;
pub mod validator;

pub use error::{EvalError, EvalResult, StoreError, ValidationError, ValidationErrors};
pub use evaluator::{evaluate, RowContext, ValueContext};
pub use store::{FormulaStore, MemoryFormulaStore};
pub use validator::{validate, validate_expression};
