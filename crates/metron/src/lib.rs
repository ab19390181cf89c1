//! # metron
//!
//! A formula engine for utility and equipment monitoring backends.
//!
//! Organisations define named formulas over logged equipment parameters:
//! an ordered token sequence mixing constants, parameter references,
//! references to other formulas and arithmetic symbols. Metron validates
//! the sequence at creation time and evaluates it against a pair of data
//! rows (current and previous log) at read time.
//!
//! ## Example
//!
//! ```rust
//! use metron::prelude::*;
//!
//! let mut store = MemoryFormulaStore::new();
//!
//! // net = intake - PREV(intake)
//! let intake = ParameterId(1);
//! let net = store
//!     .create(
//!         "net intake",
//!         None,
//!         &[
//!             TokenDescriptor::parameter(intake),
//!             TokenDescriptor::symbol(Symbol::Minus),
//!             TokenDescriptor::parameter_from(intake, ValueFrom::Prev),
//!         ],
//!     )
//!     .unwrap();
//!
//! let mut ctx = RowContext::new(&store);
//! ctx.set_current(intake, 130.0).set_previous(intake, 100.0);
//!
//! let formula = store.formula(net).unwrap();
//! assert_eq!(evaluate(&formula, &ctx).unwrap(), 30.0);
//! ```

pub mod prelude;

// Re-export core types
pub use metron_core::{
    Error, Formula, FormulaId, ParameterId, Result, Symbol, Token, TokenDescriptor, TokenKind,
    TokenType, UnitId, ValueFrom,
};

// Re-export the engine
pub use metron_formula::{
    evaluate, validate, validate_expression, EvalError, EvalResult, FormulaStore,
    MemoryFormulaStore, RowContext, StoreError, ValidationError, ValidationErrors, ValueContext,
};
