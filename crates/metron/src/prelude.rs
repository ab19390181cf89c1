//! Prelude module - common imports for metron users
//!
//! ```rust
//! use metron::prelude::*;
//! ```

pub use crate::{
    // Engine entry points
    evaluate,
    validate,
    // Error types
    EvalError,
    Formula,
    // Ids
    FormulaId,
    // Store
    FormulaStore,
    MemoryFormulaStore,
    ParameterId,
    RowContext,
    StoreError,
    Symbol,
    // Token types
    Token,
    TokenDescriptor,
    TokenKind,
    TokenType,
    UnitId,
    ValidationError,
    ValidationErrors,
    ValueContext,
    ValueFrom,
};
