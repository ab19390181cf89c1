//! Formula evaluation
//!
//! Evaluates a formula's token sequence against a value-resolution context
//! to produce one number. The walk is a recursive descent directly over the
//! token slice with the usual precedence: `*` and `/` bind tighter than `+`
//! and `-`, same-precedence operators associate left, brackets override.
//!
//! Formula-reference tokens are resolved through the context and evaluated
//! recursively. A set of formula ids currently on the call stack guards
//! against reference cycles; revisiting an id aborts with
//! [`EvalError::CyclicReference`] instead of recursing unboundedly.
//!
//! Evaluation is pure and synchronous; one call sees an immutable snapshot
//! of the formula and its context, so concurrent calls need no locking.

use crate::error::{EvalError, EvalResult};
use crate::store::FormulaStore;
use ahash::{AHashMap, AHashSet};
use metron_core::{Formula, FormulaId, ParameterId, Symbol, Token, TokenKind, ValueFrom};

/// Value resolution for one evaluation call
///
/// Backed by a pair of data rows and the formula store in production; tests
/// implement it over plain maps.
pub trait ValueContext {
    /// Numeric reading for a parameter in the requested row, `None` when the
    /// row has no numeric value for it
    fn parameter_value(&self, id: ParameterId, from: ValueFrom) -> Option<f64>;

    /// Fetch a referenced formula for nested evaluation
    fn formula(&self, id: FormulaId) -> Option<Formula>;
}

/// Evaluate a formula against a context
///
/// The token sequence is assumed to have passed validation at creation
/// time; a sequence that never did produces [`EvalError::UnexpectedToken`]
/// or [`EvalError::UnexpectedEnd`] rather than panicking.
pub fn evaluate(formula: &Formula, ctx: &dyn ValueContext) -> EvalResult<f64> {
    let mut active = AHashSet::new();
    active.insert(formula.id);
    eval_tokens(formula.tokens(), ctx, &mut active)
}

fn eval_tokens(
    tokens: &[Token],
    ctx: &dyn ValueContext,
    active: &mut AHashSet<FormulaId>,
) -> EvalResult<f64> {
    let mut cursor = Cursor {
        tokens,
        pos: 0,
        ctx,
        active,
    };
    let value = cursor.additive()?;
    match cursor.peek() {
        Some(token) => Err(EvalError::UnexpectedToken(token.position as usize)),
        None => Ok(value),
    }
}

/// Walks one token slice; nested formula references get their own cursor
/// but share the active-id set.
struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    ctx: &'a dyn ValueContext,
    active: &'a mut AHashSet<FormulaId>,
}

impl Cursor<'_> {
    fn additive(&mut self) -> EvalResult<f64> {
        let mut left = self.multiplicative()?;

        loop {
            match self.peek_symbol() {
                Some(Symbol::Plus) => {
                    self.advance();
                    left += self.multiplicative()?;
                }
                Some(Symbol::Minus) => {
                    self.advance();
                    left -= self.multiplicative()?;
                }
                _ => break,
            }
        }

        Ok(left)
    }

    fn multiplicative(&mut self) -> EvalResult<f64> {
        let mut left = self.unary()?;

        loop {
            match self.peek_symbol() {
                Some(Symbol::Star) => {
                    self.advance();
                    left *= self.unary()?;
                }
                Some(Symbol::Slash) => {
                    // Position of the division token, for the error
                    let at = self.position();
                    self.advance();
                    let right = self.unary()?;
                    if right == 0.0 {
                        return Err(EvalError::DivisionByZero(at));
                    }
                    left /= right;
                }
                _ => break,
            }
        }

        Ok(left)
    }

    fn unary(&mut self) -> EvalResult<f64> {
        match self.peek_symbol() {
            Some(Symbol::Minus) => {
                self.advance();
                Ok(-self.unary()?)
            }
            Some(Symbol::Plus) => {
                self.advance();
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> EvalResult<f64> {
        let token = match self.peek() {
            Some(token) => *token,
            None => return Err(EvalError::UnexpectedEnd),
        };
        let position = token.position as usize;

        match token.kind {
            TokenKind::Constant(value) => {
                self.advance();
                Ok(value)
            }

            TokenKind::Parameter {
                parameter_id,
                value_from,
            } => {
                let value = self
                    .ctx
                    .parameter_value(parameter_id, value_from)
                    .ok_or(EvalError::UnresolvedParameter {
                        position,
                        parameter_id,
                    })?;
                self.advance();
                Ok(value)
            }

            TokenKind::FormulaRef(formula_id) => {
                let nested =
                    self.ctx
                        .formula(formula_id)
                        .ok_or(EvalError::UnresolvedFormulaReference {
                            position,
                            formula_id,
                        })?;
                if !self.active.insert(formula_id) {
                    return Err(EvalError::CyclicReference(formula_id));
                }
                let value = eval_tokens(nested.tokens(), self.ctx, self.active)?;
                self.active.remove(&formula_id);
                self.advance();
                Ok(value)
            }

            TokenKind::Symbol(Symbol::OpenBracket) => {
                self.advance();
                let value = self.additive()?;
                match self.peek_symbol() {
                    Some(Symbol::CloseBracket) => {
                        self.advance();
                        Ok(value)
                    }
                    _ => match self.peek() {
                        Some(token) => Err(EvalError::UnexpectedToken(token.position as usize)),
                        None => Err(EvalError::UnexpectedEnd),
                    },
                }
            }

            TokenKind::Symbol(_) => Err(EvalError::UnexpectedToken(position)),
        }
    }

    // === Cursor helpers ===

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_symbol(&self) -> Option<Symbol> {
        self.peek().and_then(|t| t.kind.symbol())
    }

    /// Stored position of the current token (equals the slice index for any
    /// formula built through the validator)
    fn position(&self) -> usize {
        self.peek().map(|t| t.position as usize).unwrap_or(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }
}

/// [`ValueContext`] backed by a pair of data rows and a formula store
///
/// This is the shape the log/report read path hands the evaluator: readings
/// from the row being displayed, readings from the chronologically
/// preceding row for `PREV` tokens, and the store for nested references.
pub struct RowContext<'a, S: FormulaStore> {
    current: AHashMap<ParameterId, f64>,
    previous: AHashMap<ParameterId, f64>,
    store: &'a S,
}

impl<'a, S: FormulaStore> RowContext<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            current: AHashMap::new(),
            previous: AHashMap::new(),
            store,
        }
    }

    /// Record a reading in the current row
    pub fn set_current(&mut self, id: ParameterId, value: f64) -> &mut Self {
        self.current.insert(id, value);
        self
    }

    /// Record a reading in the previous row
    pub fn set_previous(&mut self, id: ParameterId, value: f64) -> &mut Self {
        self.previous.insert(id, value);
        self
    }
}

impl<S: FormulaStore> ValueContext for RowContext<'_, S> {
    fn parameter_value(&self, id: ParameterId, from: ValueFrom) -> Option<f64> {
        match from {
            ValueFrom::Current => self.current.get(&id).copied(),
            ValueFrom::Prev => self.previous.get(&id).copied(),
        }
    }

    fn formula(&self, id: FormulaId) -> Option<Formula> {
        self.store.formula(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metron_core::FormulaId;
    use pretty_assertions::assert_eq;

    /// Context over plain maps, no store behind it
    #[derive(Default)]
    struct MapContext {
        current: AHashMap<ParameterId, f64>,
        previous: AHashMap<ParameterId, f64>,
        formulas: AHashMap<FormulaId, Formula>,
    }

    impl ValueContext for MapContext {
        fn parameter_value(&self, id: ParameterId, from: ValueFrom) -> Option<f64> {
            match from {
                ValueFrom::Current => self.current.get(&id).copied(),
                ValueFrom::Prev => self.previous.get(&id).copied(),
            }
        }

        fn formula(&self, id: FormulaId) -> Option<Formula> {
            self.formulas.get(&id).cloned()
        }
    }

    fn formula(id: u64, kinds: Vec<TokenKind>) -> Formula {
        let tokens = kinds
            .into_iter()
            .enumerate()
            .map(|(i, kind)| Token::new(i as u32, kind))
            .collect();
        Formula::new(FormulaId(id), format!("f{}", id), None, tokens).unwrap()
    }

    fn constant(v: f64) -> TokenKind {
        TokenKind::Constant(v)
    }

    fn sym(s: Symbol) -> TokenKind {
        TokenKind::Symbol(s)
    }

    fn param(id: u64) -> TokenKind {
        TokenKind::Parameter {
            parameter_id: ParameterId(id),
            value_from: ValueFrom::Current,
        }
    }

    #[test]
    fn test_multiplication_precedence() {
        // 2 + 3 * 4 = 14
        let f = formula(
            1,
            vec![
                constant(2.0),
                sym(Symbol::Plus),
                constant(3.0),
                sym(Symbol::Star),
                constant(4.0),
            ],
        );
        assert_eq!(evaluate(&f, &MapContext::default()), Ok(14.0));
    }

    #[test]
    fn test_brackets_override_precedence() {
        // (2 + 3) * 4 = 20
        let f = formula(
            1,
            vec![
                sym(Symbol::OpenBracket),
                constant(2.0),
                sym(Symbol::Plus),
                constant(3.0),
                sym(Symbol::CloseBracket),
                sym(Symbol::Star),
                constant(4.0),
            ],
        );
        assert_eq!(evaluate(&f, &MapContext::default()), Ok(20.0));
    }

    #[test]
    fn test_same_precedence_associates_left() {
        // 10 - 4 - 3 = 3
        let f = formula(
            1,
            vec![
                constant(10.0),
                sym(Symbol::Minus),
                constant(4.0),
                sym(Symbol::Minus),
                constant(3.0),
            ],
        );
        assert_eq!(evaluate(&f, &MapContext::default()), Ok(3.0));

        // 8 / 4 / 2 = 1
        let f = formula(
            2,
            vec![
                constant(8.0),
                sym(Symbol::Slash),
                constant(4.0),
                sym(Symbol::Slash),
                constant(2.0),
            ],
        );
        assert_eq!(evaluate(&f, &MapContext::default()), Ok(1.0));
    }

    #[test]
    fn test_unary_minus() {
        // -3 + 5 = 2
        let f = formula(
            1,
            vec![
                sym(Symbol::Minus),
                constant(3.0),
                sym(Symbol::Plus),
                constant(5.0),
            ],
        );
        assert_eq!(evaluate(&f, &MapContext::default()), Ok(2.0));
    }

    #[test]
    fn test_division_by_zero() {
        // 1 / 0, error carries the position of the slash
        let f = formula(
            1,
            vec![constant(1.0), sym(Symbol::Slash), constant(0.0)],
        );
        assert_eq!(
            evaluate(&f, &MapContext::default()),
            Err(EvalError::DivisionByZero(1))
        );
    }

    #[test]
    fn test_parameter_resolution_per_row() {
        let mut ctx = MapContext::default();
        ctx.current.insert(ParameterId(1), 10.0);
        ctx.previous.insert(ParameterId(1), 4.0);

        // current(p1) - prev(p1) = 6
        let f = formula(
            1,
            vec![
                param(1),
                sym(Symbol::Minus),
                TokenKind::Parameter {
                    parameter_id: ParameterId(1),
                    value_from: ValueFrom::Prev,
                },
            ],
        );
        assert_eq!(evaluate(&f, &ctx), Ok(6.0));
    }

    #[test]
    fn test_unresolved_parameter() {
        let f = formula(1, vec![constant(1.0), sym(Symbol::Plus), param(9)]);
        assert_eq!(
            evaluate(&f, &MapContext::default()),
            Err(EvalError::UnresolvedParameter {
                position: 2,
                parameter_id: ParameterId(9),
            })
        );
    }

    #[test]
    fn test_nested_formula_reference() {
        let mut ctx = MapContext::default();
        ctx.formulas.insert(
            FormulaId(2),
            formula(
                2,
                vec![constant(3.0), sym(Symbol::Star), constant(4.0)],
            ),
        );

        // 1 + f2 = 13
        let f = formula(
            1,
            vec![
                constant(1.0),
                sym(Symbol::Plus),
                TokenKind::FormulaRef(FormulaId(2)),
            ],
        );
        assert_eq!(evaluate(&f, &ctx), Ok(13.0));
    }

    #[test]
    fn test_unresolved_formula_reference() {
        let f = formula(1, vec![TokenKind::FormulaRef(FormulaId(42))]);
        assert_eq!(
            evaluate(&f, &MapContext::default()),
            Err(EvalError::UnresolvedFormulaReference {
                position: 0,
                formula_id: FormulaId(42),
            })
        );
    }

    #[test]
    fn test_self_reference_is_cyclic() {
        let f = formula(1, vec![TokenKind::FormulaRef(FormulaId(1))]);
        let mut ctx = MapContext::default();
        ctx.formulas.insert(FormulaId(1), f.clone());

        assert_eq!(
            evaluate(&f, &ctx),
            Err(EvalError::CyclicReference(FormulaId(1)))
        );
    }

    #[test]
    fn test_transitive_cycle() {
        // f1 -> f2 -> f3 -> f1
        let f1 = formula(1, vec![TokenKind::FormulaRef(FormulaId(2))]);
        let f2 = formula(2, vec![TokenKind::FormulaRef(FormulaId(3))]);
        let f3 = formula(3, vec![TokenKind::FormulaRef(FormulaId(1))]);

        let mut ctx = MapContext::default();
        ctx.formulas.insert(FormulaId(1), f1.clone());
        ctx.formulas.insert(FormulaId(2), f2);
        ctx.formulas.insert(FormulaId(3), f3);

        assert_eq!(
            evaluate(&f1, &ctx),
            Err(EvalError::CyclicReference(FormulaId(1)))
        );
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        // f1 = f2 + f2: the same formula twice sequentially is fine, only
        // revisiting an id still on the call stack is cyclic
        let f2 = formula(2, vec![constant(5.0)]);
        let f1 = formula(
            1,
            vec![
                TokenKind::FormulaRef(FormulaId(2)),
                sym(Symbol::Plus),
                TokenKind::FormulaRef(FormulaId(2)),
            ],
        );

        let mut ctx = MapContext::default();
        ctx.formulas.insert(FormulaId(2), f2);

        assert_eq!(evaluate(&f1, &ctx), Ok(10.0));
    }

    #[test]
    fn test_malformed_sequence_is_an_error_not_a_panic() {
        // bare operator
        let f = formula(1, vec![sym(Symbol::Star)]);
        assert_eq!(
            evaluate(&f, &MapContext::default()),
            Err(EvalError::UnexpectedToken(0))
        );

        // trailing operand after a complete expression
        let f = formula(2, vec![constant(1.0), constant(2.0)]);
        assert_eq!(
            evaluate(&f, &MapContext::default()),
            Err(EvalError::UnexpectedToken(1))
        );

        // unterminated bracket
        let f = formula(3, vec![sym(Symbol::OpenBracket), constant(1.0)]);
        assert_eq!(
            evaluate(&f, &MapContext::default()),
            Err(EvalError::UnexpectedEnd)
        );

        // operand directly followed by a bracket group: passes the grammar
        // scan but has no operator to apply
        let f = formula(
            4,
            vec![
                constant(2.0),
                sym(Symbol::OpenBracket),
                constant(3.0),
                sym(Symbol::CloseBracket),
            ],
        );
        assert_eq!(
            evaluate(&f, &MapContext::default()),
            Err(EvalError::UnexpectedToken(1))
        );
    }
}
