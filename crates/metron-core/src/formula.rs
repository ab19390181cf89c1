//! Formula model
//!
//! A formula owns its token sequence outright; tokens have no life of their
//! own and disappear with the formula. Other formulas may point at this one
//! through [`TokenKind::FormulaRef`] tokens, which is a reference by id, not
//! ownership - the store decides what deleting a referenced formula means.

use crate::error::{Error, Result};
use crate::id::{FormulaId, UnitId};
use crate::token::{Token, TokenKind};

/// A named, organisation-scoped expression over parameters and other formulas
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    pub id: FormulaId,
    /// Unique per organisation (uniqueness enforced by the store)
    pub name: String,
    /// Physical unit of the computed result, if any
    pub unit_id: Option<UnitId>,
    /// True iff at least one token references another formula; cached at
    /// construction so graph-aware callers can skip scanning tokens
    pub has_formula: bool,
    tokens: Vec<Token>,
}

impl Formula {
    /// Build a formula from an unordered token set
    ///
    /// Tokens are sorted by position; duplicate positions and empty names are
    /// rejected. Content is immutable afterwards - the original system models
    /// no partial token updates, only create and delete.
    pub fn new(
        id: FormulaId,
        name: impl Into<String>,
        unit_id: Option<UnitId>,
        mut tokens: Vec<Token>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::EmptyName);
        }

        tokens.sort_by_key(|t| t.position);
        if let Some(pair) = tokens.windows(2).find(|w| w[0].position == w[1].position) {
            return Err(Error::DuplicatePosition(pair[0].position));
        }

        let has_formula = tokens
            .iter()
            .any(|t| matches!(t.kind, TokenKind::FormulaRef(_)));

        Ok(Self {
            id,
            name,
            unit_id,
            has_formula,
            tokens,
        })
    }

    /// Tokens in evaluation order
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Ids of all formulas referenced by this one's tokens
    pub fn referenced_formulas(&self) -> impl Iterator<Item = FormulaId> + '_ {
        self.tokens.iter().filter_map(|t| match t.kind {
            TokenKind::FormulaRef(id) => Some(id),
            _ => None,
        })
    }

    /// True when any token references the given formula
    pub fn references(&self, id: FormulaId) -> bool {
        self.referenced_formulas().any(|r| r == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Symbol;
    use crate::ParameterId;
    use pretty_assertions::assert_eq;

    fn tokens(kinds: Vec<TokenKind>) -> Vec<Token> {
        kinds
            .into_iter()
            .enumerate()
            .map(|(i, kind)| Token::new(i as u32, kind))
            .collect()
    }

    #[test]
    fn test_tokens_sorted_by_position() {
        let out_of_order = vec![
            Token::new(2, TokenKind::Constant(3.0)),
            Token::new(0, TokenKind::Constant(1.0)),
            Token::new(1, TokenKind::Symbol(Symbol::Plus)),
        ];

        let formula = Formula::new(FormulaId(1), "ordered", None, out_of_order).unwrap();
        let positions: Vec<u32> = formula.tokens().iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_duplicate_position_rejected() {
        let clashing = vec![
            Token::new(0, TokenKind::Constant(1.0)),
            Token::new(0, TokenKind::Constant(2.0)),
        ];

        assert_eq!(
            Formula::new(FormulaId(1), "clash", None, clashing),
            Err(Error::DuplicatePosition(0))
        );
    }

    #[test]
    fn test_empty_name_rejected() {
        assert_eq!(
            Formula::new(FormulaId(1), "  ", None, vec![]),
            Err(Error::EmptyName)
        );
    }

    #[test]
    fn test_has_formula_derived_from_tokens() {
        let plain = Formula::new(
            FormulaId(1),
            "plain",
            None,
            tokens(vec![
                TokenKind::Parameter {
                    parameter_id: ParameterId(1),
                    value_from: Default::default(),
                },
                TokenKind::Symbol(Symbol::Plus),
                TokenKind::Constant(1.0),
            ]),
        )
        .unwrap();
        assert!(!plain.has_formula);

        let nested = Formula::new(
            FormulaId(2),
            "nested",
            None,
            tokens(vec![TokenKind::FormulaRef(FormulaId(1))]),
        )
        .unwrap();
        assert!(nested.has_formula);
    }

    #[test]
    fn test_referenced_formulas() {
        let formula = Formula::new(
            FormulaId(3),
            "refs",
            None,
            tokens(vec![
                TokenKind::FormulaRef(FormulaId(1)),
                TokenKind::Symbol(Symbol::Star),
                TokenKind::FormulaRef(FormulaId(2)),
            ]),
        )
        .unwrap();

        let refs: Vec<FormulaId> = formula.referenced_formulas().collect();
        assert_eq!(refs, vec![FormulaId(1), FormulaId(2)]);
        assert!(formula.references(FormulaId(1)));
        assert!(!formula.references(FormulaId(9)));
    }
}
