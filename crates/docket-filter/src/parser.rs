//! Recursive-descent parser for the filter grammar.
//!
//! ```text
//! expr     := or_expr
//! or_expr  := and_expr ( "OR" and_expr )*
//! and_expr := not_expr ( "AND" not_expr )*
//! not_expr := "NOT"? cmp
//! cmp      := operand ( cmp_op operand )?
//! cmp_op   := "==" | "!=" | "<" | "<=" | ">" | ">=" | "IN" | "CONTAINS"
//! operand  := literal | column_ref | "(" expr ")" | list
//! list     := "[" ( operand ( "," operand )* )? "]"
//! ```

use crate::ast::{CmpOp, Expr};
use crate::error::{FilterError, Result};
use crate::token::{Spanned, Token, tokenize};

/// Parses a filter expression into an AST.
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        input_len: input.chars().count(),
    };
    let expr = parser.or_expr()?;
    parser.expect_end()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    input_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.input_len, |s| s.position)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut expr = self.and_expr()?;
        while self.eat(&Token::Or) {
            let rhs = self.and_expr()?;
            expr = Expr::or(expr, rhs);
        }
        Ok(expr)
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut expr = self.not_expr()?;
        while self.eat(&Token::And) {
            let rhs = self.not_expr()?;
            expr = Expr::and(expr, rhs);
        }
        Ok(expr)
    }

    fn not_expr(&mut self) -> Result<Expr> {
        if self.eat(&Token::Not) {
            let inner = self.cmp()?;
            return Ok(Expr::not(inner));
        }
        self.cmp()
    }

    fn cmp(&mut self) -> Result<Expr> {
        let left = self.operand()?;
        let op = match self.peek() {
            Some(Token::Eq) => CmpOp::Eq,
            Some(Token::Ne) => CmpOp::Ne,
            Some(Token::Lt) => CmpOp::Lt,
            Some(Token::Le) => CmpOp::Le,
            Some(Token::Gt) => CmpOp::Gt,
            Some(Token::Ge) => CmpOp::Ge,
            Some(Token::In) => CmpOp::In,
            Some(Token::Contains) => CmpOp::Contains,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.operand()?;
        Ok(Expr::cmp(op, left, right))
    }

    fn operand(&mut self) -> Result<Expr> {
        let position = self.position();
        match self.bump() {
            Some(Token::Literal(value)) => Ok(Expr::Literal(value)),
            Some(Token::Ident(name)) => Ok(Expr::Column(name)),
            Some(Token::LParen) => {
                let inner = self.or_expr()?;
                if !self.eat(&Token::RParen) {
                    return Err(FilterError::parse(self.position(), "expected ')'"));
                }
                Ok(inner)
            }
            Some(Token::LBracket) => self.list(),
            Some(other) => Err(FilterError::parse(
                position,
                format!("expected an operand, found {other:?}"),
            )),
            None => Err(FilterError::parse(position, "unexpected end of input")),
        }
    }

    fn list(&mut self) -> Result<Expr> {
        let mut items = Vec::new();
        if self.eat(&Token::RBracket) {
            return Ok(Expr::List(items));
        }
        loop {
            items.push(self.operand()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            if self.eat(&Token::RBracket) {
                return Ok(Expr::List(items));
            }
            return Err(FilterError::parse(self.position(), "expected ',' or ']'"));
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(FilterError::parse(
                self.position(),
                "unexpected trailing input",
            ))
        }
    }
}
