use thiserror::Error;

use crate::parser::ast::{BinOp, Expr, UnaryOp};
use crate::token::{Token, TokenKind};

pub mod ast;

/*
    Parse functions fit into two categories: prefix and infix. Both can
    exist for the same token kind; that is how '(' works as grouping
    (prefix) and as the call operator (infix).

    The core loop parses one prefix form, then folds infix forms into it
    for as long as the upcoming token binds more tightly than the
    enclosing context:

        parse_expr(min_prec):
            expr = prefix_handler(current)(self)
            while min_prec < infix_prec(current):
                expr = infix_handler(current)(self, expr)
            return expr
*/

type Prec = i32;

/// Smaller than any real precedence; returned for the end of the stream
/// and for every table entry that has no handler.
const SENTINEL_PREC: Prec = -9999;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("No prefix rule for token {kind:?} at line {line}, column {column}")]
    UnimplementedPrefix { kind: TokenKind, line: u32, column: u32 },
    #[error("No infix rule for token {kind:?} at line {line}, column {column}")]
    UnimplementedInfix { kind: TokenKind, line: u32, column: u32 },
    #[error("Expected {expected}, got {found:?} at line {line}, column {column}")]
    ExpectedToken {
        expected: &'static str,
        found: TokenKind,
        line: u32,
        column: u32,
    },
    #[error("Hit end of input without finding a statement terminator (; or }})")]
    MissingTerminator,
    #[error("Expected statement terminator before token at line {line}, column {column}")]
    TerminatorBeforeToken { line: u32, column: u32 },
    #[error("Call target must be a name at line {line}, column {column}")]
    CalleeNotName { line: u32, column: u32 },
    #[error("Expected expression for subscript index at line {line}, column {column}")]
    MissingSubscriptIndex { line: u32, column: u32 },
    #[error("Logical not cannot apply to a bare name at line {line}, column {column}")]
    NotOnName { line: u32, column: u32 },
    #[error("Invalid numeric literal '{lexeme}' at line {line}, column {column}")]
    InvalidNumber { lexeme: String, line: u32, column: u32 },
}

pub type ParseResult<T> = Result<T, ParseError>;

type PrefixFn<'a> = fn(&mut Parser<'a>) -> ParseResult<Expr>;
type InfixFn<'a> = fn(&mut Parser<'a>, Expr) -> ParseResult<Expr>;

pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    prefix_table: [(PrefixFn<'a>, Prec); TokenKind::COUNT],
    infix_table: [(InfixFn<'a>, Prec); TokenKind::COUNT],
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token<'a>>) -> Self {
        let mut prefix_table: [(PrefixFn<'a>, Prec); TokenKind::COUNT] =
            [(Self::prefix_boom as PrefixFn<'a>, SENTINEL_PREC); TokenKind::COUNT];
        let mut infix_table: [(InfixFn<'a>, Prec); TokenKind::COUNT] =
            [(Self::infix_boom as InfixFn<'a>, SENTINEL_PREC); TokenKind::COUNT];

        prefix_table[TokenKind::LBrace as usize] = (Self::parse_block, 1);
        prefix_table[TokenKind::LParen as usize] = (Self::parse_grouping, 1);
        prefix_table[TokenKind::Ret as usize] = (Self::parse_return, 1);
        prefix_table[TokenKind::Id as usize] = (Self::parse_name, 5);
        prefix_table[TokenKind::Num as usize] = (Self::parse_num, 5);
        prefix_table[TokenKind::Str as usize] = (Self::parse_str, 5);
        prefix_table[TokenKind::True as usize] = (Self::parse_bool, 5);
        prefix_table[TokenKind::False as usize] = (Self::parse_bool, 5);
        prefix_table[TokenKind::Bang as usize] = (Self::parse_unary, 100);
        prefix_table[TokenKind::Minus as usize] = (Self::parse_unary, 100);
        prefix_table[TokenKind::For as usize] = (Self::parse_for, 100);
        prefix_table[TokenKind::Fn as usize] = (Self::parse_fn_def, 100);
        prefix_table[TokenKind::If as usize] = (Self::parse_if, 100);
        prefix_table[TokenKind::Var as usize] = (Self::parse_var, 100);
        prefix_table[TokenKind::Print as usize] = (Self::parse_print, 100);

        infix_table[TokenKind::Equals as usize] = (Self::parse_binary, 10);
        infix_table[TokenKind::Comma as usize] = (Self::parse_comma_list, 20);
        infix_table[TokenKind::Colon as usize] = (Self::parse_binary, 22);
        infix_table[TokenKind::To as usize] = (Self::parse_binary, 23);
        infix_table[TokenKind::Cmp as usize] = (Self::parse_binary, 24);
        infix_table[TokenKind::Or as usize] = (Self::parse_binary, 25);
        infix_table[TokenKind::And as usize] = (Self::parse_binary, 26);
        infix_table[TokenKind::Plus as usize] = (Self::parse_binary, 30);
        infix_table[TokenKind::Minus as usize] = (Self::parse_binary, 30);
        infix_table[TokenKind::Div as usize] = (Self::parse_binary, 40);
        infix_table[TokenKind::Mult as usize] = (Self::parse_binary, 40);
        infix_table[TokenKind::Bang as usize] = (Self::parse_binary, 80);
        infix_table[TokenKind::LParen as usize] = (Self::parse_call, 100);
        infix_table[TokenKind::LBracket as usize] = (Self::parse_subscript, 100);

        Self {
            tokens,
            pos: 0,
            prefix_table,
            infix_table,
        }
    }

    /// Core Pratt routine: one prefix form, then infix folds while the
    /// upcoming token outranks `min_prec`.
    pub fn parse_expr(&mut self, min_prec: Prec) -> ParseResult<Expr> {
        if self.at_end() {
            return Ok(Expr::Empty);
        }
        let (prefix, _) = self.prefix_table[self.current_kind() as usize];
        let mut expr = prefix(self)?;

        while min_prec < self.infix_precedence() {
            let (infix, _) = self.infix_table[self.current_kind() as usize];
            expr = infix(self, expr)?;
        }
        Ok(expr)
    }

    /// Parses statements until the stream ends or the current token's
    /// prefix precedence no longer clears `min_prefix_prec`. Every
    /// statement ends in a consumed ';' or an already-consumed '}'.
    pub fn parse_statements(&mut self, min_prefix_prec: Prec) -> ParseResult<Vec<Expr>> {
        let mut statements = Vec::new();
        while !self.at_end() && min_prefix_prec < self.prefix_precedence() {
            statements.push(self.parse_expr(0)?);

            if self.at_end() {
                if self.last_kind() != TokenKind::RBrace {
                    return Err(ParseError::MissingTerminator);
                }
            } else if self.current_kind() == TokenKind::Semicolon {
                self.consume();
            } else if self.last_kind() != TokenKind::RBrace {
                let token = self.tokens[self.pos];
                return Err(ParseError::TerminatorBeforeToken {
                    line: token.line,
                    column: token.column,
                });
            }
            // a closing brace terminates its statement implicitly
        }
        Ok(statements)
    }

    // prefix handlers
    // NOTE: handlers must consume exactly the tokens of the form they build.

    fn parse_name(parser: &mut Parser<'a>) -> ParseResult<Expr> {
        Ok(Expr::Name(parser.consume().lexeme.to_string()))
    }

    fn parse_num(parser: &mut Parser<'a>) -> ParseResult<Expr> {
        let token = parser.consume();
        let value = token
            .lexeme
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidNumber {
                lexeme: token.lexeme.to_string(),
                line: token.line,
                column: token.column,
            })?;
        Ok(Expr::Num(value))
    }

    fn parse_str(parser: &mut Parser<'a>) -> ParseResult<Expr> {
        Ok(Expr::Str(parser.consume().lexeme.to_string()))
    }

    fn parse_bool(parser: &mut Parser<'a>) -> ParseResult<Expr> {
        let token = parser.consume();
        Ok(Expr::Bool(token.kind == TokenKind::True))
    }

    fn parse_unary(parser: &mut Parser<'a>) -> ParseResult<Expr> {
        let token = parser.consume();
        let op = match token.kind {
            TokenKind::Minus => UnaryOp::Neg,
            _ => UnaryOp::Not,
        };
        let right = parser.parse_expr(parser.prefix_prec_of(token.kind))?;
        if op == UnaryOp::Not && matches!(right, Expr::Name(_)) {
            return Err(ParseError::NotOnName {
                line: token.line,
                column: token.column,
            });
        }
        Ok(Expr::Unary {
            op,
            right: Box::new(right),
        })
    }

    fn parse_grouping(parser: &mut Parser<'a>) -> ParseResult<Expr> {
        let lparen = parser.consume();
        if parser.current_kind() == TokenKind::RParen {
            parser.consume();
            return Ok(Expr::Empty);
        }
        let expr = parser.parse_expr(parser.prefix_prec_of(lparen.kind))?;
        parser.expect(TokenKind::RParen, "')'")?;
        Ok(expr)
    }

    fn parse_return(parser: &mut Parser<'a>) -> ParseResult<Expr> {
        let token = parser.consume();
        let value = parser.parse_expr(parser.prefix_prec_of(token.kind))?;
        Ok(Expr::Return(Box::new(value)))
    }

    fn parse_print(parser: &mut Parser<'a>) -> ParseResult<Expr> {
        parser.consume();
        Ok(Expr::Print(Box::new(parser.parse_expr(0)?)))
    }

    fn parse_var(parser: &mut Parser<'a>) -> ParseResult<Expr> {
        parser.consume();
        Ok(Expr::Var(Box::new(parser.parse_expr(0)?)))
    }

    fn parse_block(parser: &mut Parser<'a>) -> ParseResult<Expr> {
        parser.consume(); // '{'
        let statements = if parser.current_kind() == TokenKind::RBrace {
            Vec::new()
        } else {
            parser.parse_statements(0)?
        };
        parser.expect(TokenKind::RBrace, "'}'")?;
        Ok(Expr::Block(statements))
    }

    fn parse_for(parser: &mut Parser<'a>) -> ParseResult<Expr> {
        parser.consume(); // 'for'
        let var = parser.expect(TokenKind::Id, "loop variable")?.lexeme.to_string();
        parser.expect(TokenKind::Colon, "':'")?;
        let range = parser.parse_expr(0)?;
        let body = parser.parse_expr(0)?;
        Ok(Expr::For {
            var,
            range: Box::new(range),
            body: Box::new(body),
        })
    }

    fn parse_if(parser: &mut Parser<'a>) -> ParseResult<Expr> {
        parser.consume(); // 'if'
        let cond = parser.parse_expr(0)?;
        if parser.current_kind() != TokenKind::LBrace {
            return Err(parser.expected_error("'{' opening the if body"));
        }
        let then_body = Self::parse_block(parser)?;
        let else_body = if parser.current_kind() == TokenKind::Else {
            parser.consume();
            if parser.current_kind() != TokenKind::LBrace {
                return Err(parser.expected_error("'{' opening the else body"));
            }
            Some(Box::new(Self::parse_block(parser)?))
        } else {
            None
        };
        Ok(Expr::If {
            cond: Box::new(cond),
            then_body: Box::new(then_body),
            else_body,
        })
    }

    fn parse_fn_def(parser: &mut Parser<'a>) -> ParseResult<Expr> {
        parser.consume(); // 'fn'
        let name = parser.expect(TokenKind::Id, "function name")?.lexeme.to_string();
        parser.expect(TokenKind::LParen, "'('")?;
        let params = if parser.current_kind() == TokenKind::RParen {
            Expr::Empty
        } else {
            parser.parse_expr(0)?
        };
        parser.expect(TokenKind::RParen, "')'")?;
        let body = parser.parse_expr(0)?;
        Ok(Expr::FnDef {
            name,
            params: Box::new(params),
            body: Box::new(body),
        })
    }

    // infix handlers

    fn parse_binary(parser: &mut Parser<'a>, left: Expr) -> ParseResult<Expr> {
        let token = parser.consume();
        let op = match token.kind {
            TokenKind::Equals => BinOp::Assign,
            TokenKind::Colon => BinOp::Bind,
            TokenKind::To => BinOp::Range,
            TokenKind::Cmp => BinOp::Cmp,
            TokenKind::Or => BinOp::Or,
            TokenKind::And => BinOp::And,
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Mult => BinOp::Mul,
            TokenKind::Div => BinOp::Div,
            TokenKind::Bang => BinOp::Bang,
            kind => unreachable!("no binary operator for {kind:?}"),
        };
        // right side parsed at the operator's own precedence keeps the
        // ladder left-associative
        let right = parser.parse_expr(parser.infix_prec_of(token.kind))?;
        Ok(Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_call(parser: &mut Parser<'a>, left: Expr) -> ParseResult<Expr> {
        let lparen = parser.consume();
        let Expr::Name(callee) = left else {
            return Err(ParseError::CalleeNotName {
                line: lparen.line,
                column: lparen.column,
            });
        };
        // call binds tightly on the left, weakly on the right
        let args = if parser.current_kind() == TokenKind::RParen {
            Expr::Empty
        } else {
            parser.parse_expr(0)?
        };
        parser.expect(TokenKind::RParen, "')'")?;
        Ok(Expr::Call {
            callee,
            args: Box::new(args),
        })
    }

    fn parse_subscript(parser: &mut Parser<'a>, left: Expr) -> ParseResult<Expr> {
        let lbracket = parser.consume();
        if parser.current_kind() == TokenKind::RBracket {
            return Err(ParseError::MissingSubscriptIndex {
                line: lbracket.line,
                column: lbracket.column,
            });
        }
        let index = parser.parse_expr(0)?;
        parser.expect(TokenKind::RBracket, "']'")?;
        Ok(Expr::Subscript {
            array: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_comma_list(parser: &mut Parser<'a>, first: Expr) -> ParseResult<Expr> {
        parser.consume(); // ','
        let mut items = vec![first];
        items.push(parser.parse_expr(parser.infix_prec_of(TokenKind::Comma))?);
        while parser.current_kind() == TokenKind::Comma {
            parser.consume();
            items.push(parser.parse_expr(0)?);
        }
        Ok(Expr::CommaList(items))
    }

    fn prefix_boom(parser: &mut Parser<'a>) -> ParseResult<Expr> {
        let token = parser.tokens[parser.pos];
        Err(ParseError::UnimplementedPrefix {
            kind: token.kind,
            line: token.line,
            column: token.column,
        })
    }

    fn infix_boom(parser: &mut Parser<'a>, _left: Expr) -> ParseResult<Expr> {
        let token = parser.tokens[parser.pos];
        Err(ParseError::UnimplementedInfix {
            kind: token.kind,
            line: token.line,
            column: token.column,
        })
    }

    // helpers

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current_kind(&self) -> TokenKind {
        self.tokens.get(self.pos).map_or(TokenKind::None, |token| token.kind)
    }

    fn last_kind(&self) -> TokenKind {
        if self.pos == 0 {
            TokenKind::None
        } else {
            self.tokens[self.pos - 1].kind
        }
    }

    fn consume(&mut self) -> Token<'a> {
        let token = self.tokens[self.pos];
        self.pos += 1;
        token
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> ParseResult<Token<'a>> {
        if self.current_kind() == kind {
            Ok(self.consume())
        } else {
            Err(self.expected_error(expected))
        }
    }

    fn expected_error(&self, expected: &'static str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(token) => ParseError::ExpectedToken {
                expected,
                found: token.kind,
                line: token.line,
                column: token.column,
            },
            None => {
                let (line, column) = self
                    .tokens
                    .last()
                    .map_or((0, 0), |token| (token.line, token.column));
                ParseError::ExpectedToken {
                    expected,
                    found: TokenKind::None,
                    line,
                    column,
                }
            }
        }
    }

    fn infix_precedence(&self) -> Prec {
        if self.at_end() {
            SENTINEL_PREC
        } else {
            self.infix_table[self.current_kind() as usize].1
        }
    }

    fn prefix_precedence(&self) -> Prec {
        if self.at_end() {
            SENTINEL_PREC
        } else {
            self.prefix_table[self.current_kind() as usize].1
        }
    }

    fn prefix_prec_of(&self, kind: TokenKind) -> Prec {
        self.prefix_table[kind as usize].1
    }

    fn infix_prec_of(&self, kind: TokenKind) -> Prec {
        self.infix_table[kind as usize].1
    }
}

/// Parses the whole token stream as a top-level statement list.
pub fn parse_tokens(tokens: Vec<Token<'_>>) -> ParseResult<Vec<Expr>> {
    Parser::new(tokens).parse_statements(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_source(source: &str) -> ParseResult<Vec<Expr>> {
        parse_tokens(tokenize(source).expect("tokenize should succeed"))
    }

    fn parse_one(source: &str) -> Expr {
        let mut statements = parse_source(source).expect("parse should succeed");
        assert_eq!(statements.len(), 1, "expected a single statement");
        statements.pop().expect("length checked above")
    }

    fn name(text: &str) -> Expr {
        Expr::Name(text.to_string())
    }

    fn num(value: f64) -> Expr {
        Expr::Num(value)
    }

    fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_one("1 + 2 * 3;");
        assert_eq!(expr, binary(num(1.0), BinOp::Add, binary(num(2.0), BinOp::Mul, num(3.0))));
    }

    #[test]
    fn same_precedence_operators_fold_left() {
        let expr = parse_one("1 - 2 - 3;");
        assert_eq!(
            expr,
            binary(binary(num(1.0), BinOp::Sub, num(2.0)), BinOp::Sub, num(3.0))
        );
    }

    #[test]
    fn higher_precedence_operator_groups_first() {
        // and (26) outranks cmp (24)
        let expr = parse_one("a cmp b and c;");
        assert_eq!(
            expr,
            binary(name("a"), BinOp::Cmp, binary(name("b"), BinOp::And, name("c")))
        );
    }

    #[test]
    fn grouping_overrides_precedence() {
        let expr = parse_one("(1 + 2) * 3;");
        assert_eq!(
            expr,
            binary(binary(num(1.0), BinOp::Add, num(2.0)), BinOp::Mul, num(3.0))
        );
    }

    #[test]
    fn empty_parens_are_the_empty_expression() {
        assert_eq!(parse_one("();"), Expr::Empty);
    }

    #[test]
    fn unary_minus_binds_tighter_than_multiplication() {
        let expr = parse_one("-2 * 3;");
        assert_eq!(
            expr,
            binary(
                Expr::Unary {
                    op: UnaryOp::Neg,
                    right: Box::new(num(2.0)),
                },
                BinOp::Mul,
                num(3.0)
            )
        );
    }

    #[test]
    fn logical_not_rejects_a_bare_name() {
        let err = parse_source("print !flag;").expect_err("expected parse failure");
        assert_eq!(err, ParseError::NotOnName { line: 1, column: 6 });
    }

    #[test]
    fn logical_not_accepts_literals_and_groupings() {
        assert_eq!(
            parse_one("!True;"),
            Expr::Unary {
                op: UnaryOp::Not,
                right: Box::new(Expr::Bool(true)),
            }
        );
        assert_eq!(
            parse_one("!(flag);"),
            Expr::Unary {
                op: UnaryOp::Not,
                right: Box::new(name("flag")),
            }
        );
    }

    #[test]
    fn trailing_bang_parses_as_a_binary_operator() {
        let expr = parse_one("3 ! 4;");
        assert_eq!(expr, binary(num(3.0), BinOp::Bang, num(4.0)));
    }

    #[test]
    fn trailing_bang_outranks_arithmetic() {
        // '!' (80) binds tighter than '+' (30)
        let expr = parse_one("a + b ! c;");
        assert_eq!(
            expr,
            binary(name("a"), BinOp::Add, binary(name("b"), BinOp::Bang, name("c")))
        );
    }

    #[test]
    fn call_arguments_become_a_comma_list() {
        let expr = parse_one("f(1, 2, 3);");
        assert_eq!(
            expr,
            Expr::Call {
                callee: "f".to_string(),
                args: Box::new(Expr::CommaList(vec![num(1.0), num(2.0), num(3.0)])),
            }
        );
    }

    #[test]
    fn empty_call_arguments_are_empty() {
        let expr = parse_one("f();");
        assert_eq!(
            expr,
            Expr::Call {
                callee: "f".to_string(),
                args: Box::new(Expr::Empty),
            }
        );
    }

    #[test]
    fn subscript_of_a_call_binds_postfix_left_to_right() {
        let expr = parse_one("f(x)[i];");
        assert_eq!(
            expr,
            Expr::Subscript {
                array: Box::new(Expr::Call {
                    callee: "f".to_string(),
                    args: Box::new(name("x")),
                }),
                index: Box::new(name("i")),
            }
        );
    }

    #[test]
    fn calling_a_subscript_is_rejected() {
        // the call target must be a plain name
        let err = parse_source("f[i](x);").expect_err("expected parse failure");
        assert!(matches!(err, ParseError::CalleeNotName { .. }));
    }

    #[test]
    fn missing_subscript_index_is_rejected() {
        let err = parse_source("xs[];").expect_err("expected parse failure");
        assert!(matches!(err, ParseError::MissingSubscriptIndex { .. }));
    }

    #[test]
    fn comma_binds_tighter_than_assignment() {
        // the ladder puts ',' (20) above '=' (10), so the list forms on
        // the right of the assignment
        let expr = parse_one("a = b, c;");
        assert_eq!(
            expr,
            binary(
                name("a"),
                BinOp::Assign,
                Expr::CommaList(vec![name("b"), name("c")])
            )
        );
    }

    #[test]
    fn parses_for_with_range_and_block_body() {
        let expr = parse_one("for i : 1 to 10 { print i; }");
        assert_eq!(
            expr,
            Expr::For {
                var: "i".to_string(),
                range: Box::new(binary(num(1.0), BinOp::Range, num(10.0))),
                body: Box::new(Expr::Block(vec![Expr::Print(Box::new(name("i")))])),
            }
        );
    }

    #[test]
    fn for_requires_a_loop_variable() {
        let err = parse_source("for : 1 to 2 {}").expect_err("expected parse failure");
        assert_eq!(
            err,
            ParseError::ExpectedToken {
                expected: "loop variable",
                found: TokenKind::Colon,
                line: 1,
                column: 4,
            }
        );
    }

    #[test]
    fn parses_if_with_optional_else() {
        let without_else = parse_one("if x cmp 1 { print 1; }");
        assert!(matches!(
            without_else,
            Expr::If { else_body: None, .. }
        ));

        let with_else = parse_one("if x cmp 1 { print 1; } else { print 2; }");
        let Expr::If { cond, else_body, .. } = with_else else {
            panic!("expected if expression");
        };
        assert_eq!(*cond, binary(name("x"), BinOp::Cmp, num(1.0)));
        assert!(else_body.is_some());
    }

    #[test]
    fn if_requires_a_block_body() {
        let err = parse_source("if x cmp 1 print 1;").expect_err("expected parse failure");
        assert_eq!(
            err,
            ParseError::ExpectedToken {
                expected: "'{' opening the if body",
                found: TokenKind::Print,
                line: 1,
                column: 11,
            }
        );
    }

    #[test]
    fn parses_fn_definition_with_params_and_body() {
        let expr = parse_one("fn add(a, b) { ret a + b; }");
        assert_eq!(
            expr,
            Expr::FnDef {
                name: "add".to_string(),
                params: Box::new(Expr::CommaList(vec![name("a"), name("b")])),
                body: Box::new(Expr::Block(vec![Expr::Return(Box::new(binary(
                    name("a"),
                    BinOp::Add,
                    name("b")
                )))])),
            }
        );
    }

    #[test]
    fn empty_block_parses_to_no_statements() {
        assert_eq!(parse_one("{}"), Expr::Block(Vec::new()));
    }

    #[test]
    fn a_closing_brace_terminates_the_statement_implicitly() {
        let statements = parse_source("{ print 1; } print 2;").expect("parse should succeed");
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn missing_operand_reports_the_offending_token() {
        let err = parse_source("print 1 + ;").expect_err("expected parse failure");
        assert_eq!(
            err,
            ParseError::UnimplementedPrefix {
                kind: TokenKind::Semicolon,
                line: 1,
                column: 10,
            }
        );
    }

    #[test]
    fn missing_terminator_at_end_of_input_is_fatal() {
        let err = parse_source("1 + 2").expect_err("expected parse failure");
        assert_eq!(err, ParseError::MissingTerminator);
    }

    #[test]
    fn missing_terminator_between_statements_is_fatal() {
        let err = parse_source("print 1 print 2;").expect_err("expected parse failure");
        assert_eq!(err, ParseError::TerminatorBeforeToken { line: 1, column: 8 });
    }

    #[test]
    fn parsing_is_deterministic() {
        let first = parse_source("print (1 + 2) * f(x, y)[0];").expect("parse should succeed");
        let second = parse_source("print (1 + 2) * f(x, y)[0];").expect("parse should succeed");
        assert_eq!(first, second);
    }
}
