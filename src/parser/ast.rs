//! Expression tree produced by the Pratt parser.
//!
//! Statements are expressions: blocks, control flow, definitions, and plain
//! arithmetic all share one tagged sum, because the dispatch tables treat
//! every construct as either a prefix or an infix form. Nodes own their
//! children exclusively; there is no sharing between subtrees.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Assign,
    Bind,
    Range,
    Cmp,
    Or,
    And,
    Add,
    Sub,
    Mul,
    Div,
    /// Trailing `!`; parses like any other binary operator but has no
    /// lowering, so it only surfaces at compile time.
    Bang,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Placeholder for absent arguments and empty parens.
    Empty,
    Name(String),
    Num(f64),
    Bool(bool),
    Str(String),
    Unary {
        op: UnaryOp,
        right: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// The callee is a plain name; the parser rejects anything else.
    Call {
        callee: String,
        args: Box<Expr>,
    },
    Subscript {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    CommaList(Vec<Expr>),
    Block(Vec<Expr>),
    For {
        var: String,
        range: Box<Expr>,
        body: Box<Expr>,
    },
    FnDef {
        name: String,
        params: Box<Expr>,
        body: Box<Expr>,
    },
    If {
        cond: Box<Expr>,
        then_body: Box<Expr>,
        else_body: Option<Box<Expr>>,
    },
    Return(Box<Expr>),
    Var(Box<Expr>),
    Print(Box<Expr>),
}

impl Expr {
    /// Node label used by diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Empty => "empty",
            Expr::Name(_) => "name",
            Expr::Num(_) => "number",
            Expr::Bool(_) => "bool",
            Expr::Str(_) => "string",
            Expr::Unary { .. } => "unary",
            Expr::Binary { .. } => "binary",
            Expr::Call { .. } => "call",
            Expr::Subscript { .. } => "subscript",
            Expr::CommaList(_) => "comma list",
            Expr::Block(_) => "block",
            Expr::For { .. } => "for loop",
            Expr::FnDef { .. } => "fn definition",
            Expr::If { .. } => "if",
            Expr::Return(_) => "return",
            Expr::Var(_) => "var",
            Expr::Print(_) => "print",
        }
    }

    fn fmt_at(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "    ".repeat(depth);
        match self {
            Expr::Empty => write!(f, "{pad}(EMPTY)"),
            Expr::Name(name) => write!(f, "{pad}{name}"),
            Expr::Num(value) => write!(f, "{pad}{value}"),
            Expr::Bool(true) => write!(f, "{pad}True"),
            Expr::Bool(false) => write!(f, "{pad}False"),
            Expr::Str(value) => write!(f, "{pad}\"{value}\""),
            Expr::Unary { op, right } => write!(f, "{pad}({op}{right})"),
            Expr::Binary { left, op, right } => write!(f, "{pad}({left} {op} {right})"),
            Expr::Call { callee, args } => write!(f, "{pad}{callee}({args})"),
            Expr::Subscript { array, index } => write!(f, "{pad}{array}[{index}]"),
            Expr::CommaList(items) => {
                write!(f, "{pad}")?;
                for (position, item) in items.iter().enumerate() {
                    if position > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Expr::Block(statements) => {
                if statements.is_empty() {
                    return write!(f, "{pad}{{}}");
                }
                writeln!(f, "{pad}{{")?;
                for statement in statements {
                    statement.fmt_at(f, depth + 1)?;
                    writeln!(f, ";")?;
                }
                write!(f, "{pad}}}")
            }
            Expr::For { var, range, body } => {
                writeln!(f, "{pad}for {var} : {range}")?;
                body.fmt_at(f, depth)
            }
            Expr::FnDef { name, params, body } => {
                writeln!(f, "{pad}fn {name}({params})")?;
                body.fmt_at(f, depth)
            }
            Expr::If {
                cond,
                then_body,
                else_body,
            } => {
                writeln!(f, "{pad}if {cond}")?;
                then_body.fmt_at(f, depth)?;
                if let Some(else_body) = else_body {
                    writeln!(f)?;
                    writeln!(f, "{pad}else")?;
                    else_body.fmt_at(f, depth)?;
                }
                Ok(())
            }
            Expr::Return(value) => write!(f, "{pad}ret {value}"),
            Expr::Var(binding) => write!(f, "{pad}var {binding}"),
            Expr::Print(value) => write!(f, "{pad}print {value}"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_at(f, 0)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        })
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinOp::Assign => "=",
            BinOp::Bind => ":",
            BinOp::Range => "to",
            BinOp::Cmp => "cmp",
            BinOp::Or => "or",
            BinOp::And => "and",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Bang => "!",
        })
    }
}
