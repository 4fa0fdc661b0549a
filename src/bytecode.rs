use thiserror::Error;

use crate::parser::ast::{BinOp, Expr, UnaryOp};
use crate::value::Value;

/// Single-byte instruction set executed by the VM.
///
/// `Const`, `DefineGlobal`, and `DefineLocal` are trailed by one byte naming
/// a constant-pool slot; every other opcode stands alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Nop = 0,
    Const,
    Not,
    Neg,
    Add,
    Sub,
    Mult,
    Div,
    Or,
    And,
    Cmp,
    Print,
    Pop,
    DefineGlobal,
    DefineLocal,
    Ret,
    Eof,
}

impl OpCode {
    pub fn from_byte(byte: u8) -> Option<OpCode> {
        let op = match byte {
            0 => OpCode::Nop,
            1 => OpCode::Const,
            2 => OpCode::Not,
            3 => OpCode::Neg,
            4 => OpCode::Add,
            5 => OpCode::Sub,
            6 => OpCode::Mult,
            7 => OpCode::Div,
            8 => OpCode::Or,
            9 => OpCode::And,
            10 => OpCode::Cmp,
            11 => OpCode::Print,
            12 => OpCode::Pop,
            13 => OpCode::DefineGlobal,
            14 => OpCode::DefineLocal,
            15 => OpCode::Ret,
            16 => OpCode::Eof,
            _ => return None,
        };
        Some(op)
    }

    /// True for opcodes trailed by a one-byte constant-pool index.
    pub fn has_const_operand(self) -> bool {
        matches!(self, OpCode::Const | OpCode::DefineGlobal | OpCode::DefineLocal)
    }
}

/// A single byte addresses the pool, so it holds at most 255 entries.
pub const MAX_CONSTANTS: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("No code generation for {form} expression '{expr}'")]
    UnsupportedForm { form: &'static str, expr: String },
    #[error("Constant pool limit of 255 entries exceeded")]
    TooManyConstants,
}

/// Metadata recorded alongside the code stream, one entry per byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineInfo {
    pub line: u32,
}

/// Linear opcode stream plus its constant pool and per-byte line data.
///
/// A chunk is append-only while code generation runs, terminated once by
/// `finalize`, and read-only inside the VM.
#[derive(Debug, Default, Clone)]
pub struct Chunk {
    code: Vec<u8>,
    metadata: Vec<LineInfo>,
    constants: Vec<Value>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_op(&mut self, op: OpCode, line: u32) {
        self.code.push(op as u8);
        self.metadata.push(LineInfo { line });
    }

    /// Registers `value` in the pool and emits `op` plus the pool index.
    pub fn add_const_op(&mut self, op: OpCode, value: Value, line: u32) -> Result<(), CompileError> {
        let index = self.register_constant(value)?;
        self.add_op(op, line);
        self.push_byte(index, line);
        Ok(())
    }

    pub fn register_constant(&mut self, value: Value) -> Result<u8, CompileError> {
        if self.constants.len() >= MAX_CONSTANTS {
            return Err(CompileError::TooManyConstants);
        }
        self.constants.push(value);
        Ok((self.constants.len() - 1) as u8)
    }

    // Raw byte append, for constant indexes.
    pub(crate) fn push_byte(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.metadata.push(LineInfo { line });
    }

    pub fn constant(&self, index: u8) -> Option<&Value> {
        self.constants.get(index as usize)
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn line(&self, offset: usize) -> u32 {
        self.metadata.get(offset).map_or(0, |info| info.line)
    }

    /// Terminates the stream: a chunk always ends in `RET` + `EOF`.
    /// Idempotent once terminated.
    pub fn finalize(&mut self) {
        if self.code.last() != Some(&(OpCode::Eof as u8)) {
            self.add_op(OpCode::Ret, 0);
            self.add_op(OpCode::Eof, 0);
        }
        debug_assert_eq!(self.code.len(), self.metadata.len());
    }

    /// Human-readable listing, for `--dump-bytecode`.
    pub fn disassemble(&self) -> String {
        use std::fmt::Write;

        let mut listing = String::from("== bytecode ==\n");
        let mut offset = 0;
        while offset < self.code.len() {
            let byte = self.code[offset];
            match OpCode::from_byte(byte) {
                Some(op) if op.has_const_operand() => {
                    let index = self.code.get(offset + 1).copied();
                    match index.and_then(|index| self.constant(index).map(|value| (index, value))) {
                        Some((index, value)) => {
                            let _ = writeln!(listing, "{offset:4}: {op:?} {index} ; {value}");
                        }
                        None => {
                            let _ = writeln!(listing, "{offset:4}: {op:?} <bad index>");
                        }
                    }
                    offset += 2;
                }
                Some(op) => {
                    let _ = writeln!(listing, "{offset:4}: {op:?}");
                    offset += 1;
                }
                None => {
                    let _ = writeln!(listing, "{offset:4}: <unknown byte {byte}>");
                    offset += 1;
                }
            }
        }
        listing
    }
}

/// Lowers the parsed statement list into one finalized chunk.
pub fn compile(statements: &[Expr]) -> Result<Chunk, CompileError> {
    let mut chunk = Chunk::new();
    for statement in statements {
        compile_expr(statement, &mut chunk)?;
    }
    chunk.finalize();
    Ok(chunk)
}

fn compile_expr(expr: &Expr, chunk: &mut Chunk) -> Result<(), CompileError> {
    match expr {
        Expr::Num(value) => chunk.add_const_op(OpCode::Const, Value::Num(*value), 0)?,
        Expr::Bool(value) => chunk.add_const_op(OpCode::Const, Value::Bool(*value), 0)?,
        Expr::Str(value) => chunk.add_const_op(OpCode::Const, Value::Str(value.clone()), 0)?,
        Expr::Unary { op, right } => {
            compile_expr(right, chunk)?;
            chunk.add_op(
                match op {
                    UnaryOp::Neg => OpCode::Neg,
                    UnaryOp::Not => OpCode::Not,
                },
                0,
            );
        }
        Expr::Binary { left, op, right } => {
            let Some(opcode) = binary_opcode(*op) else {
                return Err(unsupported(expr));
            };
            // strict left-then-right evaluation; the VM pops the right
            // operand first
            compile_expr(left, chunk)?;
            compile_expr(right, chunk)?;
            chunk.add_op(opcode, 0);
        }
        Expr::Print(value) => {
            compile_expr(value, chunk)?;
            chunk.add_op(OpCode::Print, 0);
        }
        // the returned value is not materialized; RET halts on its own
        Expr::Return(_) => chunk.add_op(OpCode::Ret, 0),
        Expr::Var(binding) => compile_var_binding(expr, binding, chunk)?,
        Expr::Empty
        | Expr::Name(_)
        | Expr::Call { .. }
        | Expr::Subscript { .. }
        | Expr::CommaList(_)
        | Expr::Block(_)
        | Expr::For { .. }
        | Expr::FnDef { .. }
        | Expr::If { .. } => return Err(unsupported(expr)),
    }
    Ok(())
}

// Only the `var name = expr` shape lowers: the value, then a global bind
// whose name lives in the constant pool.
fn compile_var_binding(var_expr: &Expr, binding: &Expr, chunk: &mut Chunk) -> Result<(), CompileError> {
    if let Expr::Binary {
        left,
        op: BinOp::Assign,
        right,
    } = binding
        && let Expr::Name(name) = left.as_ref()
    {
        compile_expr(right, chunk)?;
        chunk.add_const_op(OpCode::DefineGlobal, Value::Str(name.clone()), 0)?;
        return Ok(());
    }
    Err(unsupported(var_expr))
}

fn binary_opcode(op: BinOp) -> Option<OpCode> {
    match op {
        BinOp::Add => Some(OpCode::Add),
        BinOp::Sub => Some(OpCode::Sub),
        BinOp::Mul => Some(OpCode::Mult),
        BinOp::Div => Some(OpCode::Div),
        BinOp::Or => Some(OpCode::Or),
        BinOp::And => Some(OpCode::And),
        BinOp::Cmp => Some(OpCode::Cmp),
        BinOp::Assign | BinOp::Bind | BinOp::Range | BinOp::Bang => None,
    }
}

fn unsupported(expr: &Expr) -> CompileError {
    CompileError::UnsupportedForm {
        form: expr.kind_name(),
        expr: expr.to_string(),
    }
}
