use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::bytecode::{Chunk, OpCode};
use crate::value::Value;

/// Ceiling on executed opcodes; crossing it reports a runaway program.
const MAX_INSTRUCTIONS: usize = 1_000_000;

/// How a run of the fetch-decode-execute loop ended.
///
/// `Err` means execution fell through to the chunk's `EOF` marker without
/// an explicit `RET`; `InfLoop` means the instruction budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmStatus {
    Ok,
    Err,
    InfLoop,
}

impl fmt::Display for VmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VmStatus::Ok => "OK",
            VmStatus::Err => "ERR",
            VmStatus::InfLoop => "INF_LOOP",
        })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RuntimeError {
    #[error("Unknown opcode byte {byte} at offset {offset}")]
    UnknownOpcode { byte: u8, offset: usize },
    #[error("Constant index {index} out of range at offset {offset}")]
    BadConstantIndex { index: u8, offset: usize },
    #[error("Bytecode ended inside an instruction at offset {offset}")]
    TruncatedChunk { offset: usize },
    #[error("Operand stack underflow at offset {offset}")]
    StackUnderflow { offset: usize },
    #[error("Type mismatch: {op} cannot apply to {operand}")]
    TypeMismatch { op: &'static str, operand: &'static str },
    #[error("Variable name must be a string constant, got {got}")]
    BadDefineName { got: &'static str },
}

/// Stack machine over a finalized `Chunk`.
///
/// The operand stack keeps a null sentinel in slot zero so `tos` is total.
/// Globals live in one process-lifetime map; locals live in a stack of
/// frames whose bottom frame is always present.
pub struct VM {
    stack: Vec<Value>,
    globals: HashMap<String, Value>,
    frames: Vec<HashMap<String, Value>>,
    /// One entry per executed `PRINT`, in order.
    pub output: Vec<String>,
}

impl VM {
    pub fn new() -> Self {
        Self {
            stack: vec![Value::Null],
            globals: HashMap::new(),
            frames: vec![HashMap::new()],
            output: Vec::new(),
        }
    }

    pub fn run(&mut self, chunk: &Chunk) -> Result<VmStatus, RuntimeError> {
        let code = chunk.code();
        let mut ip = 0;
        let mut executed = 0;

        while executed < MAX_INSTRUCTIONS && ip < code.len() {
            executed += 1;
            let offset = ip;
            let byte = code[ip];
            ip += 1;
            let op = OpCode::from_byte(byte).ok_or(RuntimeError::UnknownOpcode { byte, offset })?;

            match op {
                OpCode::Nop => {}
                OpCode::Const => {
                    let value = self.read_constant(chunk, code, &mut ip, offset)?;
                    self.push(value);
                }
                OpCode::Neg => {
                    let negated = match self.pop(offset)? {
                        Value::Num(value) => Value::Num(-value),
                        Value::Bool(value) => Value::Bool(!value),
                        other => {
                            return Err(RuntimeError::TypeMismatch {
                                op: "NEG",
                                operand: other.type_name(),
                            });
                        }
                    };
                    self.push(negated);
                }
                OpCode::Not => {
                    let value = self.pop(offset)?;
                    let truth = coerce_bool(&value, "NOT")?;
                    self.push(Value::Bool(!truth));
                }
                OpCode::Add | OpCode::Sub | OpCode::Mult | OpCode::Div => {
                    // pop b before a: a was pushed first
                    let b = self.pop(offset)?;
                    let a = self.pop(offset)?;
                    let result = arithmetic(op, a, b)?;
                    self.push(result);
                }
                OpCode::And | OpCode::Or => {
                    let b = self.pop(offset)?;
                    let a = self.pop(offset)?;
                    let lhs = coerce_bool(&a, op_name(op))?;
                    let rhs = coerce_bool(&b, op_name(op))?;
                    let value = if op == OpCode::And { lhs && rhs } else { lhs || rhs };
                    self.push(Value::Bool(value));
                }
                OpCode::Cmp => {
                    let b = self.pop(offset)?;
                    let a = self.pop(offset)?;
                    self.push(Value::Bool(a == b));
                }
                OpCode::Print => {
                    let value = self.pop(offset)?;
                    self.output.push(value.to_string());
                }
                OpCode::Pop => {
                    self.pop(offset)?;
                }
                OpCode::DefineGlobal => {
                    let name = self.read_define_name(chunk, code, &mut ip, offset)?;
                    let value = self.pop(offset)?;
                    self.globals.insert(name, value);
                }
                OpCode::DefineLocal => {
                    let name = self.read_define_name(chunk, code, &mut ip, offset)?;
                    let value = self.pop(offset)?;
                    let frame = self.frames.last_mut().expect("bottom frame is always present");
                    frame.insert(name, value);
                }
                OpCode::Ret => return Ok(VmStatus::Ok),
                OpCode::Eof => return Ok(VmStatus::Err),
            }
        }
        Ok(VmStatus::InfLoop)
    }

    fn read_constant(
        &self,
        chunk: &Chunk,
        code: &[u8],
        ip: &mut usize,
        offset: usize,
    ) -> Result<Value, RuntimeError> {
        let index = *code.get(*ip).ok_or(RuntimeError::TruncatedChunk { offset })?;
        *ip += 1;
        chunk
            .constant(index)
            .cloned()
            .ok_or(RuntimeError::BadConstantIndex { index, offset })
    }

    fn read_define_name(
        &self,
        chunk: &Chunk,
        code: &[u8],
        ip: &mut usize,
        offset: usize,
    ) -> Result<String, RuntimeError> {
        match self.read_constant(chunk, code, ip, offset)? {
            Value::Str(name) => Ok(name),
            other => Err(RuntimeError::BadDefineName {
                got: other.type_name(),
            }),
        }
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    // The sentinel in slot zero is not poppable.
    fn pop(&mut self, offset: usize) -> Result<Value, RuntimeError> {
        if self.stack.len() <= 1 {
            return Err(RuntimeError::StackUnderflow { offset });
        }
        Ok(self.stack.pop().expect("length checked above"))
    }

    pub fn tos(&self) -> &Value {
        self.stack.last().expect("sentinel keeps the stack non-empty")
    }

    /// Number of values above the sentinel.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    pub fn local(&self, name: &str) -> Option<&Value> {
        self.frames.last().and_then(|frame| frame.get(name))
    }

    /// Scoping hooks for block and function frames. No opcode drives these
    /// yet; `DefineLocal` writes into whichever frame is on top.
    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

fn coerce_bool(value: &Value, op: &'static str) -> Result<bool, RuntimeError> {
    value.as_bool().ok_or(RuntimeError::TypeMismatch {
        op,
        operand: value.type_name(),
    })
}

// Two numbers stay numeric; any other coercible pair degrades to the
// boolean-algebra analogue of the operator.
fn arithmetic(op: OpCode, a: Value, b: Value) -> Result<Value, RuntimeError> {
    if let (Value::Num(x), Value::Num(y)) = (&a, &b) {
        let value = match op {
            OpCode::Add => x + y,
            OpCode::Sub => x - y,
            OpCode::Mult => x * y,
            _ => x / y,
        };
        return Ok(Value::Num(value));
    }
    let x = coerce_bool(&a, op_name(op))?;
    let y = coerce_bool(&b, op_name(op))?;
    let value = match op {
        OpCode::Add => x || y,
        OpCode::Sub => x && !y,
        _ => x && y,
    };
    Ok(Value::Bool(value))
}

fn op_name(op: OpCode) -> &'static str {
    match op {
        OpCode::Add => "ADD",
        OpCode::Sub => "SUB",
        OpCode::Mult => "MULT",
        OpCode::Div => "DIV",
        OpCode::And => "AND",
        OpCode::Or => "OR",
        _ => "OP",
    }
}
