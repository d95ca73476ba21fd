pub mod chunk;
pub mod code_gen;
pub mod common;
pub mod compiler;
pub mod context;
pub mod cursor;
pub mod label;
pub mod lexer;
pub mod parser;
pub mod symbol_table;

pub use crate::chunk::{Chunk, Instruction, Segment};
pub use crate::common::{CompileError, CompileResult, DriverError, ErrorKind, Position};
pub use crate::compiler::{compile, compile_batch, Unit};
pub use crate::label::{Label, LabelAllocator};
