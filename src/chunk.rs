use std::fmt;

use crate::label::Label;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Push(Segment, usize),
    Pop(Segment, usize),
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
    Label(Label),
    Goto(Label),
    IfGoto(Label),
    Function(String, usize),
    Call(String, usize),
    Return,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(segment, index) => write!(f, "push {} {}", segment.as_str(), index),
            Instruction::Pop(segment, index) => write!(f, "pop {} {}", segment.as_str(), index),
            Instruction::Add => f.write_str("add"),
            Instruction::Sub => f.write_str("sub"),
            Instruction::Neg => f.write_str("neg"),
            Instruction::Eq => f.write_str("eq"),
            Instruction::Gt => f.write_str("gt"),
            Instruction::Lt => f.write_str("lt"),
            Instruction::And => f.write_str("and"),
            Instruction::Or => f.write_str("or"),
            Instruction::Not => f.write_str("not"),
            Instruction::Label(label) => write!(f, "label {}", label),
            Instruction::Goto(label) => write!(f, "goto {}", label),
            Instruction::IfGoto(label) => write!(f, "if-goto {}", label),
            Instruction::Function(name, locals) => write!(f, "function {} {}", name, locals),
            Instruction::Call(name, args) => write!(f, "call {} {}", name, args),
            Instruction::Return => f.write_str("return"),
        }
    }
}

/// The instruction listing of one compiled unit.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Chunk {
    code: Vec<Instruction>,
    lines: Vec<u32>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, code: Instruction, line: u32) {
        self.code.push(code);
        self.lines.push(line);
    }

    pub fn code(&self) -> &[Instruction] {
        &self.code
    }

    /// Source line that produced the instruction at `offset`.
    pub fn line(&self, offset: usize) -> Option<u32> {
        self.lines.get(offset).copied()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn disassemble(&self, name: &str) -> String {
        let mut listing = format!("== {} ==\n", name);
        for (offset, code) in self.code.iter().enumerate() {
            listing.push_str(&format!("{:>4} ", offset));
            if offset > 0 && self.lines[offset] == self.lines[offset - 1] {
                listing.push_str("   | ");
            } else {
                listing.push_str(&format!("{:>4} ", self.lines[offset]));
            }
            listing.push_str(&format!("{}\n", code));
        }
        listing
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for code in &self.code {
            writeln!(f, "{}", code)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::LabelAllocator;

    #[test]
    fn renders_one_instruction_per_line() {
        let mut labels = LabelAllocator::new();
        let label = labels.next_label();
        let mut chunk = Chunk::new();
        chunk.append(Instruction::Function("Main.main".to_string(), 2), 1);
        chunk.append(Instruction::Push(Segment::Constant, 7), 2);
        chunk.append(Instruction::Pop(Segment::Pointer, 1), 2);
        chunk.append(Instruction::Label(label.clone()), 3);
        chunk.append(Instruction::IfGoto(label), 3);
        chunk.append(Instruction::Call("Math.multiply".to_string(), 2), 4);
        chunk.append(Instruction::Return, 5);
        assert_eq!(
            chunk.to_string(),
            "function Main.main 2\npush constant 7\npop pointer 1\nlabel L1\nif-goto L1\ncall Math.multiply 2\nreturn\n"
        );
        assert_eq!(chunk.len(), 7);
        assert_eq!(chunk.line(4), Some(3));
    }

    #[test]
    fn disassembly_folds_repeated_lines() {
        let mut chunk = Chunk::new();
        chunk.append(Instruction::Push(Segment::Local, 0), 3);
        chunk.append(Instruction::Neg, 3);
        chunk.append(Instruction::Return, 4);
        assert_eq!(
            chunk.disassemble("Main"),
            "== Main ==\n   0    3 push local 0\n   1    | neg\n   2    4 return\n"
        );
    }
}
