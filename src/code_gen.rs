use crate::chunk::{Chunk, Instruction, Segment};
use crate::label::Label;

/// Appends instructions to the unit's listing, tagging each with the
/// source line the parser is on.
pub struct Generator {
    chunk: Chunk,
    line: u32,
}

impl Generator {
    pub fn new() -> Self {
        Self {
            chunk: Chunk::new(),
            line: 1,
        }
    }

    pub fn set_line(&mut self, line: u32) {
        self.line = line;
    }

    pub fn emit(&mut self, code: Instruction) {
        self.chunk.append(code, self.line)
    }

    pub fn emit_push(&mut self, segment: Segment, index: usize) {
        self.emit(Instruction::Push(segment, index))
    }

    pub fn emit_pop(&mut self, segment: Segment, index: usize) {
        self.emit(Instruction::Pop(segment, index))
    }

    pub fn emit_constant(&mut self, value: usize) {
        self.emit_push(Segment::Constant, value)
    }

    pub fn emit_call(&mut self, name: String, args: usize) {
        self.emit(Instruction::Call(name, args))
    }

    pub fn emit_function(&mut self, name: String, locals: usize) {
        self.emit(Instruction::Function(name, locals))
    }

    pub fn emit_label(&mut self, label: &Label) {
        self.emit(Instruction::Label(label.clone()))
    }

    pub fn emit_goto(&mut self, label: &Label) {
        self.emit(Instruction::Goto(label.clone()))
    }

    pub fn emit_if_goto(&mut self, label: &Label) {
        self.emit(Instruction::IfGoto(label.clone()))
    }

    /// Leaves a new String object holding `text` on the stack.
    pub fn emit_string(&mut self, text: &str) {
        self.emit_constant(text.len());
        self.emit_call("String.new".to_string(), 1);
        for c in text.bytes() {
            self.emit_constant(c as usize);
            self.emit_call("String.appendChar".to_string(), 2);
        }
    }

    /// Points `that` at `base + offset`, both already on the stack.
    pub fn emit_rebase_that(&mut self) {
        self.emit(Instruction::Add);
        self.emit_pop(Segment::Pointer, 1);
    }

    pub fn end(self) -> Chunk {
        self.chunk
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_constants_build_a_string_object() {
        let mut generator = Generator::new();
        generator.emit_string("Hi");
        assert_eq!(
            generator.end().to_string(),
            "push constant 2\ncall String.new 1\npush constant 72\ncall String.appendChar 2\npush constant 105\ncall String.appendChar 2\n"
        );
    }

    #[test]
    fn records_current_line() {
        let mut generator = Generator::new();
        generator.emit(Instruction::Add);
        generator.set_line(9);
        generator.emit(Instruction::Sub);
        let chunk = generator.end();
        assert_eq!(chunk.line(0), Some(1));
        assert_eq!(chunk.line(1), Some(9));
    }
}
