use tracing::{debug, trace};

use crate::chunk::Chunk;
use crate::common::CompileResult;
use crate::label::LabelAllocator;
use crate::lexer::tokenize;
use crate::parser::Parser;

/// Compiles one class. Nothing is returned unless the whole unit compiled.
pub fn compile(source: &str, labels: &mut LabelAllocator) -> CompileResult<Chunk> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(&tokens, labels);
    parser.class()?;
    let chunk = parser.end();
    debug!(
        tokens = tokens.len(),
        instructions = chunk.len(),
        "compiled unit"
    );
    Ok(chunk)
}

pub struct Unit<'a> {
    pub name: &'a str,
    pub source: &'a str,
}

/// Compiles units in order with one label allocator, so labels never
/// collide within the batch. A failing unit does not stop the others.
pub fn compile_batch<'a>(units: &[Unit<'a>]) -> Vec<(&'a str, CompileResult<Chunk>)> {
    let mut labels = LabelAllocator::new();
    units
        .iter()
        .map(|unit| {
            let result = compile(unit.source, &mut labels);
            if let Ok(chunk) = &result {
                trace!("{}", chunk.disassemble(unit.name));
            }
            (unit.name, result)
        })
        .collect()
}
