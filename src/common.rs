use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}:{}]", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    UndeclaredIdentifier,
    UnsupportedConstruct,
    DuplicateDeclaration,
}

/// A failure that ends the compilation of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("{position} Lexical error at '{text}': {message}")]
    Lexical {
        position: Position,
        text: String,
        message: &'static str,
    },
    #[error("{position} Syntax error at '{found}': expected {expected}")]
    Syntax {
        position: Position,
        found: String,
        expected: String,
    },
    #[error("{position} Undeclared identifier error at '{name}': not a variable in scope")]
    UndeclaredIdentifier { position: Position, name: String },
    #[error("{position} Unsupported construct error at '{keyword}': expected {expected}")]
    UnsupportedConstruct {
        position: Position,
        keyword: String,
        expected: &'static str,
    },
    #[error("{position} Duplicate declaration error at '{name}': already declared in this scope")]
    DuplicateDeclaration { position: Position, name: String },
}

impl CompileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Lexical { .. } => ErrorKind::Lexical,
            CompileError::Syntax { .. } => ErrorKind::Syntax,
            CompileError::UndeclaredIdentifier { .. } => ErrorKind::UndeclaredIdentifier,
            CompileError::UnsupportedConstruct { .. } => ErrorKind::UnsupportedConstruct,
            CompileError::DuplicateDeclaration { .. } => ErrorKind::DuplicateDeclaration,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            CompileError::Lexical { position, .. }
            | CompileError::Syntax { position, .. }
            | CompileError::UndeclaredIdentifier { position, .. }
            | CompileError::UnsupportedConstruct { position, .. }
            | CompileError::DuplicateDeclaration { position, .. } => *position,
        }
    }

    /// Text of the offending token.
    pub fn token(&self) -> &str {
        match self {
            CompileError::Lexical { text, .. } => text,
            CompileError::Syntax { found, .. } => found,
            CompileError::UndeclaredIdentifier { name, .. } => name,
            CompileError::UnsupportedConstruct { keyword, .. } => keyword,
            CompileError::DuplicateDeclaration { name, .. } => name,
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("No Jack files found in {}", .0.display())]
    NoSources(PathBuf),
}
