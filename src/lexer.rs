use std::fmt;

use crate::common::{CompileError, CompileResult, Position};

const SYMBOLS: &[u8] = b"{}()[].,;+-*/&|<>=~";
const MAX_INTEGER: u32 = 32767;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub tok_type: TokenType,
    pub source: String,
    pub position: Position,
}

impl Token {
    fn new(tok_type: TokenType, source: &str, position: Position) -> Self {
        Self {
            tok_type,
            source: source.to_string(),
            position,
        }
    }

    pub fn is_symbol(&self, symbol: char) -> bool {
        self.tok_type == TokenType::Symbol(symbol)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.tok_type == TokenType::Keyword(keyword)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Keyword(Keyword),
    Symbol(char),
    IntegerConstant(u16),
    StringConstant,
    Identifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Class, Constructor, Function, Method,
    Field, Static, Var,
    Int, Char, Boolean, Void,
    True, False, Null, This,
    Let, Do, If, Else, While, Return,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Self> {
        let keyword = match word {
            "class" => Keyword::Class,
            "constructor" => Keyword::Constructor,
            "function" => Keyword::Function,
            "method" => Keyword::Method,
            "field" => Keyword::Field,
            "static" => Keyword::Static,
            "var" => Keyword::Var,
            "int" => Keyword::Int,
            "char" => Keyword::Char,
            "boolean" => Keyword::Boolean,
            "void" => Keyword::Void,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "null" => Keyword::Null,
            "this" => Keyword::This,
            "let" => Keyword::Let,
            "do" => Keyword::Do,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "return" => Keyword::Return,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Class => "class",
            Keyword::Constructor => "constructor",
            Keyword::Function => "function",
            Keyword::Method => "method",
            Keyword::Field => "field",
            Keyword::Static => "static",
            Keyword::Var => "var",
            Keyword::Int => "int",
            Keyword::Char => "char",
            Keyword::Boolean => "boolean",
            Keyword::Void => "void",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::This => "this",
            Keyword::Let => "let",
            Keyword::Do => "do",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Return => "return",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    start: usize,
    current: usize,
    line: u32,
    line_start: usize,
}

/// Splits one source unit into tokens.
pub fn tokenize(source: &str) -> CompileResult<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next()? {
        tokens.push(token);
    }
    Ok(tokens)
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            start: 0,
            current: 0,
            line: 1,
            line_start: 0,
        }
    }

    pub fn next(&mut self) -> CompileResult<Option<Token>> {
        self.skip_whitespace()?;
        self.start = self.current;
        if self.is_at_end() {
            return Ok(None);
        }

        let c = self.advance();
        let token = if SYMBOLS.contains(&c) {
            self.make_token(TokenType::Symbol(char::from(c)))
        } else if c == b'"' {
            self.string()?
        } else if c.is_ascii_digit() {
            self.integer()?
        } else if c.is_ascii_alphabetic() || c == b'_' {
            self.identifier()
        } else {
            // widen to the whole character so the report shows what was written
            while !self.is_at_end() && !self.source.is_char_boundary(self.current) {
                self.current += 1;
            }
            return Err(self.error("unexpected character"));
        };
        Ok(Some(token))
    }

    fn skip_whitespace(&mut self) -> CompileResult<()> {
        loop {
            match self.peek() {
                b' ' | b'\r' | b'\t' => self.current += 1,
                b'\n' => self.newline(),
                b'/' if self.peek_2() == b'/' => {
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.current += 1;
                    }
                }
                b'/' if self.peek_2() == b'*' => self.block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn block_comment(&mut self) -> CompileResult<()> {
        self.start = self.current;
        let position = self.position();
        self.current += 2;
        while !self.is_at_end() {
            if self.peek() == b'*' && self.peek_2() == b'/' {
                self.current += 2;
                return Ok(());
            }
            if self.peek() == b'\n' {
                self.newline();
            } else {
                self.current += 1;
            }
        }
        Err(CompileError::Lexical {
            position,
            text: "/*".to_string(),
            message: "unterminated block comment",
        })
    }

    fn newline(&mut self) {
        self.current += 1;
        self.line += 1;
        self.line_start = self.current;
    }

    fn peek(&self) -> u8 {
        self.bytes.get(self.current).copied().unwrap_or(b'\0')
    }

    fn peek_2(&self) -> u8 {
        self.bytes.get(self.current + 1).copied().unwrap_or(b'\0')
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.bytes.len()
    }

    fn advance(&mut self) -> u8 {
        self.current += 1;
        self.bytes[self.current - 1]
    }

    fn position(&self) -> Position {
        Position::new(self.line, (self.start - self.line_start) as u32 + 1)
    }

    fn lexeme(&self) -> &'a str {
        &self.source[self.start..self.current]
    }

    fn make_token(&self, tok_type: TokenType) -> Token {
        Token::new(tok_type, self.lexeme(), self.position())
    }

    fn error(&self, message: &'static str) -> CompileError {
        CompileError::Lexical {
            position: self.position(),
            text: self.lexeme().to_string(),
            message,
        }
    }

    fn string(&mut self) -> CompileResult<Token> {
        while self.peek() != b'"' {
            if self.is_at_end() || self.peek() == b'\n' || self.peek() == b'\r' {
                return Err(self.error("unterminated string constant"));
            }
            if !self.peek().is_ascii() {
                return Err(self.error("non-ASCII character in string constant"));
            }
            self.current += 1;
        }
        self.current += 1; // closing quote

        let content = &self.source[self.start + 1..self.current - 1];
        Ok(Token::new(TokenType::StringConstant, content, self.position()))
    }

    fn integer(&mut self) -> CompileResult<Token> {
        while self.peek().is_ascii_digit() {
            self.current += 1;
        }

        match self.lexeme().parse::<u32>() {
            Ok(value) if value <= MAX_INTEGER => {
                Ok(self.make_token(TokenType::IntegerConstant(value as u16)))
            }
            _ => Err(self.error("integer constant out of range")),
        }
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.current += 1;
        }
        match Keyword::from_word(self.lexeme()) {
            Some(keyword) => self.make_token(TokenType::Keyword(keyword)),
            None => self.make_token(TokenType::Identifier),
        }
    }
}

/// Renders tokens as the `<tokens>` XML listing.
pub fn tokens_to_xml(tokens: &[Token]) -> String {
    let mut xml = String::from("<tokens>\n");
    for token in tokens {
        let tag = match token.tok_type {
            TokenType::Keyword(_) => "keyword",
            TokenType::Symbol(_) => "symbol",
            TokenType::IntegerConstant(_) => "integerConstant",
            TokenType::StringConstant => "stringConstant",
            TokenType::Identifier => "identifier",
        };
        xml.push_str(&format!("<{}> {} </{}>\n", tag, escape_xml(&token.source), tag));
    }
    xml.push_str("</tokens>\n");
    xml
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;

    fn types(source: &str) -> Vec<TokenType> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.tok_type)
            .collect()
    }

    #[test]
    fn classifies_every_token_kind() {
        let tokens = tokenize("let x = 42 + \"hi there\";").unwrap();
        let got: Vec<_> = tokens
            .iter()
            .map(|t| (t.tok_type, t.source.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                (TokenType::Keyword(Keyword::Let), "let"),
                (TokenType::Identifier, "x"),
                (TokenType::Symbol('='), "="),
                (TokenType::IntegerConstant(42), "42"),
                (TokenType::Symbol('+'), "+"),
                (TokenType::StringConstant, "hi there"),
                (TokenType::Symbol(';'), ";"),
            ]
        );
    }

    #[test]
    fn keywords_must_match_exactly() {
        assert_eq!(
            types("classy class _do do2"),
            vec![
                TokenType::Identifier,
                TokenType::Keyword(Keyword::Class),
                TokenType::Identifier,
                TokenType::Identifier,
            ]
        );
    }

    #[test]
    fn symbols_split_adjacent_words() {
        assert_eq!(
            types("a.b(c[1])"),
            vec![
                TokenType::Identifier,
                TokenType::Symbol('.'),
                TokenType::Identifier,
                TokenType::Symbol('('),
                TokenType::Identifier,
                TokenType::Symbol('['),
                TokenType::IntegerConstant(1),
                TokenType::Symbol(']'),
                TokenType::Symbol(')'),
            ]
        );
    }

    #[test]
    fn skips_line_and_block_comments() {
        let source = "// heading\nclass /* inline */ Main\n/**\n * docs\n * more\n */\n{ }";
        let tokens = tokenize(source).unwrap();
        let words: Vec<_> = tokens.iter().map(|t| t.source.as_str()).collect();
        assert_eq!(words, vec!["class", "Main", "{", "}"]);
        assert_eq!(tokens[3].position, Position::new(7, 3));
    }

    #[test]
    fn comment_markers_inside_strings_are_text() {
        let tokens = tokenize("\"a // b /* c\"").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].source, "a // b /* c");
    }

    #[test]
    fn division_is_not_a_comment() {
        assert_eq!(
            types("a / b"),
            vec![
                TokenType::Identifier,
                TokenType::Symbol('/'),
                TokenType::Identifier,
            ]
        );
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = tokenize("class\n  Main {").unwrap();
        assert_eq!(tokens[0].position, Position::new(1, 1));
        assert_eq!(tokens[1].position, Position::new(2, 3));
        assert_eq!(tokens[2].position, Position::new(2, 8));
    }

    #[test]
    fn unterminated_string_is_lexical_error() {
        let err = tokenize("let s = \"abc;\nlet").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lexical);
        assert_eq!(err.position(), Position::new(1, 9));
        assert_eq!(err.token(), "\"abc;");
    }

    #[test]
    fn unterminated_block_comment_is_lexical_error() {
        let err = tokenize("class /* never\nclosed").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lexical);
        assert_eq!(err.position(), Position::new(1, 7));
    }

    #[test]
    fn rejects_unknown_characters() {
        let err = tokenize("let x = y ! z;").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lexical);
        assert_eq!(err.token(), "!");
        assert_eq!(err.position(), Position::new(1, 11));
    }

    #[test]
    fn integer_constants_are_bounded() {
        assert_eq!(types("32767"), vec![TokenType::IntegerConstant(32767)]);
        let err = tokenize("32768").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lexical);
    }

    #[test]
    fn renders_xml_listing_with_escapes() {
        let tokens = tokenize("if (a < b) { let s = \"x&y\"; }").unwrap();
        let xml = tokens_to_xml(&tokens);
        assert!(xml.starts_with("<tokens>\n<keyword> if </keyword>\n<symbol> ( </symbol>\n"));
        assert!(xml.contains("<symbol> &lt; </symbol>\n"));
        assert!(xml.contains("<stringConstant> x&amp;y </stringConstant>\n"));
        assert!(xml.ends_with("<symbol> } </symbol>\n</tokens>\n"));
    }
}
