use tracing::trace;

use crate::chunk::{Chunk, Instruction, Segment};
use crate::code_gen::Generator;
use crate::common::{CompileError, CompileResult};
use crate::context::{Context, SubroutineKind};
use crate::cursor::TokenCursor;
use crate::label::LabelAllocator;
use crate::lexer::{Keyword, Token, TokenType};
use crate::symbol_table::{Kind, Symbol};

/// Recursive-descent parser that emits VM code as it recognizes each
/// construct. Expressions are evaluated strictly left to right; there is
/// no operator precedence.
pub struct Parser<'t, 'l> {
    tokens: TokenCursor<'t>,
    context: Context<'l>,
    generator: Generator,
}

impl<'t, 'l> Parser<'t, 'l> {
    pub fn new(tokens: &'t [Token], labels: &'l mut LabelAllocator) -> Self {
        Self {
            tokens: TokenCursor::new(tokens),
            context: Context::new(labels),
            generator: Generator::new(),
        }
    }

    pub fn end(self) -> Chunk {
        self.generator.end()
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.peek()
    }

    fn note(&mut self, token: &Token) {
        trace!(
            line = token.position.line,
            column = token.position.column,
            "{:?} '{}'",
            token.tok_type,
            token.source
        );
        self.generator.set_line(token.position.line);
    }

    fn advance(&mut self) -> CompileResult<&'t Token> {
        match self.tokens.advance() {
            Some(token) => {
                self.note(token);
                Ok(token)
            }
            None => Err(self.syntax_error("more input")),
        }
    }

    fn check_symbol(&self, symbol: char) -> bool {
        self.peek().map_or(false, |t| t.is_symbol(symbol))
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek().map_or(false, |t| t.is_keyword(keyword))
    }

    fn match_symbol(&mut self, symbol: char) -> bool {
        match self.tokens.next_if(|t| t.is_symbol(symbol)) {
            Some(token) => {
                self.note(token);
                true
            }
            None => false,
        }
    }

    fn consume_symbol(&mut self, symbol: char) -> CompileResult<()> {
        if self.match_symbol(symbol) {
            Ok(())
        } else {
            Err(self.syntax_error(&format!("'{}'", symbol)))
        }
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> CompileResult<()> {
        if self.check_keyword(keyword) {
            self.advance()?;
            Ok(())
        } else {
            Err(self.syntax_error(&format!("'{}'", keyword)))
        }
    }

    fn consume_identifier(&mut self, what: &str) -> CompileResult<&'t Token> {
        match self.peek() {
            Some(token) if token.tok_type == TokenType::Identifier => self.advance(),
            _ => Err(self.syntax_error(what)),
        }
    }

    fn syntax_error(&self, expected: &str) -> CompileError {
        CompileError::Syntax {
            position: self.tokens.position(),
            found: self
                .peek()
                .map_or_else(|| "end of input".to_string(), |t| t.source.clone()),
            expected: expected.to_string(),
        }
    }

    fn unsupported(&self, expected: &'static str) -> CompileError {
        CompileError::UnsupportedConstruct {
            position: self.tokens.position(),
            keyword: self.peek().map(|t| t.source.clone()).unwrap_or_default(),
            expected,
        }
    }

    fn lookup(&self, name: &Token) -> CompileResult<Symbol> {
        self.context
            .resolve(&name.source)
            .cloned()
            .ok_or_else(|| CompileError::UndeclaredIdentifier {
                position: name.position,
                name: name.source.clone(),
            })
    }

    fn push_variable(&mut self, symbol: &Symbol) {
        self.generator
            .emit_push(symbol.kind.segment(), symbol.index)
    }

    pub fn class(&mut self) -> CompileResult<()> {
        self.consume_keyword(Keyword::Class)?;
        let name = self.consume_identifier("class name")?;
        self.context.begin_class(&name.source);
        self.consume_symbol('{')?;

        while self.check_keyword(Keyword::Static) || self.check_keyword(Keyword::Field) {
            self.class_var_dec()?;
        }

        loop {
            match self.peek() {
                Some(token) if token.is_symbol('}') => break,
                Some(Token {
                    tok_type: TokenType::Keyword(keyword),
                    ..
                }) => match keyword {
                    Keyword::Constructor | Keyword::Function | Keyword::Method => {
                        self.subroutine_dec()?
                    }
                    Keyword::Static | Keyword::Field => {
                        return Err(self.syntax_error("subroutine declaration or '}'"))
                    }
                    _ => return Err(self.unsupported("class member declaration")),
                },
                _ => return Err(self.syntax_error("subroutine declaration or '}'")),
            }
        }
        self.consume_symbol('}')?;

        if self.tokens.is_at_end() {
            Ok(())
        } else {
            Err(self.syntax_error("end of input"))
        }
    }

    fn class_var_dec(&mut self) -> CompileResult<()> {
        let kind = if self.advance()?.is_keyword(Keyword::Static) {
            Kind::Static
        } else {
            Kind::Field
        };
        let ty = self.type_name(false)?;
        self.declare_variables(&ty, kind)?;
        self.consume_symbol(';')
    }

    fn var_dec(&mut self) -> CompileResult<()> {
        self.consume_keyword(Keyword::Var)?;
        let ty = self.type_name(false)?;
        self.declare_variables(&ty, Kind::Local)?;
        self.consume_symbol(';')
    }

    fn declare_variables(&mut self, ty: &str, kind: Kind) -> CompileResult<()> {
        loop {
            self.declare_variable(ty, kind)?;
            if !self.match_symbol(',') {
                return Ok(());
            }
        }
    }

    fn declare_variable(&mut self, ty: &str, kind: Kind) -> CompileResult<()> {
        let name = self.consume_identifier("variable name")?;
        match self.context.declare(&name.source, ty, kind) {
            Some(_) => Ok(()),
            None => Err(CompileError::DuplicateDeclaration {
                position: name.position,
                name: name.source.clone(),
            }),
        }
    }

    fn type_name(&mut self, allow_void: bool) -> CompileResult<String> {
        let is_type = match self.peek().map(|t| t.tok_type) {
            Some(TokenType::Keyword(Keyword::Int))
            | Some(TokenType::Keyword(Keyword::Char))
            | Some(TokenType::Keyword(Keyword::Boolean))
            | Some(TokenType::Identifier) => true,
            Some(TokenType::Keyword(Keyword::Void)) => allow_void,
            _ => false,
        };
        if is_type {
            Ok(self.advance()?.source.clone())
        } else if allow_void {
            Err(self.syntax_error("return type"))
        } else {
            Err(self.syntax_error("type"))
        }
    }

    fn subroutine_dec(&mut self) -> CompileResult<()> {
        let kind = match self.advance()?.tok_type {
            TokenType::Keyword(Keyword::Constructor) => SubroutineKind::Constructor,
            TokenType::Keyword(Keyword::Method) => SubroutineKind::Method,
            _ => SubroutineKind::Function,
        };
        self.type_name(true)?;
        let name = self.consume_identifier("subroutine name")?;

        self.context.begin_subroutine(kind);
        self.consume_symbol('(')?;
        self.parameter_list()?;
        self.consume_symbol(')')?;
        self.subroutine_body(&name.source, kind)
    }

    fn parameter_list(&mut self) -> CompileResult<()> {
        if self.check_symbol(')') {
            return Ok(());
        }
        loop {
            let ty = self.type_name(false)?;
            self.declare_variable(&ty, Kind::Argument)?;
            if !self.match_symbol(',') {
                return Ok(());
            }
        }
    }

    fn subroutine_body(&mut self, name: &str, kind: SubroutineKind) -> CompileResult<()> {
        self.consume_symbol('{')?;
        // the header carries the local count, so every var comes first
        while self.check_keyword(Keyword::Var) {
            self.var_dec()?;
        }

        let function = format!("{}.{}", self.context.class_name, name);
        self.generator
            .emit_function(function, self.context.count(Kind::Local));
        match kind {
            SubroutineKind::Constructor => {
                self.generator.emit_constant(self.context.count(Kind::Field));
                self.generator.emit_call("Memory.alloc".to_string(), 1);
                self.generator.emit_pop(Segment::Pointer, 0);
            }
            SubroutineKind::Method => {
                self.generator.emit_push(Segment::Argument, 0);
                self.generator.emit_pop(Segment::Pointer, 0);
            }
            SubroutineKind::Function => (),
        }

        self.statements()?;
        self.consume_symbol('}')
    }

    fn statements(&mut self) -> CompileResult<()> {
        loop {
            let keyword = match self.peek() {
                Some(token) if token.is_symbol('}') => return Ok(()),
                Some(Token {
                    tok_type: TokenType::Keyword(keyword),
                    ..
                }) => *keyword,
                _ => return Err(self.syntax_error("statement or '}'")),
            };
            match keyword {
                Keyword::Let => self.let_statement()?,
                Keyword::If => self.if_statement()?,
                Keyword::While => self.while_statement()?,
                Keyword::Do => self.do_statement()?,
                Keyword::Return => self.return_statement()?,
                _ => return Err(self.unsupported("statement")),
            }
        }
    }

    fn block(&mut self) -> CompileResult<()> {
        self.consume_symbol('{')?;
        self.statements()?;
        self.consume_symbol('}')
    }

    fn let_statement(&mut self) -> CompileResult<()> {
        self.consume_keyword(Keyword::Let)?;
        let name = self.consume_identifier("variable name")?;
        let target = self.lookup(name)?;

        if self.match_symbol('[') {
            self.push_variable(&target);
            self.expression()?;
            self.consume_symbol(']')?;
            self.generator.emit(Instruction::Add);

            self.consume_symbol('=')?;
            self.expression()?;
            self.consume_symbol(';')?;

            // the value may have moved `that`, so park it before rebasing
            self.generator.emit_pop(Segment::Temp, 0);
            self.generator.emit_pop(Segment::Pointer, 1);
            self.generator.emit_push(Segment::Temp, 0);
            self.generator.emit_pop(Segment::That, 0);
        } else {
            self.consume_symbol('=')?;
            self.expression()?;
            self.consume_symbol(';')?;
            self.generator
                .emit_pop(target.kind.segment(), target.index);
        }
        Ok(())
    }

    fn if_statement(&mut self) -> CompileResult<()> {
        self.consume_keyword(Keyword::If)?;
        let else_label = self.context.next_label();
        let end_label = self.context.next_label();

        self.consume_symbol('(')?;
        self.expression()?;
        self.consume_symbol(')')?;
        self.generator.emit(Instruction::Not);
        self.generator.emit_if_goto(&else_label);

        self.block()?;
        self.generator.emit_goto(&end_label);
        self.generator.emit_label(&else_label);

        if self.check_keyword(Keyword::Else) {
            self.advance()?;
            self.block()?;
        }
        self.generator.emit_label(&end_label);
        Ok(())
    }

    fn while_statement(&mut self) -> CompileResult<()> {
        self.consume_keyword(Keyword::While)?;
        let loop_label = self.context.next_label();
        let exit_label = self.context.next_label();

        self.generator.emit_label(&loop_label);
        self.consume_symbol('(')?;
        self.expression()?;
        self.consume_symbol(')')?;
        self.generator.emit(Instruction::Not);
        self.generator.emit_if_goto(&exit_label);

        self.block()?;
        self.generator.emit_goto(&loop_label);
        self.generator.emit_label(&exit_label);
        Ok(())
    }

    fn do_statement(&mut self) -> CompileResult<()> {
        self.consume_keyword(Keyword::Do)?;
        self.subroutine_call()?;
        self.consume_symbol(';')?;
        self.generator.emit_pop(Segment::Temp, 0);
        Ok(())
    }

    fn return_statement(&mut self) -> CompileResult<()> {
        self.consume_keyword(Keyword::Return)?;
        if self.check_symbol(';') {
            self.generator.emit_constant(0);
        } else {
            self.expression()?;
        }
        self.consume_symbol(';')?;
        self.generator.emit(Instruction::Return);
        Ok(())
    }

    fn expression(&mut self) -> CompileResult<()> {
        self.term()?;
        while let Some(operator) = self.peek().and_then(binary_operator) {
            self.advance()?;
            self.term()?;
            self.generator.emit(operator);
        }
        Ok(())
    }

    fn term(&mut self) -> CompileResult<()> {
        let token = match self.peek() {
            Some(token) => token,
            None => return Err(self.syntax_error("term")),
        };
        match token.tok_type {
            TokenType::IntegerConstant(value) => {
                self.advance()?;
                self.generator.emit_constant(value as usize);
            }
            TokenType::StringConstant => {
                self.advance()?;
                self.generator.emit_string(&token.source);
            }
            TokenType::Keyword(Keyword::True) => {
                self.advance()?;
                self.generator.emit_constant(1);
                self.generator.emit(Instruction::Neg);
            }
            TokenType::Keyword(Keyword::False) | TokenType::Keyword(Keyword::Null) => {
                self.advance()?;
                self.generator.emit_constant(0);
            }
            TokenType::Keyword(Keyword::This) => {
                self.advance()?;
                self.generator.emit_push(Segment::Pointer, 0);
            }
            TokenType::Symbol('(') => {
                self.advance()?;
                self.expression()?;
                self.consume_symbol(')')?;
            }
            TokenType::Symbol('-') => {
                self.advance()?;
                self.term()?;
                self.generator.emit(Instruction::Neg);
            }
            TokenType::Symbol('~') => {
                self.advance()?;
                self.term()?;
                self.generator.emit(Instruction::Not);
            }
            TokenType::Identifier => self.identifier_term()?,
            _ => return Err(self.syntax_error("term")),
        }
        Ok(())
    }

    fn identifier_term(&mut self) -> CompileResult<()> {
        let mark = self.tokens.mark();
        let name = self.advance()?;

        if self.check_symbol('(') || self.check_symbol('.') {
            self.tokens.reset(mark);
            self.subroutine_call()
        } else if self.check_symbol('[') {
            let array = self.lookup(name)?;
            self.advance()?;
            self.push_variable(&array);
            self.expression()?;
            self.consume_symbol(']')?;
            self.generator.emit_rebase_that();
            self.generator.emit_push(Segment::That, 0);
            Ok(())
        } else {
            let variable = self.lookup(name)?;
            self.push_variable(&variable);
            Ok(())
        }
    }

    fn subroutine_call(&mut self) -> CompileResult<()> {
        let first = self.consume_identifier("subroutine name")?;

        let (target, receivers) = if self.match_symbol('.') {
            let name = self.consume_identifier("subroutine name")?;
            match self.context.resolve(&first.source).cloned() {
                Some(object) => {
                    self.push_variable(&object);
                    (format!("{}.{}", object.ty, name.source), 1)
                }
                None => (format!("{}.{}", first.source, name.source), 0),
            }
        } else {
            let receivers = if self.context.subroutine_kind() == Some(SubroutineKind::Method) {
                self.generator.emit_push(Segment::Pointer, 0);
                1
            } else {
                0
            };
            (format!("{}.{}", self.context.class_name, first.source), receivers)
        };

        self.consume_symbol('(')?;
        let args = self.expression_list()?;
        self.consume_symbol(')')?;
        self.generator.emit_call(target, args + receivers);
        Ok(())
    }

    fn expression_list(&mut self) -> CompileResult<usize> {
        if self.check_symbol(')') {
            return Ok(0);
        }
        let mut count = 0;
        loop {
            self.expression()?;
            count += 1;
            if !self.match_symbol(',') {
                return Ok(count);
            }
        }
    }
}

fn binary_operator(token: &Token) -> Option<Instruction> {
    let operator = match token.tok_type {
        TokenType::Symbol('+') => Instruction::Add,
        TokenType::Symbol('-') => Instruction::Sub,
        TokenType::Symbol('*') => Instruction::Call("Math.multiply".to_string(), 2),
        TokenType::Symbol('/') => Instruction::Call("Math.divide".to_string(), 2),
        TokenType::Symbol('&') => Instruction::And,
        TokenType::Symbol('|') => Instruction::Or,
        TokenType::Symbol('<') => Instruction::Lt,
        TokenType::Symbol('>') => Instruction::Gt,
        TokenType::Symbol('=') => Instruction::Eq,
        _ => return None,
    };
    Some(operator)
}
