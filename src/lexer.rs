use crate::error::{BisayaError, Span};
use crate::value::{Value, FALSE_TEXT, TRUE_TEXT};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Colon,
    Minus,
    Plus,
    Slash,
    Star,
    Percent,
    Ampersand,
    Dollar,

    // One or two character tokens
    Equal,
    EqualEqual,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    PlusPlus,
    MinusMinus,

    // Literals
    Identifier,
    String,
    Char,
    Integer,
    Double,
    True,
    False,

    // Keywords
    Start,
    End,
    Declare,
    IntType,
    FloatType,
    CharType,
    BoolType,
    TextType,
    Print,
    Input,
    If,
    ElseIf,
    Else,
    For,
    While,
    Block,
    And,
    Or,
    Not,

    // Special
    Eof,
}

/// A classified lexeme. `lexeme` is always the exact source text under `span`.
#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub literal: Option<Value>,
    pub span: Span,
    pub line: usize,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        lexeme: String,
        literal: Option<Value>,
        span: Span,
        line: usize,
    ) -> Self {
        Self {
            token_type,
            lexeme,
            literal,
            span,
            line,
        }
    }
}

pub struct Lexer {
    source: String,
    tokens: Vec<Token>,
    errors: Vec<BisayaError>,
    start: usize,
    current: usize,
    line: usize,
    keywords: HashMap<&'static str, TokenType>,
}

impl Lexer {
    pub fn new(source: String) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("SUGOD", TokenType::Start);
        keywords.insert("KATAPUSAN", TokenType::End);
        keywords.insert("MUGNA", TokenType::Declare);
        keywords.insert("NUMERO", TokenType::IntType);
        keywords.insert("TIPIK", TokenType::FloatType);
        keywords.insert("LETRA", TokenType::CharType);
        keywords.insert("TINUOD", TokenType::BoolType);
        keywords.insert("PULONG", TokenType::TextType);
        keywords.insert("IPAKITA", TokenType::Print);
        keywords.insert("DAWAT", TokenType::Input);
        keywords.insert("KUNG", TokenType::If);
        keywords.insert("KUNG WALA", TokenType::ElseIf);
        keywords.insert("KUNG DILI", TokenType::Else);
        keywords.insert("ALANG SA", TokenType::For);
        keywords.insert("SAMTANG", TokenType::While);
        keywords.insert("PUNDOK", TokenType::Block);
        keywords.insert("UG", TokenType::And);
        keywords.insert("O", TokenType::Or);
        keywords.insert("BALI", TokenType::Not);
        keywords.insert(TRUE_TEXT, TokenType::True);
        keywords.insert(FALSE_TEXT, TokenType::False);

        Self {
            source,
            tokens: Vec::new(),
            errors: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            keywords,
        }
    }

    /// Scans the whole source. Errors do not stop the scan; the token list
    /// always ends with an `Eof` token so the parser gets well-formed input.
    pub fn scan_tokens(mut self) -> (Vec<Token>, Vec<BisayaError>) {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            None,
            Span::new(self.current, self.current),
            self.line,
        ));

        debug!(
            tokens = self.tokens.len(),
            errors = self.errors.len(),
            "scanned source"
        );

        (self.tokens, self.errors)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            ':' => self.add_token(TokenType::Colon),
            '*' => self.add_token(TokenType::Star),
            '/' => self.add_token(TokenType::Slash),
            '%' => self.add_token(TokenType::Percent),
            '&' => self.add_token(TokenType::Ampersand),
            '$' => self.add_token(TokenType::Dollar),
            '+' => {
                let token_type = if self.match_char('+') {
                    TokenType::PlusPlus
                } else {
                    TokenType::Plus
                };
                self.add_token(token_type);
            }
            '-' => {
                if self.peek() == '-' {
                    if self.follows_operand() {
                        self.advance();
                        self.add_token(TokenType::MinusMinus);
                    } else {
                        // Comment goes until end of line
                        while self.peek() != '\n' && !self.is_at_end() {
                            self.advance();
                        }
                    }
                } else {
                    self.add_token(TokenType::Minus);
                }
            }
            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                self.add_token(token_type);
            }
            '<' => {
                let token_type = if self.match_char('=') {
                    TokenType::LessEqual
                } else if self.match_char('>') {
                    TokenType::NotEqual
                } else {
                    TokenType::Less
                };
                self.add_token(token_type);
            }
            '>' => {
                let token_type = if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(token_type);
            }
            '[' => self.escape(),
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '\'' => self.character(),
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => self.identifier(),
            _ => self.error(format!("Unexpected character: '{}'", c)),
        }
    }

    fn advance(&mut self) -> char {
        match self.source[self.current..].chars().next() {
            Some(c) => {
                self.current += c.len_utf8();
                c
            }
            None => '\0',
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn peek(&self) -> char {
        self.source[self.current..].chars().next().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.source[self.current..].chars().nth(1).unwrap_or('\0')
    }

    /// `--` directly after an identifier or `)` is a decrement, not a comment.
    fn follows_operand(&self) -> bool {
        match self.tokens.last() {
            Some(token) => {
                token.span.end == self.start
                    && matches!(
                        token.token_type,
                        TokenType::Identifier | TokenType::RightParen
                    )
            }
            None => false,
        }
    }

    fn character(&mut self) {
        if self.peek() != '\'' && self.peek() != '\n' && !self.is_at_end() && self.peek_next() == '\''
        {
            let value = self.advance();
            self.advance();
            self.add_token_with_literal(TokenType::Char, Some(Value::Char(value)));
            return;
        }

        // Skip the malformed literal up to its closing quote on this line.
        while self.peek() != '\'' && self.peek() != '\n' && !self.is_at_end() {
            self.advance();
        }

        if self.match_char('\'') {
            self.error("Character literal must contain exactly one character".to_string());
        } else {
            self.error("Unterminated character literal".to_string());
        }
    }

    fn string(&mut self) {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.error("Unterminated string".to_string());
            return;
        }

        // Consume the closing "
        self.advance();

        let content = &self.source[self.start + 1..self.current - 1];

        // Boolean literals are spelled as quoted text
        let (token_type, literal) = match content {
            TRUE_TEXT => (TokenType::True, Value::Bool(true)),
            FALSE_TEXT => (TokenType::False, Value::Bool(false)),
            _ => (TokenType::String, Value::String(content.to_string())),
        };

        self.add_token_with_literal(token_type, Some(literal));
    }

    /// `[c]` escapes a single character, including `[` and `]` themselves.
    fn escape(&mut self) {
        if !self.is_at_end() && self.peek() != '\n' && self.peek_next() == ']' {
            let value = self.advance();
            self.advance();
            self.add_token_with_literal(TokenType::String, Some(Value::String(value.to_string())));
        } else {
            self.error("Escape code must be a single character enclosed in '[' and ']'".to_string());
        }
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let mut is_double = false;

        // Look for fractional part
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_double = true;
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let number_slice = self.source[self.start..self.current].to_string();

        if is_double {
            match number_slice.parse::<f64>() {
                Ok(n) => self.add_token_with_literal(TokenType::Double, Some(Value::Double(n))),
                Err(_) => self.error(format!("Invalid floating literal: {}", number_slice)),
            }
        } else {
            match number_slice.parse::<i64>() {
                Ok(n) => self.add_token_with_literal(TokenType::Integer, Some(Value::Int(n))),
                Err(_) => self.error(format!("Integer literal out of range: {}", number_slice)),
            }
        }
    }

    fn identifier(&mut self) {
        self.consume_word();
        let word_end = self.current;
        let text = &self.source[self.start..word_end];

        if self.starts_compound(text) {
            if let Some(token_type) = self.try_compound(word_end) {
                self.add_token(token_type);
                return;
            }
            self.current = word_end;
        }

        let text = &self.source[self.start..self.current];
        let token_type = self
            .keywords
            .get(text)
            .copied()
            .unwrap_or(TokenType::Identifier);

        let literal = match token_type {
            TokenType::True => Some(Value::Bool(true)),
            TokenType::False => Some(Value::Bool(false)),
            _ => None,
        };
        self.add_token_with_literal(token_type, literal);
    }

    fn consume_word(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }
    }

    fn starts_compound(&self, word: &str) -> bool {
        self.keywords.keys().any(|keyword| {
            keyword
                .split_once(' ')
                .map_or(false, |(first, _)| first == word)
        })
    }

    /// Extends the current word by one space-separated word and looks the
    /// phrase up. Leaves `current` past the second word on success.
    fn try_compound(&mut self, word_end: usize) -> Option<TokenType> {
        while self.peek() == ' ' || self.peek() == '\t' {
            self.advance();
        }

        if !(self.peek().is_alphabetic() || self.peek() == '_') {
            return None;
        }

        let second_start = self.current;
        self.consume_word();

        let phrase = format!(
            "{} {}",
            &self.source[self.start..word_end],
            &self.source[second_start..self.current]
        );
        self.keywords.get(phrase.as_str()).copied()
    }

    fn error(&mut self, message: String) {
        self.errors.push(BisayaError::lex_error(
            Span::new(self.start, self.current),
            self.line,
            message,
        ));
    }

    fn add_token(&mut self, token_type: TokenType) {
        self.add_token_with_literal(token_type, None);
    }

    fn add_token_with_literal(&mut self, token_type: TokenType, literal: Option<Value>) {
        let text = &self.source[self.start..self.current];
        self.tokens.push(Token::new(
            token_type,
            text.to_string(),
            literal,
            Span::new(self.start, self.current),
            self.line,
        ));
    }
}
