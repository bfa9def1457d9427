use std::fmt;

use tracing::debug;

use crate::error::{LexError, SourceLocation};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // type keywords
    Int,
    Float,
    String,
    Bool,
    If,
    Elif,
    Else,
    While,
    Do,
    For,
    Function,
    Struct,
    Array,
    Print,
    Read,
    Return,
    And,
    Or,
    True,
    False,
    Identifier(String),
    Integer(i64),
    Real(f64),
    Text(String),
    Equal,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Eof,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            TokenType::Int => "int",
            TokenType::Float => "float",
            TokenType::String => "string",
            TokenType::Bool => "bool",
            TokenType::If => "if",
            TokenType::Elif => "elif",
            TokenType::Else => "else",
            TokenType::While => "while",
            TokenType::Do => "do",
            TokenType::For => "for",
            TokenType::Function => "function",
            TokenType::Struct => "struct",
            TokenType::Array => "array",
            TokenType::Print => "print",
            TokenType::Read => "read",
            TokenType::Return => "return",
            TokenType::And => "and",
            TokenType::Or => "or",
            TokenType::True => "true",
            TokenType::False => "false",
            TokenType::Identifier(name) => return f.write_str(name),
            TokenType::Integer(v) => return write!(f, "{}", v),
            TokenType::Real(v) => return write!(f, "{:?}", v),
            TokenType::Text(v) => return write!(f, "\"{}\"", v),
            TokenType::Equal => "=",
            TokenType::EqualEqual => "==",
            TokenType::NotEqual => "!=",
            TokenType::Less => "<",
            TokenType::LessEqual => "<=",
            TokenType::Greater => ">",
            TokenType::GreaterEqual => ">=",
            TokenType::Plus => "+",
            TokenType::Minus => "-",
            TokenType::Star => "*",
            TokenType::Slash => "/",
            TokenType::Caret => "^",
            TokenType::LeftParen => "(",
            TokenType::RightParen => ")",
            TokenType::LeftBrace => "{",
            TokenType::RightBrace => "}",
            TokenType::LeftBracket => "[",
            TokenType::RightBracket => "]",
            TokenType::Comma => ",",
            TokenType::Semicolon => ";",
            TokenType::Eof => "end of input",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub column: usize,
}

/// Scanner that never stops on bad input: offending characters are skipped
/// and reported through [`Lexer::errors`].
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    errors: Vec<LexError>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            errors: Vec::new(),
        }
    }

    /// Lexical errors accumulated so far.
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            self.skip_trivia();
            if self.is_at_end() {
                break;
            }

            if let Some(token) = self.next_token() {
                tokens.push(token);
            }
        }

        tokens.push(Token {
            token_type: TokenType::Eof,
            line: self.line,
            column: self.column,
        });

        debug!(
            tokens = tokens.len(),
            errors = self.errors.len(),
            "tokenized source"
        );
        tokens
    }

    fn next_token(&mut self) -> Option<Token> {
        let line = self.line;
        let column = self.column;

        let ch = self.current_char();

        let token_type = match ch {
            '=' => self.one_or_two('=', TokenType::Equal, TokenType::EqualEqual),
            '<' => self.one_or_two('=', TokenType::Less, TokenType::LessEqual),
            '>' => self.one_or_two('=', TokenType::Greater, TokenType::GreaterEqual),
            '!' => {
                self.advance();
                if self.current_char() == '=' {
                    self.advance();
                    TokenType::NotEqual
                } else {
                    return self.unexpected('!', line, column);
                }
            }
            '&' | '|' => {
                self.advance();
                if self.current_char() == ch {
                    self.advance();
                    if ch == '&' {
                        TokenType::And
                    } else {
                        TokenType::Or
                    }
                } else {
                    return self.unexpected(ch, line, column);
                }
            }
            '+' => self.single(TokenType::Plus),
            '-' => self.single(TokenType::Minus),
            '*' => self.single(TokenType::Star),
            '/' => self.single(TokenType::Slash),
            '^' => self.single(TokenType::Caret),
            '(' => self.single(TokenType::LeftParen),
            ')' => self.single(TokenType::RightParen),
            '{' => self.single(TokenType::LeftBrace),
            '}' => self.single(TokenType::RightBrace),
            '[' => self.single(TokenType::LeftBracket),
            ']' => self.single(TokenType::RightBracket),
            ',' => self.single(TokenType::Comma),
            ';' => self.single(TokenType::Semicolon),
            '"' => self.read_string(line, column)?,
            _ if ch.is_alphabetic() || ch == '_' => self.read_identifier(),
            _ if ch.is_ascii_digit() => self.read_number(line, column)?,
            _ => {
                self.advance();
                return self.unexpected(ch, line, column);
            }
        };

        Some(Token {
            token_type,
            line,
            column,
        })
    }

    fn single(&mut self, token_type: TokenType) -> TokenType {
        self.advance();
        token_type
    }

    fn one_or_two(&mut self, second: char, one: TokenType, two: TokenType) -> TokenType {
        self.advance();
        if self.current_char() == second {
            self.advance();
            two
        } else {
            one
        }
    }

    fn unexpected(&mut self, character: char, line: usize, column: usize) -> Option<Token> {
        self.errors.push(LexError::UnexpectedCharacter {
            character,
            location: SourceLocation { line, column },
        });
        None
    }

    fn read_string(&mut self, line: usize, column: usize) -> Option<TokenType> {
        self.advance(); // Skip opening quote
        let mut value = String::new();

        while !self.is_at_end() && self.current_char() != '"' {
            if self.current_char() == '\n' {
                break;
            }
            if self.current_char() == '\\' {
                self.advance();
                if !self.is_at_end() {
                    match self.current_char() {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '\\' => value.push('\\'),
                        '"' => value.push('"'),
                        other => {
                            value.push('\\');
                            value.push(other);
                        }
                    }
                    self.advance();
                }
            } else {
                value.push(self.current_char());
                self.advance();
            }
        }

        if self.current_char() != '"' {
            self.errors.push(LexError::UnterminatedString {
                location: SourceLocation { line, column },
            });
            return None;
        }
        self.advance(); // Skip closing quote

        Some(TokenType::Text(value))
    }

    fn read_identifier(&mut self) -> TokenType {
        let mut value = String::new();

        while !self.is_at_end()
            && (self.current_char().is_alphanumeric() || self.current_char() == '_')
        {
            value.push(self.current_char());
            self.advance();
        }

        match value.as_str() {
            "int" => TokenType::Int,
            "float" => TokenType::Float,
            "string" => TokenType::String,
            "bool" => TokenType::Bool,
            "if" => TokenType::If,
            "elif" => TokenType::Elif,
            "else" => TokenType::Else,
            "while" => TokenType::While,
            "do" => TokenType::Do,
            "for" => TokenType::For,
            "function" => TokenType::Function,
            "struct" => TokenType::Struct,
            "array" => TokenType::Array,
            "print" => TokenType::Print,
            "read" => TokenType::Read,
            "return" => TokenType::Return,
            "and" => TokenType::And,
            "or" => TokenType::Or,
            "true" => TokenType::True,
            "false" => TokenType::False,
            _ => TokenType::Identifier(value),
        }
    }

    fn read_number(&mut self, line: usize, column: usize) -> Option<TokenType> {
        let mut value = self.read_digits();
        let mut is_real = false;

        if self.current_char() == '.' {
            value.push('.');
            self.advance();
            let fraction = self.read_digits();
            if fraction.is_empty() {
                return self.invalid_number(value, line, column);
            }
            value.push_str(&fraction);
            is_real = true;
        }

        // 12abc is one malformed token, not a number followed by a name
        if self.current_char().is_alphanumeric() || self.current_char() == '_' {
            while self.current_char().is_alphanumeric() || self.current_char() == '_' {
                value.push(self.current_char());
                self.advance();
            }
            return self.invalid_number(value, line, column);
        }

        if is_real {
            match value.parse() {
                Ok(v) => Some(TokenType::Real(v)),
                Err(_) => self.invalid_number(value, line, column),
            }
        } else {
            match value.parse() {
                Ok(v) => Some(TokenType::Integer(v)),
                Err(_) => self.invalid_number(value, line, column),
            }
        }
    }

    fn read_digits(&mut self) -> String {
        let mut digits = String::new();
        while self.current_char().is_ascii_digit() {
            digits.push(self.current_char());
            self.advance();
        }
        digits
    }

    fn invalid_number(&mut self, value: String, line: usize, column: usize) -> Option<TokenType> {
        self.errors.push(LexError::InvalidNumber {
            value,
            location: SourceLocation { line, column },
        });
        None
    }

    fn skip_trivia(&mut self) {
        while !self.is_at_end() {
            match self.current_char() {
                ' ' | '\r' | '\t' | '\n' => self.advance(),
                '/' if self.peek_char() == '/' => {
                    while !self.is_at_end() && self.current_char() != '\n' {
                        self.advance();
                    }
                }
                '/' if self.peek_char() == '*' => self.skip_block_comment(),
                _ => break,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let location = SourceLocation {
            line: self.line,
            column: self.column,
        };
        self.advance(); // '/'
        self.advance(); // '*'

        while !self.is_at_end() {
            if self.current_char() == '*' && self.peek_char() == '/' {
                self.advance();
                self.advance();
                return;
            }
            self.advance();
        }

        self.errors.push(LexError::UnterminatedComment { location });
    }

    fn current_char(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.input[self.position]
        }
    }

    fn peek_char(&self) -> char {
        self.input.get(self.position + 1).copied().unwrap_or('\0')
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            if self.current_char() == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }
}
