pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod symbol_table;
pub mod type_checker;

use tracing::info;

use ast::Program;
use config::ParserConfig;
use error::{CompileError, CompileResult};
use lexer::Lexer;
use parser::Parser;
use symbol_table::SymbolTable;

/// Everything a successful parse leaves behind.
#[derive(Debug)]
pub struct Compilation {
    pub program: Program,
    pub symbols: SymbolTable,
    /// Non-fatal diagnostics, in the order they were reported.
    pub diagnostics: Vec<String>,
}

/// Lex and parse `source`, running every semantic action on the way.
///
/// Parsing is not attempted when the lexer reported errors or the parser
/// starts out with diagnostics; all of those messages come back as
/// [`CompileError::Rejected`] instead.
pub fn compile(source: &str, config: &ParserConfig) -> CompileResult<Compilation> {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize();

    let mut parser = Parser::with_config(tokens, config.clone());

    if !lexer.errors().is_empty() || !parser.diagnostics().is_empty() {
        let mut messages: Vec<String> = lexer.errors().iter().map(ToString::to_string).collect();
        messages.extend(parser.diagnostics().messages());
        info!(errors = messages.len(), "rejected before parsing");
        return Err(CompileError::Rejected { messages });
    }

    let result = parser.parse();
    let (symbols, diagnostics) = parser.into_parts();

    match result {
        Ok(program) => Ok(Compilation {
            program,
            symbols,
            diagnostics: diagnostics.messages(),
        }),
        Err(error) => Err(CompileError::Parse {
            error,
            diagnostics: diagnostics.messages(),
        }),
    }
}
