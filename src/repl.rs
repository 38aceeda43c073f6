//! Interactive REPL and file driver.
//!
//! The REPL buffers input until a complete statement is available, so a
//! clause may span lines. Errors are printed as `error: …`; the session
//! keeps going. In file mode the first error stops evaluation, matching
//! batch expectations.

use std::fs;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::engine::Engine;
use crate::input::InputReader;
use crate::parse::{ParseError, Parser, Statement};
use crate::term::{format_atom, Fact};

/// The interactive session: an engine plus the line buffer.
pub struct Repl {
    engine: Engine,
    buffer: String,
    prompt: String,
}

impl Repl {
    pub fn new() -> Self {
        Self::with_engine(Engine::new())
    }

    pub fn with_engine(engine: Engine) -> Self {
        Self {
            engine,
            buffer: String::new(),
            prompt: "| ".to_string(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Run the loop until end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> io::Result<()> {
        writeln!(output, "Press ^C to exit.")?;
        writeln!(output)?;

        loop {
            write!(output, "{}", self.prompt)?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                break;
            }
            self.feed_line(&line, output)?;
        }
        Ok(())
    }

    /// Append one line of input and evaluate every statement it
    /// completes. Incomplete trailing input stays buffered; a parse
    /// error is reported and the buffer is flushed.
    pub fn feed_line<W: Write>(&mut self, line: &str, output: &mut W) -> io::Result<()> {
        self.buffer.push_str(line);

        let (statements, keep_from, parse_err) = {
            let symbols = Arc::clone(self.engine.symbols());
            let mut parser = Parser::new(&self.buffer, &symbols);
            let mut statements = Vec::new();
            let mut good = 0;
            loop {
                match parser.next_statement() {
                    Ok(Some(statement)) => {
                        statements.push(statement);
                        good = parser.consumed();
                    }
                    Ok(None) => break (statements, None, None),
                    Err(ParseError::UnexpectedEof) => break (statements, Some(good), None),
                    Err(err) => break (statements, None, Some(err)),
                }
            }
        };

        self.buffer = match keep_from {
            Some(good) => self.buffer.chars().skip(good).collect(),
            None => String::new(),
        };

        for statement in statements {
            eval_statement(&mut self.engine, statement, output)?;
        }
        if let Some(err) = parse_err {
            writeln!(output, "error: {}", err)?;
        }
        Ok(())
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate one statement, printing query results and errors.
/// Returns false when an evaluation error was reported.
pub fn eval_statement<W: Write>(
    engine: &mut Engine,
    statement: Statement,
    output: &mut W,
) -> io::Result<bool> {
    match statement {
        Statement::Clause(clause) => match engine.eval(clause) {
            Ok(Some(results)) => {
                let symbols = Arc::clone(engine.symbols());
                let mut ok = true;
                for item in results {
                    match item {
                        Ok(atom) => writeln!(output, "{}", format_atom(&atom, &symbols))?,
                        Err(err) => {
                            writeln!(output, "error: {}", err)?;
                            ok = false;
                        }
                    }
                }
                Ok(ok)
            }
            Ok(None) => Ok(true),
            Err(err) => {
                writeln!(output, "error: {}", err)?;
                Ok(false)
            }
        },
        Statement::Input(spec) => {
            let mut reader = match InputReader::open(spec) {
                Ok(reader) => reader,
                Err(err) => {
                    writeln!(output, "error: {}", err)?;
                    return Ok(false);
                }
            };
            let symbols = Arc::clone(engine.symbols());
            loop {
                match reader.next_atom(&symbols) {
                    Ok(Some(atom)) => engine.assert_fact(Fact::Atom(atom)),
                    Ok(None) => return Ok(true),
                    Err(err) => {
                        writeln!(output, "error: {}", err)?;
                        return Ok(false);
                    }
                }
            }
        }
    }
}

/// Evaluate files in order, printing query results. Stops at the
/// first error.
pub fn eval_files<W: Write>(
    engine: &mut Engine,
    paths: &[String],
    output: &mut W,
) -> io::Result<()> {
    for path in paths {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                writeln!(output, "error: {}", err)?;
                return Ok(());
            }
        };
        let symbols = Arc::clone(engine.symbols());
        let mut parser = Parser::new(&text, &symbols);
        loop {
            match parser.next_statement() {
                Ok(Some(statement)) => {
                    if !eval_statement(engine, statement, output)? {
                        return Ok(());
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    writeln!(output, "error: {}", err)?;
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}
