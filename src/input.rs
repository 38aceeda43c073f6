//! Tabular fact loading for the `#input` directive.
//!
//! ```text
//! #input foo(source="file.csv", separator=",", skip=1, columns="1,3")
//! #input bar(source=stdin, sep="\t", cols="2-4")
//! ```
//!
//! Each row of the source becomes one `name/k` fact: the line is split
//! on the separator, the selected fields are trimmed and read with the
//! term grammar. Reading stops at the first blank line or end of file.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::parse::{classify_word, ParseError};
use crate::symbol::SymbolStore;
use crate::term::{Args, Atom};

/// Where rows come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Stdin,
    /// Path as written; `~` expansion happens on open.
    Path(String),
}

/// A parsed `#input` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    /// Predicate name for the loaded facts.
    pub name: String,
    pub source: Source,
    pub separator: String,
    /// Leading rows to drop.
    pub skip: usize,
    /// Zero-based field selection, sorted; empty takes every field.
    pub columns: Vec<usize>,
}

/// Errors from opening or reading a tabular source.
#[derive(Debug)]
pub enum InputError {
    Io(io::Error),
    Parse(ParseError),
    /// A selected column is past the end of the row (1-based in the
    /// message, like the selector syntax).
    MissingColumn(usize),
    HomeNotSet,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Io(err) => write!(f, "{}", err),
            InputError::Parse(err) => write!(f, "{}", err),
            InputError::MissingColumn(i) => write!(f, "missing column: {}", i),
            InputError::HomeNotSet => write!(f, "HOME not set"),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::Io(err) => Some(err),
            InputError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for InputError {
    fn from(err: io::Error) -> Self {
        InputError::Io(err)
    }
}

impl From<ParseError> for InputError {
    fn from(err: ParseError) -> Self {
        InputError::Parse(err)
    }
}

/// Parse a column selector: comma-separated 1-based indices and
/// inclusive `a-b` ranges. Returns zero-based, sorted, deduplicated.
pub fn parse_columns(spec: &str) -> Result<Vec<usize>, ParseError> {
    let mut out = Vec::new();
    for field in spec.split(',') {
        match field.split_once('-') {
            None => out.push(parse_column(field)?),
            Some((lo, hi)) => {
                let lo = parse_column(lo)?;
                let hi = parse_column(hi)?;
                if hi < lo {
                    return Err(ParseError::InvalidColumns(field.to_string()));
                }
                out.extend(lo..=hi);
            }
        }
    }
    out.sort_unstable();
    out.dedup();
    Ok(out)
}

fn parse_column(field: &str) -> Result<usize, ParseError> {
    field
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1)
        .map(|n| n - 1)
        .ok_or_else(|| ParseError::InvalidColumns(field.to_string()))
}

/// Expand a leading `~` against `$HOME` and absolutize.
pub fn expand_path(path: &str) -> Result<PathBuf, InputError> {
    let expanded = if path == "~" {
        PathBuf::from(home()?)
    } else if let Some(rest) = path.strip_prefix("~/") {
        Path::new(&home()?).join(rest)
    } else {
        PathBuf::from(path)
    };
    Ok(std::path::absolute(expanded)?)
}

fn home() -> Result<String, InputError> {
    std::env::var("HOME").map_err(|_| InputError::HomeNotSet)
}

/// Streams atoms out of a tabular source, one per row.
pub struct InputReader {
    spec: InputSpec,
    reader: Box<dyn BufRead>,
    row: usize,
}

impl InputReader {
    /// Open the directive's source.
    pub fn open(spec: InputSpec) -> Result<Self, InputError> {
        let reader: Box<dyn BufRead> = match &spec.source {
            Source::Stdin => Box::new(io::stdin().lock()),
            Source::Path(path) => {
                let path = expand_path(path)?;
                Box::new(BufReader::new(File::open(path)?))
            }
        };
        Ok(Self::from_reader(spec, reader))
    }

    /// Read from an arbitrary source.
    pub fn from_reader(spec: InputSpec, reader: Box<dyn BufRead>) -> Self {
        Self {
            spec,
            reader,
            row: 0,
        }
    }

    /// Next fact, or None at a blank line or end of input.
    pub fn next_atom(&mut self, symbols: &SymbolStore) -> Result<Option<Atom>, InputError> {
        while self.row < self.spec.skip {
            let mut skipped = String::new();
            if self.reader.read_line(&mut skipped)? == 0 {
                return Ok(None);
            }
            self.row += 1;
        }

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        self.row += 1;
        if line.trim().is_empty() {
            return Ok(None);
        }
        self.parse_line(&line, symbols).map(Some)
    }

    /// Split one row into a fact.
    pub fn parse_line(&self, line: &str, symbols: &SymbolStore) -> Result<Atom, InputError> {
        let fields: Vec<&str> = line.split(self.spec.separator.as_str()).collect();
        let mut args = Args::new();
        if self.spec.columns.is_empty() {
            for field in &fields {
                args.push(classify_word(field.trim(), symbols)?);
            }
        } else {
            for &i in &self.spec.columns {
                let field = fields.get(i).ok_or(InputError::MissingColumn(i + 1))?;
                args.push(classify_word(field.trim(), symbols)?);
            }
        }
        Ok(Atom {
            pred: symbols.intern(&self.spec.name),
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Term;
    use std::io::Cursor;

    fn spec(separator: &str, skip: usize, columns: Vec<usize>) -> InputSpec {
        InputSpec {
            name: "row".to_string(),
            source: Source::Stdin,
            separator: separator.to_string(),
            skip,
            columns,
        }
    }

    fn reader(text: &str, spec: InputSpec) -> InputReader {
        InputReader::from_reader(spec, Box::new(Cursor::new(text.to_string())))
    }

    // ========== COLUMN SELECTORS ==========

    #[test]
    fn parse_columns_singles_and_ranges() {
        assert_eq!(parse_columns("1").unwrap(), vec![0]);
        assert_eq!(parse_columns("1,3").unwrap(), vec![0, 2]);
        assert_eq!(parse_columns("2-4").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_columns("3,1-2,2").unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn parse_columns_rejects_bad_selectors() {
        assert!(parse_columns("0").is_err());
        assert!(parse_columns("x").is_err());
        assert!(parse_columns("3-1").is_err());
        assert!(parse_columns("1-2-3").is_err());
        assert!(parse_columns("").is_err());
    }

    // ========== ROWS ==========

    #[test]
    fn reads_every_field_by_default() {
        let symbols = SymbolStore::new();
        let mut input = reader("alice\t30\nbob\t42\n", spec("\t", 0, vec![]));

        let first = input.next_atom(&symbols).unwrap().unwrap();
        assert_eq!(first.args[0], Term::Str(symbols.intern("alice")));
        assert_eq!(first.args[1], Term::Int(30));

        let second = input.next_atom(&symbols).unwrap().unwrap();
        assert_eq!(second.args[0], Term::Str(symbols.intern("bob")));

        assert!(input.next_atom(&symbols).unwrap().is_none());
    }

    #[test]
    fn selects_and_reorders_columns() {
        let symbols = SymbolStore::new();
        let mut input = reader("a,b,c\n", spec(",", 0, vec![0, 2]));

        let atom = input.next_atom(&symbols).unwrap().unwrap();
        assert_eq!(atom.args.len(), 2);
        assert_eq!(atom.args[0], Term::Str(symbols.intern("a")));
        assert_eq!(atom.args[1], Term::Str(symbols.intern("c")));
    }

    #[test]
    fn missing_column_is_an_error() {
        let symbols = SymbolStore::new();
        let mut input = reader("a,b\n", spec(",", 0, vec![4]));
        let err = input.next_atom(&symbols).unwrap_err();
        assert!(matches!(err, InputError::MissingColumn(5)));
    }

    #[test]
    fn skips_header_rows() {
        let symbols = SymbolStore::new();
        let mut input = reader("name,age\nalice,30\n", spec(",", 1, vec![]));

        let atom = input.next_atom(&symbols).unwrap().unwrap();
        assert_eq!(atom.args[0], Term::Str(symbols.intern("alice")));
    }

    #[test]
    fn blank_line_ends_the_stream() {
        let symbols = SymbolStore::new();
        let mut input = reader("a\n\nb\n", spec(",", 0, vec![]));

        assert!(input.next_atom(&symbols).unwrap().is_some());
        assert!(input.next_atom(&symbols).unwrap().is_none());
    }

    #[test]
    fn quoted_and_numeric_fields_parse_as_terms() {
        let symbols = SymbolStore::new();
        let mut input = reader("\"hello world\",-5\n", spec(",", 0, vec![]));

        let atom = input.next_atom(&symbols).unwrap().unwrap();
        assert_eq!(atom.args[0], Term::Str(symbols.intern("hello world")));
        assert_eq!(atom.args[1], Term::Int(-5));
    }

    // ========== PATHS ==========

    #[test]
    fn expand_path_handles_home_prefix() {
        let home = std::env::var("HOME").expect("HOME set in test env");
        let expanded = expand_path("~/data.csv").unwrap();
        assert_eq!(expanded, Path::new(&home).join("data.csv"));

        let bare = expand_path("~").unwrap();
        assert_eq!(bare, PathBuf::from(&home));
    }

    #[test]
    fn expand_path_leaves_other_paths_alone() {
        let expanded = expand_path("/tmp/data.csv").unwrap();
        assert_eq!(expanded, PathBuf::from("/tmp/data.csv"));
    }
}
