//! Error types.
//!
//! Only caller-facing failures live here. Expected outcomes of the search
//! (a token with no transition, an exhausted enumeration, a cyclic parse
//! branch) are plain `Option`s and ended iterators.

use std::fmt;

/// Integrity violation found while assembling a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A function or concrete category names an abstract category that was never declared.
    UndeclaredCategory { owner: String, cat: String },
    /// A concrete function has no abstract declaration.
    UndeclaredFunction { fun: String },
    /// A production refers to a category instance that does not exist.
    UnknownInstance { fid: i32, referenced: i32 },
    /// A coercion points at a category instance that does not exist.
    DanglingCoercion { fid: i32, target: i32 },
    /// Productions of one instance disagree on the number of fields.
    FieldArityMismatch {
        fid: i32,
        expected: usize,
        found: usize,
    },
    /// An Apply production passes a different number of arguments than the function declares.
    ArgumentCountMismatch {
        fun: String,
        expected: usize,
        found: usize,
    },
    /// A symbol indexes past the argument list of a production.
    SymbolArgOutOfRange { fun: String, arg: usize, arity: usize },
    /// A symbol reads a field its argument's instance does not have.
    SymbolFieldOutOfRange {
        fun: String,
        arg: usize,
        field: usize,
        n_fields: usize,
    },
    /// A production was added to a category instance that was never created.
    UndefinedInstance { concrete: String, fid: i32 },
    /// A concrete function refers to a sequence that does not exist.
    UnknownSequence { fun: String, seq: u32 },
    /// A production refers to a concrete function that does not exist.
    UnknownFunction { fid: i32, fun: u32 },
    /// Two concrete syntaxes with the same name.
    DuplicateConcrete { name: String },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::UndeclaredCategory { owner, cat } => {
                write!(f, "{} refers to undeclared category {}", owner, cat)
            }
            GrammarError::UndeclaredFunction { fun } => {
                write!(f, "concrete function {} has no abstract declaration", fun)
            }
            GrammarError::UnknownInstance { fid, referenced } => write!(
                f,
                "production of C{} refers to unknown category instance C{}",
                fid, referenced
            ),
            GrammarError::DanglingCoercion { fid, target } => {
                write!(f, "C{} coerces unknown category instance C{}", fid, target)
            }
            GrammarError::FieldArityMismatch {
                fid,
                expected,
                found,
            } => write!(
                f,
                "C{} has {} fields but a production provides {}",
                fid, expected, found
            ),
            GrammarError::ArgumentCountMismatch {
                fun,
                expected,
                found,
            } => write!(
                f,
                "{} takes {} arguments but a production passes {}",
                fun, expected, found
            ),
            GrammarError::SymbolArgOutOfRange { fun, arg, arity } => write!(
                f,
                "{} refers to argument {} but has arity {}",
                fun, arg, arity
            ),
            GrammarError::SymbolFieldOutOfRange {
                fun,
                arg,
                field,
                n_fields,
            } => write!(
                f,
                "{} reads field {} of argument {}, which has {} fields",
                fun, field, arg, n_fields
            ),
            GrammarError::UndefinedInstance { concrete, fid } => write!(
                f,
                "{} adds a production to undefined category instance C{}",
                concrete, fid
            ),
            GrammarError::UnknownSequence { fun, seq } => {
                write!(f, "{} refers to unknown sequence S{}", fun, seq)
            }
            GrammarError::UnknownFunction { fid, fun } => write!(
                f,
                "production of C{} refers to unknown concrete function F{}",
                fid, fun
            ),
            GrammarError::DuplicateConcrete { name } => {
                write!(f, "concrete syntax {} defined twice", name)
            }
        }
    }
}

impl std::error::Error for GrammarError {}

/// Failure to start a parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnknownLanguage(String),
    UnknownCategory(String),
    FieldOutOfRange {
        cat: String,
        field: usize,
        n_fields: usize,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnknownLanguage(name) => write!(f, "unknown concrete syntax {}", name),
            ParseError::UnknownCategory(name) => write!(f, "unknown category {}", name),
            ParseError::FieldOutOfRange {
                cat,
                field,
                n_fields,
            } => write!(
                f,
                "category {} has {} fields, field {} requested",
                cat, n_fields, field
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Failure while rendering a concrete tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinearizeError {
    UnknownLanguage(String),
    FieldOutOfRange {
        fun: String,
        field: usize,
        n_fields: usize,
    },
    ArgOutOfRange {
        fun: String,
        arg: usize,
        n_args: usize,
    },
}

impl fmt::Display for LinearizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinearizeError::UnknownLanguage(name) => {
                write!(f, "unknown concrete syntax {}", name)
            }
            LinearizeError::FieldOutOfRange {
                fun,
                field,
                n_fields,
            } => write!(
                f,
                "{} has {} fields, field {} requested",
                fun, n_fields, field
            ),
            LinearizeError::ArgOutOfRange { fun, arg, n_args } => write!(
                f,
                "{} refers to argument {} but has {} arguments",
                fun, arg, n_args
            ),
        }
    }
}

impl std::error::Error for LinearizeError {}

/// Syntax error in an abstract expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprParseError {
    /// Byte offset into the input.
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for ExprParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ExprParseError {}

/// Failure of the parse-then-generate pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    Parse(ParseError),
    Linearize(LinearizeError),
    /// No start category was given and the grammar has no `startcat` flag.
    NoStartCategory,
    /// The token at `position` has no transition.
    UnexpectedToken { token: String, position: usize },
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslateError::Parse(e) => write!(f, "parse error: {}", e),
            TranslateError::Linearize(e) => write!(f, "linearize error: {}", e),
            TranslateError::NoStartCategory => write!(f, "no start category"),
            TranslateError::UnexpectedToken { token, position } => {
                write!(f, "unexpected token {:?} at position {}", token, position)
            }
        }
    }
}

impl std::error::Error for TranslateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TranslateError::Parse(e) => Some(e),
            TranslateError::Linearize(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for TranslateError {
    fn from(e: ParseError) -> Self {
        TranslateError::Parse(e)
    }
}

impl From<LinearizeError> for TranslateError {
    fn from(e: LinearizeError) -> Self {
        TranslateError::Linearize(e)
    }
}
