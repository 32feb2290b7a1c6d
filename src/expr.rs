use crate::error::ExprParseError;
use crate::symbol::{CId, SymbolStore};
use hashbrown::HashMap;
use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::fmt;
use std::hash::BuildHasherDefault;

/// Identifier of an abstract syntax tree in an `ExprStore`.
/// Structurally equal trees share one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(OrderedFloat<f64>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                f.write_str("\"")
            }
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(x) => write!(f, "{:?}", x.into_inner()),
        }
    }
}

/// Abstract syntax tree node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// Function application; nullary for constants.
    App(CId, SmallVec<[ExprId; 4]>),
    Lit(Literal),
    /// Hole for an argument that was never realized.
    Meta(u32),
}

type FxBuild = BuildHasherDefault<FxHasher>;

/// Hash-consing store of abstract syntax trees.
///
/// Guarantees:
/// - Structurally equal trees get the same ExprId
/// - An ExprId can be resolved back to its node
pub struct ExprStore {
    nodes: RwLock<Vec<Expr>>,
    index: RwLock<HashMap<Expr, ExprId, FxBuild>>,
}

impl ExprStore {
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(Vec::new()),
            index: RwLock::new(HashMap::default()),
        }
    }

    fn intern(&self, expr: Expr) -> ExprId {
        {
            let index = self.index.read();
            if let Some(&id) = index.get(&expr) {
                return id;
            }
        }

        let mut index = self.index.write();
        // Another writer may have inserted it in between.
        if let Some(&id) = index.get(&expr) {
            return id;
        }
        let mut nodes = self.nodes.write();
        let id = ExprId(nodes.len() as u32);
        nodes.push(expr.clone());
        index.insert(expr, id);
        id
    }

    pub fn app(&self, fun: CId, args: SmallVec<[ExprId; 4]>) -> ExprId {
        self.intern(Expr::App(fun, args))
    }

    pub fn app0(&self, fun: CId) -> ExprId {
        self.app(fun, SmallVec::new())
    }

    pub fn lit(&self, lit: Literal) -> ExprId {
        self.intern(Expr::Lit(lit))
    }

    pub fn str(&self, s: &str) -> ExprId {
        self.lit(Literal::Str(s.to_string()))
    }

    pub fn int(&self, n: i64) -> ExprId {
        self.lit(Literal::Int(n))
    }

    pub fn float(&self, x: f64) -> ExprId {
        self.lit(Literal::Float(OrderedFloat(x)))
    }

    pub fn meta(&self, id: u32) -> ExprId {
        self.intern(Expr::Meta(id))
    }

    pub fn resolve(&self, id: ExprId) -> Option<Expr> {
        self.nodes.read().get(id.0 as usize).cloned()
    }

    /// Function and arguments of an application.
    pub fn as_app(&self, id: ExprId) -> Option<(CId, SmallVec<[ExprId; 4]>)> {
        match self.resolve(id)? {
            Expr::App(f, args) => Some((f, args)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ExprStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a tree in application syntax: `f (g a) "s" ?0`.
pub fn format_expr(expr: ExprId, exprs: &ExprStore, symbols: &SymbolStore) -> Result<String, String> {
    fn render(
        expr: ExprId,
        exprs: &ExprStore,
        symbols: &SymbolStore,
        nested: bool,
        out: &mut String,
    ) -> Result<(), String> {
        match exprs.resolve(expr) {
            Some(Expr::App(fun, args)) => {
                let name = symbols
                    .resolve(fun)
                    .ok_or_else(|| format!("Unknown symbol for function id {:?}", fun))?;
                let parens = nested && !args.is_empty();
                if parens {
                    out.push('(');
                }
                out.push_str(name);
                for arg in args.iter() {
                    out.push(' ');
                    render(*arg, exprs, symbols, true, out)?;
                }
                if parens {
                    out.push(')');
                }
                Ok(())
            }
            Some(Expr::Lit(lit)) => {
                let text = lit.to_string();
                let negative = matches!(lit, Literal::Int(n) if n < 0)
                    || matches!(lit, Literal::Float(x) if x.into_inner() < 0.0);
                if nested && negative {
                    out.push('(');
                    out.push_str(&text);
                    out.push(')');
                } else {
                    out.push_str(&text);
                }
                Ok(())
            }
            Some(Expr::Meta(id)) => {
                out.push('?');
                out.push_str(&id.to_string());
                Ok(())
            }
            None => Err(format!("Unknown expression id {:?}", expr)),
        }
    }

    let mut out = String::new();
    render(expr, exprs, symbols, false, &mut out)?;
    Ok(out)
}

/// Read a tree written in the syntax of [`format_expr`].
///
/// A single trailing `;` is accepted. Identifiers are interned into `symbols`.
pub fn parse_expr(
    input: &str,
    exprs: &ExprStore,
    symbols: &SymbolStore,
) -> Result<ExprId, ExprParseError> {
    let mut reader = Reader {
        input,
        pos: 0,
        exprs,
        symbols,
    };
    let expr = reader.expr()?;
    reader.skip_ws();
    if reader.peek() == Some(';') {
        reader.pos += 1;
        reader.skip_ws();
    }
    if reader.pos < input.len() {
        return Err(reader.error("unexpected trailing input"));
    }
    Ok(expr)
}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
    exprs: &'a ExprStore,
    symbols: &'a SymbolStore,
}

impl<'a> Reader<'a> {
    fn error(&self, message: &str) -> ExprParseError {
        ExprParseError {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn at_atom_start(&self) -> bool {
        matches!(self.peek(), Some(c) if c == '(' || c == '"' || c == '?' || c == '-'
            || c.is_ascii_digit() || is_ident_start(c))
    }

    /// Application or single atom.
    fn expr(&mut self) -> Result<ExprId, ExprParseError> {
        self.skip_ws();
        let start = self.pos;
        if let Some(c) = self.peek() {
            if is_ident_start(c) {
                let fun = self.ident();
                let mut args = SmallVec::new();
                loop {
                    self.skip_ws();
                    if !self.at_atom_start() {
                        break;
                    }
                    args.push(self.atom()?);
                }
                return Ok(self.exprs.app(fun, args));
            }
        }
        let atom = self.atom()?;
        self.skip_ws();
        if self.at_atom_start() {
            self.pos = start;
            return Err(self.error("only functions can be applied"));
        }
        Ok(atom)
    }

    fn atom(&mut self) -> Result<ExprId, ExprParseError> {
        self.skip_ws();
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let inner = self.expr()?;
                self.skip_ws();
                if self.peek() != Some(')') {
                    return Err(self.error("expected ')'"));
                }
                self.pos += 1;
                Ok(inner)
            }
            Some('"') => self.string(),
            Some('?') => {
                self.pos += 1;
                let digits = self.take_while(|c| c.is_ascii_digit());
                let id = if digits.is_empty() {
                    0
                } else {
                    digits
                        .parse()
                        .map_err(|_| self.error("meta index out of range"))?
                };
                Ok(self.exprs.meta(id))
            }
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(c) if is_ident_start(c) => {
                let fun = self.ident();
                Ok(self.exprs.app0(fun))
            }
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn ident(&mut self) -> CId {
        let name = self.take_while(|c| c.is_alphanumeric() || c == '_' || c == '\'');
        self.symbols.intern(name)
    }

    fn number(&mut self) -> Result<ExprId, ExprParseError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        let int_part = self.take_while(|c| c.is_ascii_digit());
        if int_part.is_empty() {
            self.pos = start;
            return Err(self.error("expected digits"));
        }
        let mut is_float = false;
        if self.peek() == Some('.') {
            is_float = true;
            self.pos += 1;
            self.take_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            is_float = true;
            self.pos += 1;
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.pos += 1;
            }
            self.take_while(|c| c.is_ascii_digit());
        }
        let text = &self.input[start..self.pos];
        if is_float {
            let x: f64 = text.parse().map_err(|_| ExprParseError {
                offset: start,
                message: format!("invalid float {}", text),
            })?;
            Ok(self.exprs.float(x))
        } else {
            let n: i64 = text.parse().map_err(|_| ExprParseError {
                offset: start,
                message: format!("invalid integer {}", text),
            })?;
            Ok(self.exprs.int(n))
        }
    }

    fn string(&mut self) -> Result<ExprId, ExprParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(self.exprs.str(&value));
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, other)) => value.push(other),
                    None => break,
                },
                c => value.push(c),
            }
        }
        Err(ExprParseError {
            offset: start,
            message: "unterminated string literal".to_string(),
        })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

#[cfg(test)]
#[path = "tests/expr.rs"]
mod tests;
