//! Parse a line in one concrete syntax and generate it in another.

use crate::error::TranslateError;
use crate::expr::{format_expr, ExprStore};
use crate::grammar::Grammar;
use crate::linearize::Linearizer;
use crate::parser::Parser;
use crate::trace::{debug_span, info};

/// Knobs for [`translate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Category to parse; the grammar's `startcat` flag when None.
    pub category: Option<String>,
    pub from_field: usize,
    pub to_field: usize,
    /// Abstract trees taken from the parse.
    pub max_trees: usize,
    /// Concrete derivations linearized per tree.
    pub max_concretizations: usize,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        TranslateOptions {
            category: None,
            from_field: 0,
            to_field: 0,
            max_trees: 10,
            max_concretizations: 1,
        }
    }
}

/// One reading of the input and its renderings in the target syntax.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Translation {
    /// Abstract tree in printed form.
    pub tree: String,
    pub outputs: Vec<String>,
}

/// Translate `line`, split on whitespace, from `from` to `to`.
///
/// An input that is a valid prefix but not a complete sentence yields no
/// translations. A tree with no derivation in `to` yields a translation
/// with no outputs.
pub fn translate(
    grammar: &Grammar,
    from: &str,
    to: &str,
    line: &str,
    options: &TranslateOptions,
) -> Result<Vec<Translation>, TranslateError> {
    let _span = debug_span!("translate", from = from, to = to).entered();
    let category = match &options.category {
        Some(cat) => cat.as_str(),
        None => grammar.start_cat().ok_or(TranslateError::NoStartCategory)?,
    };

    let parser = Parser::new(grammar, from)?;
    let linearizer = Linearizer::new(grammar, to)?;

    let mut state = parser.parse(category, options.from_field)?;
    for (position, token) in line.split_whitespace().enumerate() {
        state = state
            .feed(token)
            .ok_or_else(|| TranslateError::UnexpectedToken {
                token: token.to_string(),
                position,
            })?;
    }

    let exprs = ExprStore::new();
    let mut translations = Vec::new();
    for expr in state.results(&exprs).take(options.max_trees) {
        let tree = format_expr(expr, &exprs, grammar.symbols())
            .unwrap_or_else(|_| format!("<expr {}>", expr.raw()));
        let mut outputs = Vec::new();
        for cnc in linearizer
            .concretize(expr, &exprs)
            .take(options.max_concretizations)
        {
            outputs.push(linearizer.linearize_tokens(&cnc, options.to_field)?.join(" "));
        }
        translations.push(Translation { tree, outputs });
    }
    info!(trees = translations.len(), "translated");
    Ok(translations)
}
