//! # Plugin registry
//!
//! Named generator functions injected into the evaluator, plus optional
//! lexer/parser hooks (spec §4.C). Everything here is owned by a single
//! [`PluginRegistry`] value passed explicitly into a compilation — there is
//! no process-global table, so two compilations can register different
//! plugins without fighting over shared state (spec §9, "global mutable
//! registries").

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::context::GenerationContext;
use crate::error::LoomResult;
use crate::token::TokenKind;
use crate::value::Value;

/// A plugin-registered generator function: `(args, context) -> value`.
pub type GeneratorFn = Arc<dyn Fn(&[Value], &mut GenerationContext) -> LoomResult<Value> + Send + Sync>;

/// A plugin-registered statement parser hook, dispatched when the leading
/// token matches a registered [`TokenKind`]. Returns the parsed statement's
/// AST, already fully consumed from the token stream by the hook.
pub type StatementParserFn =
    Arc<dyn Fn(&mut crate::parser::TokenCursor) -> LoomResult<crate::ast::Statement> + Send + Sync>;

/// Name → generator lookup with a negative cache, plus optional lexer and
/// parser extension tables. A fresh registry has no plugins registered;
/// callers `register` whatever third-party generators they need (sequence
/// counters etc. are handled directly by the evaluator, not through this
/// table — this is for *named* third-party generators like
/// `faker.company()`).
#[derive(Clone)]
pub struct PluginRegistry {
    generators: HashMap<String, GeneratorFn>,
    keywords: HashMap<String, TokenKind>,
    statement_parsers: HashMap<String, StatementParserFn>,
    // Negative cache: names that were looked up and found absent. Cleared on
    // every registration/unregistration so a later `register` is observed.
    negative_cache: RefCell<HashMap<String, ()>>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("generators", &self.generators.keys().collect::<Vec<_>>())
            .field("keywords", &self.keywords.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        PluginRegistry {
            generators: HashMap::new(),
            keywords: HashMap::new(),
            statement_parsers: HashMap::new(),
            negative_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Registers a named generator, supporting qualified names (`"ns.name"`).
    /// Invalidates the negative cache entry for this name.
    pub fn register(&mut self, name: impl Into<String>, generator: GeneratorFn) {
        let name = name.into();
        self.negative_cache.borrow_mut().remove(&name);
        self.generators.insert(name, generator);
    }

    pub fn unregister(&mut self, name: &str) {
        self.generators.remove(name);
        self.negative_cache.borrow_mut().remove(name);
    }

    /// Looks up a generator by qualified name, consulting (and populating)
    /// the negative cache when absent.
    pub fn lookup(&self, name: &str) -> Option<GeneratorFn> {
        if let Some(g) = self.generators.get(name) {
            return Some(g.clone());
        }
        self.negative_cache.borrow_mut().insert(name.to_string(), ());
        None
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.generators.contains_key(name)
    }

    /// Registers a keyword the lexer should recognize in addition to the
    /// closed built-in set. Built-in keywords always take priority.
    pub fn register_keyword(&mut self, name: impl Into<String>, kind: TokenKind) {
        self.keywords.insert(name.into(), kind);
    }

    pub fn lookup_keyword(&self, ident: &str) -> Option<TokenKind> {
        self.keywords.get(ident).cloned()
    }

    /// Registers a statement-parser hook dispatched when the leading token's
    /// lexeme matches `leading_lexeme`.
    pub fn register_statement_parser(&mut self, leading_lexeme: impl Into<String>, parser: StatementParserFn) {
        self.statement_parsers.insert(leading_lexeme.into(), parser);
    }

    pub fn statement_parser_for(&self, leading_lexeme: &str) -> Option<StatementParserFn> {
        self.statement_parsers.get(leading_lexeme).cloned()
    }
}

/// Evaluates a `Call` expression's arguments against a context, then looks
/// the callee up in `registry`. Used by the evaluator's final dispatch tier
/// (spec §4.H, "then plugin registry").
pub fn call_plugin(
    registry: &PluginRegistry,
    name: &str,
    args: &[Value],
    ctx: &mut GenerationContext,
) -> LoomResult<Value> {
    match registry.lookup(name) {
        Some(f) => f(args, ctx).map_err(|e| crate::error::LoomError::PluginError {
            generator: name.to_string(),
            message: e.to_string(),
        }),
        None => Err(crate::error::LoomError::UnknownGenerator { name: name.to_string() }),
    }
}
