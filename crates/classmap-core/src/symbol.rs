//! Symbol name folding.
//!
//! Symbols are compared and stored upper-cased. Every table key in this
//! crate has already passed through [`fold`].

use std::collections::HashMap;
use std::path::PathBuf;

/// Folded symbol → source file path.
pub type SymbolMap = HashMap<String, PathBuf>;

/// Fold a symbol name to its table key.
///
/// Only ASCII letters change; other characters pass through untouched.
pub fn fold(symbol: &str) -> String {
    symbol.to_ascii_uppercase()
}
