//! Declaration-level view of C# sources: tokens, syntax trees and merged type symbols.

pub mod lexer;
pub mod symbols;
pub mod syntax;

pub use symbols::{Compilation, TypeSymbol};
pub use syntax::{parse, SyntaxTree};
