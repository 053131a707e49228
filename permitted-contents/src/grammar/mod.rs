//! Content-model grammar: compilation to patterns and structural matching.

pub mod compiler;
pub mod matcher;
pub mod pattern;

pub use compiler::Compiler;
pub use matcher::{LabeledSpan, MatchOutcome, run};
pub use pattern::{CompiledPattern, Constraint, Forbidden, Pattern, SpanLabel, Token, TokenClass};
