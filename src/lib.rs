pub mod builder;
pub mod choice;
pub mod error;
pub mod expr;
pub mod grammar;
pub mod linearize;
pub mod metrics;
pub mod parser;
pub mod symbol;
pub mod trace;
pub mod translate;

#[cfg(test)]
pub(crate) mod test_utils;
