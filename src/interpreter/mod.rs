//! Tree-walking interpreter.

pub mod environment;
pub mod executor;

pub use environment::Environment;
pub use executor::Interpreter;
