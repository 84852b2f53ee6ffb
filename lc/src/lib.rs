mod compile;

pub use compile::{compile, compile_source, Args};
