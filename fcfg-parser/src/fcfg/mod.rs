//! Main module for fcfg library functionality

pub mod compiling;
pub mod completion;
pub mod enumeration;
pub mod error;
pub mod formats;
pub mod generation;
pub mod grammar;
pub mod lexing;
pub mod matching;
pub mod parser;
pub mod template;
