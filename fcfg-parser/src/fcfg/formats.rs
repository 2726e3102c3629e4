//! Text renderings of compiled structures

pub mod treeviz;
