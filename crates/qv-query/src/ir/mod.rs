//! Query IR: the value every registry operation and pass consumes and returns

pub mod expr;
pub mod preload;
pub mod query;
