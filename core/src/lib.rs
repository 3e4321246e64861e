pub mod ast;
pub mod compiler;
pub mod env;
pub mod error;
pub mod interp;
pub mod module;
pub mod op;
pub mod rt;
pub mod token;
pub mod util;
pub mod val;
