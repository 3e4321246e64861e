mod ops;

pub use ops::Protocol;

#[cfg(test)]
mod op_test;
