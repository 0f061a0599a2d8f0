pub mod coveralls;
pub mod error;
pub mod filemap;
pub mod llvm;
pub mod model;
pub mod payload;
pub mod resolve;
