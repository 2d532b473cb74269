mod base;
mod list;

pub mod uci;

pub use base::*;
pub use list::*;
