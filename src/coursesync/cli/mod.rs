mod commands;
mod print;
pub mod setup;

pub use commands::run;
