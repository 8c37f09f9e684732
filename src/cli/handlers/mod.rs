//! Command handlers

pub mod list;
pub mod run;

pub use list::ListCommandHandler;
pub use run::RunCommandHandler;
