// Library interface for sandesh modules
// This allows tests and the binary to import modules

pub mod admin;
pub mod public;
pub mod refresh;
pub mod render;
pub mod source;
pub mod state;
pub mod weather;
