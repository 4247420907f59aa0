//! Configuration sources, lowest precedence first: global file, working-directory file,
//! environment.

pub mod environment;
pub mod global_file;
pub mod workspace_file;
