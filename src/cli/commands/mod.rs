//! One module per subcommand, each exposing an `execute` entry point.

pub mod add;
pub mod audit_cmd;
pub mod close_account;
pub mod completions;
pub mod delete;
pub mod list;
pub mod reveal;
pub mod seal;
pub mod signup;
pub mod verify;
pub mod version;
pub mod view;
