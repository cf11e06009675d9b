//! Harness for driving the `grove` binary against throwaway libraries.

mod command;
mod env;
mod note;

#[allow(unused_imports)]
pub use command::GroveCommand;
#[allow(unused_imports)]
pub use env::TestEnv;
#[allow(unused_imports)]
pub use note::TestNote;
