//! Test suites for the session server bootstrap, sessions and process.

mod process_behaviour;
pub(crate) mod support;
