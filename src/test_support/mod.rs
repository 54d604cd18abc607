//! Helpers shared by in-crate unit tests.

pub mod socket_guard;
