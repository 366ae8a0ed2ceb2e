//! FFI surface of the weekly planner for the UI host.

pub mod api;
