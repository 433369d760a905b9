//! CLI integration tests against YAML fixtures.

mod build_tests;
mod common;
mod render_tests;
