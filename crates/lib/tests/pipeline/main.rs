//! Pipeline integration tests.

mod common;
mod pipeline_tests;
