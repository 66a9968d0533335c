//! Integration test harness.

mod cli_tests;
