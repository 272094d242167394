//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises the toolkit against the
//! recording mock stack. All tests run on the host with no controller
//! required.

mod toolkit_tests;
