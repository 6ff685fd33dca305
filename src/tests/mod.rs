//! Cross-module test suite
//!
//! `test_blocks` holds small executors used as fixtures by the unit tests of
//! the registry, composites and engine.
