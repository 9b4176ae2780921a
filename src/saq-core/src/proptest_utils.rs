//! Property-based testing utilities for saq-core.
//!
//! Strategies for generating arbitrary values and objects, used to check
//! the value model's equality and JSON round-trip behavior.
