//! Tests for the block program engine
//!
//! Organized by operation area, plus engine-level scheduling and cancellation

mod helpers;

mod control_tests;
