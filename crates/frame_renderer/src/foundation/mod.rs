//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the pipeline:
//! - Math types and operations
//! - Slot-map backed collections
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod logging;
