// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Utility modules
//!
//! Common utilities for the sklearn-flow CLI.

pub mod colors;

pub use colors::*;
