// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Fingerprint command

use miette::Result;
use std::path::PathBuf;

use super::read_flow;
use crate::flow::fingerprint;

/// Run the fingerprint command
pub fn run(flow_path: Option<PathBuf>) -> Result<()> {
    let flow = read_flow(flow_path.as_deref())?;
    println!("{}", fingerprint(&flow)?);
    Ok(())
}
