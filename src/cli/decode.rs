// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Decode command - flow document to pipeline description

use miette::Result;
use std::path::PathBuf;

use super::read_flow;
use crate::codec::FlowCodec;
use crate::config::CodecConfig;
use crate::utils::eprint_warning;

/// Run the decode command
pub fn run(flow_path: Option<PathBuf>, config: CodecConfig, verbose: bool) -> Result<()> {
    let flow = read_flow(flow_path.as_deref())?;
    let codec = FlowCodec::default().with_config(config);

    let (pipeline, report) = codec.from_flow_with_report(&flow)?;

    if verbose {
        for warning in &report.warnings {
            eprint_warning(warning);
        }
    }

    print!("{}", pipeline.to_yaml()?);
    Ok(())
}
