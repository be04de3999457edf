// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Encode command - pipeline description to flow document

use miette::Result;
use std::path::{Path, PathBuf};

use crate::codec::FlowCodec;
use crate::config::CodecConfig;
use crate::errors::FlowError;
use crate::transform::Pipeline;

/// Run the encode command
pub fn run(
    pipeline_path: PathBuf,
    compact: bool,
    output: Option<PathBuf>,
    config: CodecConfig,
) -> Result<()> {
    if !pipeline_path.exists() {
        return Err(miette::miette!(
            "Pipeline file not found: {}",
            pipeline_path.display()
        ));
    }

    let pipeline = Pipeline::from_file(&pipeline_path)?;
    let codec = FlowCodec::default().with_config(config);
    let flow = codec.to_flow(&pipeline)?;

    let json = if compact {
        flow.to_json()?
    } else {
        flow.to_json_pretty()?
    };

    match output {
        Some(path) => write_file(&path, &json)?,
        None => println!("{}", json),
    }

    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<(), FlowError> {
    std::fs::write(path, format!("{}\n", content)).map_err(|e| FlowError::FileWriteError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}
