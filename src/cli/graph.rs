// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Graph command - visualize the step graph of a flow

use miette::Result;
use std::path::PathBuf;

use super::{read_flow, GraphFormat};
use crate::flow::StepGraph;

/// Run the graph command
pub fn run(flow_path: Option<PathBuf>, format: GraphFormat) -> Result<()> {
    let flow = read_flow(flow_path.as_deref())?;
    let graph = StepGraph::build(&flow);

    let output = match format {
        GraphFormat::Text => graph.to_text()?,
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Mermaid => graph.to_mermaid(),
    };

    print!("{}", output);
    Ok(())
}
