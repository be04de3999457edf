// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for sklearn-flow.

pub mod decode;
pub mod encode;
pub mod fingerprint;
pub mod graph;
pub mod validate;

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::CodecConfig;
use crate::errors::{FlowError, FlowResult};
use crate::flow::Flow;

/// Pipeline flow codec
///
/// Convert pipeline descriptions to flow documents and back.
#[derive(Parser, Debug)]
#[clap(
    name = "sklearn-flow",
    version,
    about = "Encode scikit-learn style pipelines as flow documents and rebuild them again",
    long_about = None,
    after_help = "Examples:\n\
        sklearn-flow encode titanic.yaml > flow.json     Encode a pipeline\n\
        sklearn-flow decode flow.json                    Rebuild the pipeline\n\
        sklearn-flow validate flow.json                  Check a flow document\n\
        cat flow.json | sklearn-flow graph -f mermaid    Render the step graph\n\n\
        See 'sklearn-flow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Codec configuration file (defaults to ./.sklearn-flow.yaml)
    #[clap(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode a YAML pipeline description as a flow document
    Encode {
        /// Pipeline description
        pipeline: PathBuf,

        /// Print the document on one line
        #[clap(long)]
        compact: bool,

        /// Output file (default: stdout)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Rebuild the pipeline a flow document describes
    Decode {
        /// Flow document ('-' or omitted for stdin)
        flow: Option<PathBuf>,
    },

    /// Validate a flow document
    Validate {
        /// Flow document ('-' or omitted for stdin)
        flow: Option<PathBuf>,

        /// JSON Schema to check against (default: bundled schema)
        #[clap(short, long)]
        schema: Option<PathBuf>,

        /// Skip JSON Schema validation
        #[clap(long, conflicts_with = "schema")]
        no_schema: bool,
    },

    /// Show the step graph of a flow document
    Graph {
        /// Flow document ('-' or omitted for stdin)
        flow: Option<PathBuf>,

        /// Output format (text, dot, mermaid)
        #[clap(short, long, default_value = "text")]
        format: GraphFormat,
    },

    /// Print the id-independent content hash of a flow document
    Fingerprint {
        /// Flow document ('-' or omitted for stdin)
        flow: Option<PathBuf>,
    },
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

impl std::str::FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "dot" => Ok(Self::Dot),
            "mermaid" => Ok(Self::Mermaid),
            _ => Err(format!("Unknown graph format: {}", s)),
        }
    }
}

/// Load the configuration named on the command line, or the one in the
/// current directory
pub fn load_config(path: Option<&Path>) -> FlowResult<CodecConfig> {
    match path {
        Some(path) if !path.exists() => Err(FlowError::FileReadError {
            path: path.to_path_buf(),
            error: "file not found".to_string(),
        }),
        Some(path) => CodecConfig::load(path),
        None => CodecConfig::load_from_dir(&std::env::current_dir()?),
    }
}

/// Read a flow document from a file, or from stdin for `None` and `-`
pub fn read_flow(path: Option<&Path>) -> FlowResult<Flow> {
    match path {
        Some(path) if path != Path::new("-") => Flow::from_file(path),
        _ => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            Flow::from_json(&content)
        }
    }
}
