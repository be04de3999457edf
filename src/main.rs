// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! sklearn-flow - pipeline flow codec
//!
//! Encode pipeline descriptions as flow documents and rebuild them again.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sklearn_flow::cli::{self, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays a clean document stream
    let default_filter = if cli.verbose {
        "sklearn_flow=debug"
    } else {
        "sklearn_flow=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Encode {
            pipeline,
            compact,
            output,
        } => cli::encode::run(pipeline, compact, output, config),
        Commands::Decode { flow } => cli::decode::run(flow, config, cli.verbose),
        Commands::Validate {
            flow,
            schema,
            no_schema,
        } => cli::validate::run(flow, schema, no_schema, config, cli.verbose),
        Commands::Graph { flow, format } => cli::graph::run(flow, format),
        Commands::Fingerprint { flow } => cli::fingerprint::run(flow),
    }
}
