// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Validate command - check a flow document

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::read_flow;
use crate::codec::FlowCodec;
use crate::config::CodecConfig;
use crate::errors::FlowError;
use crate::flow::Flow;
use crate::utils::{print_error, print_success, print_warning};

/// Run the validate command
pub fn run(
    flow_path: Option<PathBuf>,
    schema: Option<PathBuf>,
    no_schema: bool,
    config: CodecConfig,
    verbose: bool,
) -> Result<()> {
    println!("{}", "Validating flow...".bold());
    println!();

    let flow = match read_flow(flow_path.as_deref()) {
        Ok(flow) => flow,
        Err(e) => {
            print_error("Failed to parse flow document");
            println!();
            return Err(e.into());
        }
    };

    print_success("Flow document is valid JSON");

    let codec = FlowCodec::default().with_config(config);
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    match codec.validate(&flow) {
        Ok(report) => {
            print_success(&format!(
                "Structure is valid ({} steps, {} in the pipeline chain)",
                flow.steps.len(),
                report.chain.len()
            ));
            warnings.extend(report.warnings);
        }
        Err(e) => errors.push(e.to_string()),
    }

    for class_path in codec.unresolved_classes(&flow) {
        warnings.push(format!("Class '{}' is not registered for decoding", class_path));
    }

    if !no_schema {
        match check_schema(&flow, schema) {
            Ok(()) => print_success("Document conforms to the flow schema"),
            Err(FlowError::SchemaViolation { errors: violations }) => {
                errors.extend(violations.into_iter().map(|v| format!("Schema: {}", v)));
            }
            Err(e) => warnings.push(e.to_string()),
        }
    }

    if !errors.is_empty() {
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &errors {
            print_error(error);
        }
    }

    if !warnings.is_empty() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &warnings {
            print_warning(warning);
        }
    }

    if verbose {
        println!();
        println!("{}:", "Flow summary".bold());
        println!("  Schema: {}", flow.schema);
        println!("  Id: {}", flow.id);
        for (index, step) in flow.steps.iter().enumerate() {
            let role = if step.is_chain_member() { "" } else { " (referenced)" };
            println!("    [{}] {}{}", index, step.label(), role.dimmed());
        }
    }

    println!();

    if !errors.is_empty() {
        Err(miette::miette!("Flow validation failed"))
    } else if !warnings.is_empty() {
        println!("{}", "Flow is valid but has warnings.".yellow().bold());
        Ok(())
    } else {
        println!("{}", "Flow is valid!".green().bold());
        Ok(())
    }
}

#[cfg(feature = "schema-validation")]
fn check_schema(flow: &Flow, schema: Option<PathBuf>) -> Result<(), FlowError> {
    use crate::schema::{bundled_schema, load_schema, JsonSchemaValidator, SchemaValidator};

    let schema = match schema {
        Some(path) => load_schema(&path)?,
        None => bundled_schema()?,
    };

    JsonSchemaValidator::new(&schema)?.validate_flow(flow)
}

#[cfg(not(feature = "schema-validation"))]
fn check_schema(_flow: &Flow, _schema: Option<PathBuf>) -> Result<(), FlowError> {
    Err(FlowError::SchemaUnavailable {
        reason: "built without the 'schema-validation' feature".to_string(),
    })
}
