// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Data references
//!
//! The only addressing scheme between chain steps: `inputs.0` is the document
//! input, `steps.<i>.output` the output of step `i`.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Address of a piece of data flowing through the top-level chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataRef {
    /// The document input
    Input,
    /// Output of the step at this index
    Step(usize),
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:inputs\.0|steps\.(0|[1-9][0-9]*)\.output)$")
            .expect("data reference pattern is valid")
    })
}

impl DataRef {
    /// Parse a reference token, `None` when malformed
    pub fn parse(token: &str) -> Option<Self> {
        let captures = pattern().captures(token)?;
        match captures.get(1) {
            Some(index) => index.as_str().parse().ok().map(Self::Step),
            None => Some(Self::Input),
        }
    }

    /// Index of the referenced step
    pub fn step_index(&self) -> Option<usize> {
        match self {
            Self::Input => None,
            Self::Step(i) => Some(*i),
        }
    }
}

impl fmt::Display for DataRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "inputs.0"),
            Self::Step(i) => write!(f, "steps.{}.output", i),
        }
    }
}

impl FromStr for DataRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid data reference: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(DataRef::Input.to_string(), "inputs.0");
        assert_eq!(DataRef::Step(12).to_string(), "steps.12.output");
    }

    #[test]
    fn test_parse() {
        assert_eq!(DataRef::parse("inputs.0"), Some(DataRef::Input));
        assert_eq!(DataRef::parse("steps.0.output"), Some(DataRef::Step(0)));
        assert_eq!(DataRef::parse("steps.41.output"), Some(DataRef::Step(41)));
        assert_eq!("steps.3.output".parse::<DataRef>(), Ok(DataRef::Step(3)));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for token in ["inputs.1", "steps.01.output", "steps.x.output", "steps.1", "", " inputs.0"] {
            assert_eq!(DataRef::parse(token), None, "{token}");
        }
    }
}
