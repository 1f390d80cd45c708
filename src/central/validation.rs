// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Name validation for domains and records.

use hickory_proto::rr::Name;
use regex::Regex;
use std::str::FromStr;

use crate::errors::CentralError;

/// Ensure `name` is a syntactically valid, fully-qualified DNS name.
///
/// # Errors
///
/// Returns [`CentralError::BadRequest`] for names without a trailing dot,
/// the root name, or names that do not parse.
pub fn check_fqdn(name: &str) -> Result<(), CentralError> {
    if !name.ends_with('.') {
        return Err(CentralError::BadRequest(format!(
            "Name '{name}' must be fully qualified (end with '.')"
        )));
    }
    let parsed = Name::from_str(name)
        .map_err(|e| CentralError::BadRequest(format!("Invalid DNS name '{name}': {e}")))?;
    if parsed.num_labels() == 0 {
        return Err(CentralError::BadRequest(
            "The root name cannot be used here".to_string(),
        ));
    }
    Ok(())
}

/// Returns true if any blacklist pattern matches `name`.
#[must_use]
pub fn is_blacklisted(blacklist: &[Regex], name: &str) -> bool {
    blacklist.iter().any(|pattern| pattern.is_match(name))
}

/// Candidate ancestor zones of `name`, nearest first.
///
/// `a.b.example.com.` yields `b.example.com.`, `example.com.`, `com.`.
#[must_use]
pub fn ancestor_names(name: &str) -> Vec<String> {
    let labels: Vec<&str> = name.trim_end_matches('.').split('.').collect();
    (1..labels.len())
        .map(|i| format!("{}.", labels[i..].join(".")))
        .collect()
}

/// Returns true if `record_name` lies within the zone `domain_name`.
///
/// This is a plain suffix match: the apex is contained, and so is
/// `wwwexample.com.` under `example.com.`.
#[must_use]
pub fn is_contained(record_name: &str, domain_name: &str) -> bool {
    record_name.ends_with(domain_name)
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod validation_tests;
