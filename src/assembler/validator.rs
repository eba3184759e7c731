//! Assembled configuration validation.
//!
//! # Responsibilities
//! - Accept or reject a rendered alertmanager.yml
//!
//! # Design Decisions
//! - The verdict is ground truth for the controller and is never bypassed
//! - `AlertmanagerValidator` only checks what fragment assembly can break:
//!   YAML shape, receiver names, and receiver references in the route tree

use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use thiserror::Error;

/// Rejection of an assembled configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Grammar check for a rendered configuration.
pub trait ConfigValidator: Send + Sync {
    fn validate(&self, rendered: &str) -> Result<(), ValidationError>;
}

impl<F> ConfigValidator for F
where
    F: Fn(&str) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, rendered: &str) -> Result<(), ValidationError> {
        self(rendered)
    }
}

/// Structural validator for Alertmanager configuration files.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertmanagerValidator;

impl ConfigValidator for AlertmanagerValidator {
    fn validate(&self, rendered: &str) -> Result<(), ValidationError> {
        let document: Value = serde_yaml::from_str(rendered)
            .map_err(|e| ValidationError::new(format!("invalid YAML: {e}")))?;
        let root = document
            .as_mapping()
            .ok_or_else(|| ValidationError::new("configuration must be a YAML mapping"))?;

        let receivers = receiver_names(root.get("receivers"))?;

        let route = match root.get("route") {
            Some(Value::Mapping(route)) => route,
            Some(Value::Null) | None => return Err(ValidationError::new("no routes provided")),
            Some(_) => return Err(ValidationError::new("route must be a mapping")),
        };
        match route.get("receiver").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => {}
            _ => {
                return Err(ValidationError::new(
                    "root route must specify a default receiver",
                ))
            }
        }
        check_route(route, &receivers)?;

        match root.get("inhibit_rules") {
            None | Some(Value::Null) => {}
            Some(Value::Sequence(rules)) => {
                if rules.iter().any(|rule| !rule.is_mapping()) {
                    return Err(ValidationError::new("inhibit rules must be mappings"));
                }
            }
            Some(_) => return Err(ValidationError::new("inhibit_rules must be a list")),
        }

        Ok(())
    }
}

fn receiver_names(receivers: Option<&Value>) -> Result<HashSet<String>, ValidationError> {
    let mut names = HashSet::new();
    let entries = match receivers {
        None | Some(Value::Null) => return Ok(names),
        Some(Value::Sequence(entries)) => entries,
        Some(_) => return Err(ValidationError::new("receivers must be a list")),
    };

    for entry in entries {
        let name = entry
            .as_mapping()
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ValidationError::new("missing name in receiver"))?;
        if !names.insert(name.to_string()) {
            return Err(ValidationError::new(format!(
                "notification config name \"{name}\" is not unique"
            )));
        }
    }
    Ok(names)
}

fn check_route(route: &Mapping, receivers: &HashSet<String>) -> Result<(), ValidationError> {
    match route.get("receiver") {
        None | Some(Value::Null) => {}
        Some(Value::String(name)) => {
            if !receivers.contains(name) {
                return Err(ValidationError::new(format!(
                    "undefined receiver \"{name}\" used in route"
                )));
            }
        }
        Some(_) => return Err(ValidationError::new("route receiver must be a string")),
    }

    match route.get("routes") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Sequence(children)) => children.iter().try_for_each(|child| match child {
            Value::Mapping(child) => check_route(child, receivers),
            _ => Err(ValidationError::new("route entries must be mappings")),
        }),
        Some(_) => Err(ValidationError::new("routes must be a list")),
    }
}
