//! Static trail checks against the live page.
//!
//! Problems are collected, never thrown, so a caller can show all of them at
//! once. Errors block use of the trail; warnings do not.

use crate::dom::Dom;
use crate::query::{find_element, is_element_visible};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use trail_common::Trail;

/// Single CSS-modules style class such as `.Button-root`.
static GENERATED_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.[A-Z][A-Za-z0-9]*-[a-z][A-Za-z0-9]*$").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    MissingTrailId,
    NoSteps,
    MissingStepId,
    MissingTarget,
    TargetNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationWarningKind {
    HiddenTarget,
    UnstableSelector,
    DuplicateStepId,
    /// Optional steps are skipped at playback, so this is not an error.
    OptionalTargetNotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
    pub kind: ValidationWarningKind,
    pub step_index: usize,
    pub step_id: String,
    pub message: String,
}

pub fn validate_trail<D: Dom + ?Sized>(dom: &D, trail: &Trail) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if trail.id.trim().is_empty() {
        errors.push(ValidationError {
            kind: ValidationErrorKind::MissingTrailId,
            step_index: None,
            step_id: None,
            message: "Trail is missing an id".to_string(),
        });
    }

    if trail.steps.is_empty() {
        errors.push(ValidationError {
            kind: ValidationErrorKind::NoSteps,
            step_index: None,
            step_id: None,
            message: "Trail has no steps".to_string(),
        });
        return ValidationResult {
            valid: false,
            errors,
            warnings,
        };
    }

    let mut seen_ids = HashSet::new();

    for (index, step) in trail.steps.iter().enumerate() {
        let step_id = (!step.id.is_empty()).then(|| step.id.clone());
        let error = |kind, message: String| ValidationError {
            kind,
            step_index: Some(index),
            step_id: step_id.clone(),
            message,
        };
        let warning = |kind, message: String| ValidationWarning {
            kind,
            step_index: index,
            step_id: step.id.clone(),
            message,
        };

        if step.id.trim().is_empty() {
            errors.push(error(
                ValidationErrorKind::MissingStepId,
                format!("Step {} is missing an id", index + 1),
            ));
        } else if !seen_ids.insert(step.id.as_str()) {
            warnings.push(warning(
                ValidationWarningKind::DuplicateStepId,
                format!("Step id '{}' is used more than once", step.id),
            ));
        }

        let target = step.target.trim();
        if target.is_empty() {
            errors.push(error(
                ValidationErrorKind::MissingTarget,
                format!("Step {} is missing a target selector", index + 1),
            ));
            continue;
        }

        match find_element(dom, target) {
            None if step.optional => warnings.push(warning(
                ValidationWarningKind::OptionalTargetNotFound,
                format!("Optional step target '{}' is not on the page", target),
            )),
            None => errors.push(error(
                ValidationErrorKind::TargetNotFound,
                format!("Target '{}' does not match any element", target),
            )),
            Some(node) if !is_element_visible(dom, node) => warnings.push(warning(
                ValidationWarningKind::HiddenTarget,
                format!("Target '{}' exists but is not currently visible", target),
            )),
            Some(_) => {}
        }

        if let Some(reason) = selector_fragility(target) {
            warnings.push(warning(
                ValidationWarningKind::UnstableSelector,
                format!("Selector '{}' {}", target, reason),
            ));
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Why a selector is likely to break when the page changes, if it is.
///
/// Id and data-attribute selectors are always considered stable.
pub fn selector_fragility(selector: &str) -> Option<&'static str> {
    let selector = selector.trim();
    if selector.starts_with('#') || selector.starts_with("[data-") {
        return None;
    }
    if selector.contains(":nth-child") || selector.contains(":nth-of-type") {
        return Some("depends on element position");
    }
    if GENERATED_CLASS.is_match(selector) {
        return Some("looks like a generated, module-scoped class");
    }
    None
}
