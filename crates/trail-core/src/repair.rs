//! Selector repair.
//!
//! When a recorded selector stops resolving, its text is the only record of
//! what the element looked like. [`SelectorContext`] recovers that
//! fingerprint from the string, [`RepairEngine`] ranks the live elements
//! against it and re-derives a selector for the best few with
//! [`SelectorGenerator`].
//!
//! Ranking score and confidence are separate numbers. The score only orders
//! candidates; the confidence is what a user sees next to a suggestion.

use crate::config::SimilarityWeights;
use crate::dom::selector::unescape;
use crate::dom::{Dom, NodeId};
use crate::generator::SelectorGenerator;
use crate::query::{collapse_whitespace, normalized_text};
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[\s*([A-Za-z_][\w-]*)\s*[~|^$*]?=\s*(?:"([^"]*)"|'([^']*)'|([^\]\s]+))\s*\]"#)
        .unwrap()
});
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]|\([^)]*\)").unwrap());
// A hex escape may be closed by one space, which belongs to the identifier.
static ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#((?:[\w-]|\\[0-9a-fA-F]{1,6} ?|\\.)+)").unwrap());
static CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.((?:[\w-]|\\[0-9a-fA-F]{1,6} ?|\\.)+)").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Za-z][\w-]*)").unwrap());

/// Structural fingerprint of the element a selector used to address.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectorContext {
    pub tag: Option<String>,
    pub id: Option<String>,
    /// `[data-*="value"]` pairs. Other attributes (`type`, `name`, `role`)
    /// are shared by too many elements to identify one.
    pub attributes: BTreeMap<String, String>,
    pub classes: Vec<String>,
    pub aria_label: Option<String>,
    /// Text the element was known to show, if the caller recorded it.
    pub text: Option<String>,
}

impl SelectorContext {
    /// Read the fingerprint out of the selector string alone.
    ///
    /// Only the rightmost compound of the first selector in a list describes
    /// the target; ancestors and siblings are ignored.
    pub fn from_selector(selector: &str) -> Self {
        let compound = target_compound(selector);
        let mut context = SelectorContext::default();

        for caps in ATTRIBUTE.captures_iter(compound) {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            match name.as_str() {
                "id" => context.id = Some(value),
                "class" => context
                    .classes
                    .extend(value.split_whitespace().map(str::to_string)),
                "aria-label" => context.aria_label = Some(value),
                _ if name.starts_with("data-") => {
                    context.attributes.insert(name, value);
                }
                _ => {}
            }
        }

        let bare = BRACKETED.replace_all(compound, "");
        if context.id.is_none() {
            context.id = ID.captures(&bare).map(|caps| unescape(&caps[1]));
        }
        for caps in CLASS.captures_iter(&bare) {
            let class = unescape(&caps[1]);
            if !context.classes.contains(&class) {
                context.classes.push(class);
            }
        }
        context.tag = TAG.captures(&bare).map(|caps| caps[1].to_ascii_lowercase());

        context
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = collapse_whitespace(&text.into());
        self.text = (!text.is_empty()).then_some(text);
        self
    }

    /// No recoverable feature at all: every candidate would score zero.
    pub fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.attributes.is_empty()
            && self.classes.is_empty()
            && self.aria_label.is_none()
            && self.text.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextMatch {
    None,
    Partial,
    Exact,
}

/// What a candidate has in common with the context.
#[derive(Debug, Clone)]
struct Overlap {
    same_tag: bool,
    same_id: bool,
    /// Matching data attribute names.
    attributes: Vec<String>,
    aria_label: bool,
    classes_matched: usize,
    classes_total: usize,
    text: TextMatch,
}

impl Overlap {
    fn measure<D: Dom + ?Sized>(dom: &D, context: &SelectorContext, node: NodeId) -> Self {
        let same_tag = match &context.tag {
            Some(tag) => dom.tag_name(node).as_deref() == Some(tag.as_str()),
            None => false,
        };

        let same_id = match &context.id {
            Some(id) => dom.attribute(node, "id").as_deref() == Some(id.as_str()),
            None => false,
        };
        let mut attributes = Vec::new();
        for (name, value) in &context.attributes {
            if dom.attribute(node, name).as_deref() == Some(value.as_str()) {
                attributes.push(name.clone());
            }
        }

        let aria_label = match &context.aria_label {
            Some(label) => dom.attribute(node, "aria-label").as_deref() == Some(label.as_str()),
            None => false,
        };

        let classes = dom.class_list(node);
        let classes_matched = context
            .classes
            .iter()
            .filter(|c| classes.contains(c))
            .count();

        let text = match &context.text {
            Some(expected) => text_match(&normalized_text(dom, node), expected),
            None => TextMatch::None,
        };

        Self {
            same_tag,
            same_id,
            attributes,
            aria_label,
            classes_matched,
            classes_total: context.classes.len(),
            text,
        }
    }

    fn class_fraction(&self) -> f32 {
        if self.classes_total == 0 {
            0.0
        } else {
            self.classes_matched as f32 / self.classes_total as f32
        }
    }

    fn score(&self, weights: &SimilarityWeights) -> f32 {
        let matched = self.attributes.len() + usize::from(self.same_id);
        let mut score = weights.rank_attribute * matched as f32;
        if self.aria_label {
            score += weights.rank_aria_label;
        }
        score += weights.rank_classes * self.class_fraction();
        score += match self.text {
            TextMatch::Exact => weights.rank_text_exact,
            TextMatch::Partial => weights.rank_text_partial,
            TextMatch::None => 0.0,
        };
        score
    }

    fn confidence(&self, weights: &SimilarityWeights) -> f32 {
        let mut confidence = weights.confidence_base;
        if self.same_tag {
            confidence += weights.confidence_tag;
        }
        confidence += weights.confidence_attribute * self.attributes.len() as f32;
        if self.aria_label {
            confidence += weights.confidence_aria_label;
        }
        confidence += weights.confidence_classes * self.class_fraction();
        confidence.min(1.0)
    }

    fn reason(&self) -> String {
        let mut parts: Vec<String> = self
            .same_id
            .then_some("id")
            .into_iter()
            .chain(self.attributes.iter().map(String::as_str))
            .map(|name| format!("matching {}", name))
            .collect();
        if self.aria_label {
            parts.push("same aria-label".to_string());
        }
        if self.classes_matched > 0 {
            parts.push(format!(
                "{}/{} classes",
                self.classes_matched, self.classes_total
            ));
        }
        match self.text {
            TextMatch::Exact => parts.push("same text".to_string()),
            TextMatch::Partial => parts.push("similar text".to_string()),
            TextMatch::None => {}
        }
        if self.same_tag {
            parts.push("same tag".to_string());
        }
        if parts.is_empty() {
            "structural match".to_string()
        } else {
            parts.join(", ")
        }
    }
}

fn text_match(candidate: &str, expected: &str) -> TextMatch {
    let candidate = candidate.to_lowercase();
    let expected = expected.to_lowercase();
    if candidate.is_empty() || expected.is_empty() {
        TextMatch::None
    } else if candidate == expected {
        TextMatch::Exact
    } else if candidate.contains(&expected) || expected.contains(&candidate) {
        TextMatch::Partial
    } else {
        TextMatch::None
    }
}

/// A ranked element, before a selector is derived for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub node: NodeId,
    pub score: f32,
    pub confidence: f32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorSuggestion {
    pub selector: String,
    pub confidence: f32,
    pub reason: String,
    #[serde(rename = "candidateElement")]
    pub element: NodeId,
}

pub struct RepairEngine;

impl RepairEngine {
    /// Rank every plausible element against `context`, best first.
    ///
    /// Candidates are all elements of the context tag, or every element when
    /// no tag was recovered. Ties fall back to text similarity, then to
    /// document order.
    pub fn rank<D: Dom + ?Sized>(
        dom: &D,
        context: &SelectorContext,
        weights: &SimilarityWeights,
    ) -> Vec<ScoredCandidate> {
        let mut ranked: Vec<(ScoredCandidate, f64)> = dom
            .elements_by_tag(context.tag.as_deref())
            .into_iter()
            .filter_map(|node| {
                let overlap = Overlap::measure(dom, context, node);
                let score = overlap.score(weights);
                if score <= weights.min_score {
                    return None;
                }
                let similarity = context
                    .text
                    .as_deref()
                    .map(|expected| {
                        strsim::normalized_levenshtein(
                            &normalized_text(dom, node).to_lowercase(),
                            &expected.to_lowercase(),
                        )
                    })
                    .unwrap_or(0.0);
                Some((
                    ScoredCandidate {
                        node,
                        score,
                        confidence: overlap.confidence(weights),
                        reason: overlap.reason(),
                    },
                    similarity,
                ))
            })
            .collect();

        ranked.sort_by(|(a, a_sim), (b, b_sim)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b_sim.partial_cmp(a_sim).unwrap_or(Ordering::Equal))
        });

        ranked.into_iter().map(|(candidate, _)| candidate).collect()
    }

    /// Up to `weights.max_suggestions` replacement selectors for `broken`.
    pub fn suggest<D: Dom + ?Sized>(
        dom: &D,
        broken: &str,
        expected_text: Option<&str>,
        weights: &SimilarityWeights,
    ) -> Vec<SelectorSuggestion> {
        let mut context = SelectorContext::from_selector(broken);
        if let Some(text) = expected_text {
            context = context.with_text(text);
        }
        if context.is_empty() {
            debug!("No fingerprint recoverable from selector '{}'", broken);
            return Vec::new();
        }

        let broken = broken.trim();
        let suggestions: Vec<SelectorSuggestion> = Self::rank(dom, &context, weights)
            .into_iter()
            .filter_map(|candidate| {
                let generated = SelectorGenerator::generate(dom, candidate.node)?;
                (generated.selector != broken).then(|| SelectorSuggestion {
                    selector: generated.selector,
                    confidence: candidate.confidence,
                    reason: candidate.reason,
                    element: candidate.node,
                })
            })
            .take(weights.max_suggestions)
            .collect();

        debug!(
            "Repair of '{}' produced {} suggestion(s)",
            broken,
            suggestions.len()
        );
        suggestions
    }
}

/// Suggestions for `broken` with the default weights.
pub fn suggest_repairs<D: Dom + ?Sized>(dom: &D, broken: &str) -> Vec<SelectorSuggestion> {
    RepairEngine::suggest(dom, broken, None, &SimilarityWeights::default())
}

/// The compound that addresses the target itself: rightmost, first list entry.
fn target_compound(selector: &str) -> &str {
    let selector = selector.trim();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    // Hex digits read so far in an open `\XX` escape
    let mut hex_digits: Option<usize> = None;
    let mut start = 0;
    let mut end = selector.len();

    for (i, c) in selector.char_indices() {
        if escaped {
            escaped = false;
            if c.is_ascii_hexdigit() {
                hex_digits = Some(1);
            }
            continue;
        }
        if let Some(n) = hex_digits {
            if c.is_ascii_hexdigit() && n < 6 {
                hex_digits = Some(n + 1);
                continue;
            }
            hex_digits = None;
            if c == ' ' {
                continue;
            }
        }
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' | '\'' => quote = Some(c),
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            ',' if depth == 0 => {
                end = i;
                break;
            }
            c if depth == 0 && (c.is_whitespace() || matches!(c, '>' | '+' | '~')) => {
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }

    let compound = selector[start.min(end)..end].trim();
    if compound.is_empty() {
        selector[..end].trim()
    } else {
        compound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_compound() {
        assert_eq!(target_compound("#form > button.save"), "button.save");
        assert_eq!(target_compound("nav a, footer a.home"), "a");
        assert_eq!(
            target_compound(r#"div [aria-label="Close dialog"]"#),
            r#"[aria-label="Close dialog"]"#
        );
        assert_eq!(target_compound("li:nth-child(2 )"), "li:nth-child(2 )");
        assert_eq!(target_compound(r"main #\31 23"), r"#\31 23");
        assert_eq!(target_compound(r"#\31  button"), "button");
    }

    #[test]
    fn test_text_match() {
        assert_eq!(text_match("Save", "save"), TextMatch::Exact);
        assert_eq!(text_match("Save draft", "save"), TextMatch::Partial);
        assert_eq!(text_match("Cancel", "save"), TextMatch::None);
        assert_eq!(text_match("", "save"), TextMatch::None);
    }
}
