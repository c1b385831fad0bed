//! Verification decision engine
//!
//! Turns ranked classifier output into an accept/reject verdict. The
//! label model is a general-purpose object recognizer, not a hive
//! detector, so keyword matching over its closest semantic labels
//! approximates domain detection.
//!
//! Rules are an ordered list evaluated first-match-wins:
//! negative-override, positive-match, generic-insect, then a terminal
//! catch-all reject. Ties within a tier resolve to the first matching
//! label in ranked order.

use hivewatch_common::models::Prediction;
use serde::Deserialize;

/// Tunable decision policy.
///
/// Thresholds are comparison bounds, not calibrated values; all of
/// them can be overridden from the `[verification]` section of the
/// server config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DecisionPolicy {
    /// Accept a positive keyword match strictly above this confidence
    pub accept_threshold: u8,
    /// Accept a generic insect top label strictly above this confidence
    pub insect_threshold: u8,
    /// Confidence floor applied to unambiguous evidence labels
    pub unambiguous_floor: u8,
    /// Hive/bee/apiary/wasp-family terms
    pub positive_keywords: Vec<String>,
    /// Devices, humans, unrelated insects, reflective artifacts
    pub negative_keywords: Vec<String>,
    /// Positive labels treated as conclusive regardless of the raw
    /// model probability
    pub unambiguous_keywords: Vec<String>,
    /// Generic terms accepted tentatively from the top prediction
    pub generic_insect_keywords: Vec<String>,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        DecisionPolicy {
            accept_threshold: 35,
            insect_threshold: 50,
            unambiguous_floor: 95,
            positive_keywords: strings(&["honeycomb", "bee", "apiary", "hive", "wasp", "hornet"]),
            negative_keywords: strings(&[
                "cellular telephone",
                "hand-held computer",
                "mirror",
                "wig",
                "mask",
                "sunglass",
                "monitor",
                "screen",
                "person",
                "groom",
                "jersey",
                "pajama",
                "ant",
                "fly",
                "spider",
                "cockroach",
            ]),
            unambiguous_keywords: strings(&["honeycomb", "apiary"]),
            generic_insect_keywords: strings(&["insect", "invertebrate"]),
        }
    }
}

/// Outcome of one verification attempt.
///
/// Ephemeral: an accept feeds the subsequent report, a reject is
/// discarded when the user retries with a new image.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub is_honeybee: bool,
    /// 0-100
    pub confidence: u8,
    /// Human-readable rationale lines
    pub labels: Vec<String>,
}

impl Verdict {
    fn reject(confidence: u8, rationale: String) -> Self {
        Verdict {
            is_honeybee: false,
            confidence,
            labels: vec![rationale],
        }
    }
}

type Rule = fn(&DecisionPolicy, &[Prediction]) -> Option<Verdict>;

/// Ordered rule list; the first rule producing a verdict wins.
const RULES: &[(&str, Rule)] = &[
    ("negative-override", negative_override),
    ("positive-match", positive_match),
    ("generic-insect", generic_insect),
];

/// Evaluate the rule list over ranked predictions.
///
/// An empty prediction list falls through every rule and lands in the
/// terminal reject.
pub fn decide(policy: &DecisionPolicy, predictions: &[Prediction]) -> Verdict {
    for (name, rule) in RULES {
        if let Some(verdict) = rule(policy, predictions) {
            tracing::debug!(
                rule = name,
                accepted = verdict.is_honeybee,
                confidence = verdict.confidence,
                "verification rule matched"
            );
            return verdict;
        }
    }
    unrecognized(predictions)
}

fn matches_any(label: &str, keywords: &[String]) -> bool {
    let label = label.to_lowercase();
    keywords.iter().any(|k| label.contains(k.as_str()))
}

fn first_match<'a>(predictions: &'a [Prediction], keywords: &[String]) -> Option<&'a Prediction> {
    predictions.iter().find(|p| matches_any(&p.label, keywords))
}

/// Probability scaled to a 0-100 integer
fn scaled(probability: f32) -> u8 {
    (probability * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Negative evidence with no positive evidence anywhere: hard reject.
fn negative_override(policy: &DecisionPolicy, predictions: &[Prediction]) -> Option<Verdict> {
    let rejection = first_match(predictions, &policy.negative_keywords)?;
    if first_match(predictions, &policy.positive_keywords).is_some() {
        return None;
    }
    Some(Verdict::reject(
        0,
        format!("Rejected: identified as {}", rejection.label),
    ))
}

/// First ranked positive-keyword label decides, with a confidence
/// floor for labels that are conclusive on their own.
fn positive_match(policy: &DecisionPolicy, predictions: &[Prediction]) -> Option<Verdict> {
    let matched = first_match(predictions, &policy.positive_keywords)?;
    let mut confidence = scaled(matched.probability);
    if matches_any(&matched.label, &policy.unambiguous_keywords) {
        confidence = confidence.max(policy.unambiguous_floor);
    }
    let is_honeybee = confidence > policy.accept_threshold;
    let rationale = if is_honeybee {
        format!("Rock bee colony detected ({})", matched.label)
    } else {
        format!("Weak colony match: {}", matched.label)
    };
    Some(Verdict {
        is_honeybee,
        confidence,
        labels: vec![rationale],
    })
}

/// No keyword matched anywhere: a generic insect top label is still
/// accepted tentatively when the model is confident enough. Below the
/// bar the probability-derived confidence is preserved in the reject.
fn generic_insect(policy: &DecisionPolicy, predictions: &[Prediction]) -> Option<Verdict> {
    let top = predictions.first()?;
    if !matches_any(&top.label, &policy.generic_insect_keywords) {
        return None;
    }
    let confidence = scaled(top.probability);
    if confidence > policy.insect_threshold {
        Some(Verdict {
            is_honeybee: true,
            confidence,
            labels: vec![
                format!("Potential insect: {}", top.label),
                "High-confidence insect match".to_string(),
            ],
        })
    } else {
        Some(Verdict::reject(
            confidence,
            format!("Potential insect: {}", top.label),
        ))
    }
}

/// Terminal rule: nothing recognizable, reject outright.
fn unrecognized(predictions: &[Prediction]) -> Verdict {
    match predictions.first() {
        Some(top) => Verdict::reject(0, format!("Identified: {} (not a hive)", top.label)),
        None => Verdict::reject(0, "No recognizable subject in image".to_string()),
    }
}
