//! Coercion of arbitrary model JSON onto the report schema
//!
//! Lookups are driven by [`FIELD_ALIASES`]: keys are compared after folding
//! (lowercase, alphanumerics only), so `viability_score`, `ViabilityScore` and
//! `viabilityscore` all match. Normalization never fails; anything missing or
//! unusable degrades to the documented default.

use serde_json::{Map, Value};

use crate::model::{Competitor, ReportFields, Verdict};

/// How many single-key wrapper objects are unwrapped before giving up
const MAX_WRAPPER_DEPTH: usize = 8;

pub const DEFAULT_TAKEAWAY: &str = "No takeaway was provided.";
pub const DEFAULT_MARKET_REALITY: &str = "Market analysis is unavailable.";
pub const DEFAULT_PRO: &str = "No clear strengths were identified.";
pub const DEFAULT_CON: &str = "No clear weaknesses were identified.";
pub const DEFAULT_MONETIZATION: &str = "No monetization strategy was suggested.";
pub const DEFAULT_WHY_PEOPLE_PAY: &str = "Not specified.";
pub const DEFAULT_NEXT_STEP: &str = "Refine the idea description and run the analysis again.";
pub const DEFAULT_VIABILITY_SCORE: u8 = 50;

/// Canonical report content fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportField {
    SummaryVerdict,
    OneLineTakeaway,
    MarketReality,
    Pros,
    Cons,
    Competitors,
    MonetizationStrategies,
    WhyPeoplePay,
    ViabilityScore,
    NextSteps,
}

impl ReportField {
    pub fn canonical_name(&self) -> &'static str {
        match self {
            ReportField::SummaryVerdict => "summaryVerdict",
            ReportField::OneLineTakeaway => "oneLineTakeaway",
            ReportField::MarketReality => "marketReality",
            ReportField::Pros => "pros",
            ReportField::Cons => "cons",
            ReportField::Competitors => "competitors",
            ReportField::MonetizationStrategies => "monetizationStrategies",
            ReportField::WhyPeoplePay => "whyPeoplePay",
            ReportField::ViabilityScore => "viabilityScore",
            ReportField::NextSteps => "nextSteps",
        }
    }

    /// Accepted key spellings in folded form, most specific first
    pub fn aliases(&self) -> &'static [&'static str] {
        FIELD_ALIASES
            .iter()
            .find(|(field, _)| field == self)
            .map(|(_, aliases)| *aliases)
            .unwrap_or_default()
    }
}

/// Alias table, consulted in order; every entry starts with the folded canonical name
pub const FIELD_ALIASES: &[(ReportField, &[&str])] = &[
    (
        ReportField::SummaryVerdict,
        &["summaryverdict", "verdict", "overallverdict", "recommendation"],
    ),
    (
        ReportField::OneLineTakeaway,
        &["onelinetakeaway", "takeaway", "oneliner", "tldr", "summary"],
    ),
    (
        ReportField::MarketReality,
        &["marketreality", "marketanalysis", "marketoverview", "market"],
    ),
    (ReportField::Pros, &["pros", "strengths", "advantages"]),
    (ReportField::Cons, &["cons", "weaknesses", "disadvantages", "risks"]),
    (
        ReportField::Competitors,
        &["competitors", "competition", "competitivelandscape", "alternatives"],
    ),
    (
        ReportField::MonetizationStrategies,
        &[
            "monetizationstrategies",
            "monetization",
            "revenuestreams",
            "revenuemodel",
            "businessmodel",
        ],
    ),
    (
        ReportField::WhyPeoplePay,
        &["whypeoplepay", "willingnesstopay", "valueproposition", "whypay"],
    ),
    (
        ReportField::ViabilityScore,
        &["viabilityscore", "score", "viability"],
    ),
    (
        ReportField::NextSteps,
        &["nextsteps", "actionitems", "steps", "recommendations"],
    ),
];

const COMPETITOR_NAME_ALIASES: &[&str] = &["name", "competitor", "company", "product", "title"];
const COMPETITOR_DIFF_ALIASES: &[&str] = &[
    "differentiation",
    "differentiator",
    "difference",
    "howyoudiffer",
    "description",
    "notes",
];

/// Map any JSON value onto fully populated report fields
pub fn normalize_fields(value: &Value) -> ReportFields {
    let empty = Map::new();
    let root = match value {
        Value::Object(map) => unwrap_root(map),
        _ => {
            tracing::debug!("Model output is not an object, using defaults for every field");
            &empty
        }
    };

    let text = |field: ReportField, default: &str| {
        lookup(root, field.aliases())
            .and_then(value_to_text)
            .unwrap_or_else(|| default.to_string())
    };
    let list = |field: ReportField, default: &str| {
        lookup(root, field.aliases())
            .and_then(value_to_list)
            .unwrap_or_else(|| vec![default.to_string()])
    };

    ReportFields {
        summary_verdict: lookup(root, ReportField::SummaryVerdict.aliases())
            .and_then(Value::as_str)
            .map(Verdict::parse_lenient)
            .unwrap_or_default(),
        one_line_takeaway: text(ReportField::OneLineTakeaway, DEFAULT_TAKEAWAY),
        market_reality: text(ReportField::MarketReality, DEFAULT_MARKET_REALITY),
        pros: list(ReportField::Pros, DEFAULT_PRO),
        cons: list(ReportField::Cons, DEFAULT_CON),
        competitors: lookup(root, ReportField::Competitors.aliases())
            .map(value_to_competitors)
            .unwrap_or_default(),
        monetization_strategies: list(ReportField::MonetizationStrategies, DEFAULT_MONETIZATION),
        why_people_pay: text(ReportField::WhyPeoplePay, DEFAULT_WHY_PEOPLE_PAY),
        viability_score: lookup(root, ReportField::ViabilityScore.aliases())
            .map(value_to_score)
            .unwrap_or(DEFAULT_VIABILITY_SCORE),
        next_steps: list(ReportField::NextSteps, DEFAULT_NEXT_STEP),
    }
}

/// Lowercase and drop everything but letters and digits
pub fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// First alias whose key is present with a usable (non-null, non-blank) value
pub fn lookup<'a>(object: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| {
        object
            .iter()
            .filter(|(key, _)| fold_key(key) == *alias)
            .map(|(_, value)| value)
            .find(|value| is_present(value))
    })
}

fn has_key(object: &Map<String, Value>, aliases: &[&str]) -> bool {
    object
        .keys()
        .any(|key| aliases.iter().any(|alias| fold_key(key) == *alias))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Descend through wrapper objects such as `{"report": {...}}`
fn unwrap_root(mut object: &Map<String, Value>) -> &Map<String, Value> {
    for _ in 0..MAX_WRAPPER_DEPTH {
        // Any recognised field at this level means this is the report itself
        if FIELD_ALIASES
            .iter()
            .any(|(_, aliases)| has_key(object, aliases))
        {
            break;
        }

        let mut nested = object.values().filter_map(Value::as_object);
        match (nested.next(), nested.next()) {
            (Some(inner), None) => {
                tracing::debug!("Descending into single nested wrapper object");
                object = inner;
            }
            _ => break,
        }
    }
    object
}

fn value_to_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(item_to_text)
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(_) => item_to_text(value)?,
    };
    (!text.is_empty()).then_some(text)
}

fn item_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            let parts: Vec<String> = map
                .values()
                .filter_map(|v| match v {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect();
            if parts.is_empty() {
                Some(value.to_string())
            } else {
                Some(parts.join(": "))
            }
        }
        Value::Array(_) => value_to_text(value),
        other => value_to_text(other),
    }
}

fn value_to_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(item_to_text).collect()),
        scalar => value_to_text(scalar).map(|text| vec![text]),
    }
}

fn value_to_competitors(value: &Value) -> Vec<Competitor> {
    match value {
        Value::Array(items) => items.iter().filter_map(competitor_from_item).collect(),
        Value::Object(map) if has_key(map, COMPETITOR_NAME_ALIASES) => {
            competitor_from_item(value).into_iter().collect()
        }
        // {"Uber Eats": "focuses on restaurants", ...}
        Value::Object(map) => map
            .iter()
            .map(|(name, detail)| Competitor {
                name: name.clone(),
                differentiation: value_to_text(detail).unwrap_or_default(),
            })
            .collect(),
        scalar => competitor_from_item(scalar).into_iter().collect(),
    }
}

fn competitor_from_item(value: &Value) -> Option<Competitor> {
    match value {
        Value::Object(map) => {
            let name = lookup(map, COMPETITOR_NAME_ALIASES).and_then(value_to_text)?;
            let differentiation = lookup(map, COMPETITOR_DIFF_ALIASES)
                .and_then(value_to_text)
                .unwrap_or_default();
            Some(Competitor {
                name,
                differentiation,
            })
        }
        other => value_to_text(other).map(|name| Competitor {
            name,
            differentiation: String::new(),
        }),
    }
}

fn value_to_score(value: &Value) -> u8 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_score_text(s),
        _ => None,
    };

    match parsed {
        Some(score) if score.is_finite() => score.round().clamp(0.0, 100.0) as u8,
        _ => DEFAULT_VIABILITY_SCORE,
    }
}

/// Accepts "72", "72%", "72/100"
fn parse_score_text(raw: &str) -> Option<f64> {
    let number = raw.trim().split('/').next()?.trim().trim_end_matches('%');
    number.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_complete(fields: &ReportFields) {
        assert!(!fields.one_line_takeaway.is_empty());
        assert!(!fields.market_reality.is_empty());
        assert!(!fields.why_people_pay.is_empty());
        assert!(!fields.pros.is_empty());
        assert!(!fields.cons.is_empty());
        assert!(!fields.monetization_strategies.is_empty());
        assert!(!fields.next_steps.is_empty());
        assert!(fields.viability_score <= 100);
    }

    #[test]
    fn test_alias_table_starts_with_canonical_names() {
        for (field, aliases) in FIELD_ALIASES {
            assert_eq!(aliases[0], fold_key(field.canonical_name()));
            for alias in *aliases {
                assert_eq!(*alias, fold_key(alias), "alias {} is not folded", alias);
            }
        }
        assert_eq!(FIELD_ALIASES.len(), 10);
    }

    #[test]
    fn test_totality_on_degenerate_inputs() {
        let inputs = [
            json!({}),
            Value::Null,
            json!([]),
            json!("just text"),
            json!(42),
            json!({"a": {"b": {"c": {"d": {}}}}}),
        ];
        for input in inputs {
            let fields = normalize_fields(&input);
            assert_complete(&fields);
            assert_eq!(fields.summary_verdict, Verdict::Unknown);
            assert_eq!(fields.viability_score, DEFAULT_VIABILITY_SCORE);
        }
    }

    #[test]
    fn test_defaults_are_documented_placeholders() {
        let fields = normalize_fields(&json!({}));
        assert_eq!(fields.pros, vec![DEFAULT_PRO.to_string()]);
        assert_eq!(fields.one_line_takeaway, DEFAULT_TAKEAWAY);
        assert!(fields.competitors.is_empty());
    }

    #[test]
    fn test_scenario_score_string_and_scalar_pros() {
        let fields = normalize_fields(&json!({
            "summaryVerdict": "Promising",
            "viabilityScore": "72",
            "pros": "great idea"
        }));
        assert_eq!(fields.viability_score, 72);
        assert_eq!(fields.pros, vec!["great idea".to_string()]);
        assert_eq!(fields.summary_verdict, Verdict::Promising);
    }

    #[test]
    fn test_verdict_normalization() {
        for raw in ["promising", "PROMISING", "Promising"] {
            let fields = normalize_fields(&json!({ "summaryVerdict": raw }));
            assert_eq!(fields.summary_verdict, Verdict::Promising);
        }
        let fields = normalize_fields(&json!({ "summaryVerdict": "maybe" }));
        assert_eq!(fields.summary_verdict, Verdict::Unknown);
    }

    #[test]
    fn test_descends_into_wrapper() {
        let fields = normalize_fields(&json!({
            "report": {
                "oneLineTakeaway": "X",
                "summaryVerdict": "Risky",
                "cons": ["crowded market"]
            }
        }));
        assert_eq!(fields.one_line_takeaway, "X");
        assert_eq!(fields.summary_verdict, Verdict::Risky);
        assert_eq!(fields.cons, vec!["crowded market".to_string()]);
    }

    #[test]
    fn test_descends_through_multiple_wrappers() {
        let fields = normalize_fields(&json!({
            "data": { "analysis": { "verdict": "needs_refinement", "score": 33 } }
        }));
        assert_eq!(fields.summary_verdict, Verdict::NeedsRefinement);
        assert_eq!(fields.viability_score, 33);
    }

    #[test]
    fn test_does_not_descend_when_ambiguous() {
        let fields = normalize_fields(&json!({
            "first": { "summaryVerdict": "Risky" },
            "second": { "summaryVerdict": "Promising" }
        }));
        assert_eq!(fields.summary_verdict, Verdict::Unknown);
    }

    #[test]
    fn test_object_valued_field_keeps_siblings() {
        let fields = normalize_fields(&json!({
            "viabilityScore": 80,
            "pros": ["fast"],
            "marketReality": "Growing",
            "competitors": {"Uber Eats": "restaurant focus"}
        }));
        assert_eq!(fields.viability_score, 80);
        assert_eq!(fields.pros, vec!["fast".to_string()]);
        assert_eq!(fields.market_reality, "Growing");
        assert_eq!(fields.competitors.len(), 1);
        assert_eq!(fields.competitors[0].name, "Uber Eats");

        let nested_market = normalize_fields(&json!({
            "score": 61,
            "marketReality": {"size": "Large", "trend": "Growing"}
        }));
        assert_eq!(nested_market.viability_score, 61);
        assert!(nested_market.market_reality.contains("Large"));
    }

    #[test]
    fn test_case_insensitive_aliases() {
        let fields = normalize_fields(&json!({
            "VIABILITY_SCORE": 88.6,
            "Strengths": ["fast"],
            "next_steps": "interview chefs",
            "Market Analysis": "Growing demand"
        }));
        assert_eq!(fields.viability_score, 89);
        assert_eq!(fields.pros, vec!["fast".to_string()]);
        assert_eq!(fields.next_steps, vec!["interview chefs".to_string()]);
        assert_eq!(fields.market_reality, "Growing demand");
    }

    #[test]
    fn test_blank_values_fall_through_to_next_alias() {
        let fields = normalize_fields(&json!({
            "oneLineTakeaway": "  ",
            "takeaway": "Solid niche",
            "pros": null
        }));
        assert_eq!(fields.one_line_takeaway, "Solid niche");
        assert_eq!(fields.pros, vec![DEFAULT_PRO.to_string()]);
    }

    #[test]
    fn test_score_parsing() {
        let cases = [
            (json!("72%"), 72),
            (json!("65/100"), 65),
            (json!(150), 100),
            (json!(-4), 0),
            (json!("high"), DEFAULT_VIABILITY_SCORE),
            (json!(true), DEFAULT_VIABILITY_SCORE),
        ];
        for (raw, expected) in cases {
            let fields = normalize_fields(&json!({ "viabilityScore": raw }));
            assert_eq!(fields.viability_score, expected, "raw: {}", raw);
        }
    }

    #[test]
    fn test_competitor_shapes() {
        let fields = normalize_fields(&json!({
            "competitors": [
                {"name": "Uber Eats", "differentiation": "restaurant focus"},
                {"Company": "Cookunity", "description": "meal kits"},
                "Thumbtack",
                {"noName": true}
            ]
        }));
        assert_eq!(fields.competitors.len(), 3);
        assert_eq!(fields.competitors[0].name, "Uber Eats");
        assert_eq!(fields.competitors[1].differentiation, "meal kits");
        assert_eq!(fields.competitors[2].name, "Thumbtack");
        assert!(fields.competitors[2].differentiation.is_empty());

        let mapped = normalize_fields(&json!({
            "competition": {"Uber Eats": "restaurant focus"}
        }));
        assert_eq!(mapped.competitors.len(), 1);
        assert_eq!(mapped.competitors[0].differentiation, "restaurant focus");
    }

    #[test]
    fn test_list_items_from_objects() {
        let fields = normalize_fields(&json!({
            "monetization": [{"strategy": "Subscription", "detail": "monthly"}, 5]
        }));
        assert_eq!(fields.monetization_strategies.len(), 2);
        assert!(fields.monetization_strategies[0].contains("Subscription"));
        assert_eq!(fields.monetization_strategies[1], "5");
    }
}
