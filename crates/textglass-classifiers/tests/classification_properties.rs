//! Property tests for classification invariants
//!
//! - Classification is deterministic for a fixed domain
//! - A Strong pattern that validates always wins
//! - A child's own attribute values override inherited ones

use proptest::prelude::*;
use textglass_classifiers::{Document, Domain, DomainBuilder};

fn token_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["alpha", "beta", "gamma", "delta", "omega"]).prop_map(String::from)
}

fn input_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(token_strategy(), 0..8).prop_map(|tokens| tokens.join(" "))
}

fn domain() -> Domain {
    let pattern = Document::from_json(
        r#"{
            "specVersion": 1.0, "type": "pattern", "domain": "props", "domainVersion": "1.0",
            "inputParser": {"tokenSeperators": [" "], "ngramConcatSize": 2},
            "patternSet": {"defaultId": "unknown", "patterns": [
                {"patternId": "a", "patternType": "Simple", "patternTokens": ["alpha"], "rankType": "None", "rankValue": 900},
                {"patternId": "ab", "patternType": "SimpleAnd", "patternTokens": ["alpha", "beta"], "rankType": "Weak", "rankValue": 5},
                {"patternId": "gd", "patternType": "SimpleOrderedAnd", "patternTokens": ["gamma", "delta"], "rankType": "Weak", "rankValue": 5},
                {"patternId": "bg", "patternType": "Simple", "patternTokens": ["betagamma"], "rankType": "None", "rankValue": 10},
                {"patternId": "omega", "patternType": "Simple", "patternTokens": ["omega"], "rankType": "Strong"}
            ]}
        }"#,
    )
    .unwrap();

    let attribute = Document::from_json(
        r#"{
            "specVersion": 1.0, "type": "attribute", "domain": "props", "domainVersion": "1.0",
            "attributes": {
                "base": {"attributes": {"family": "greek", "shared": "parent"}},
                "a": {"parentId": "base", "attributes": {"shared": "child"}},
                "ab": {"parentId": "a"},
                "omega": {"parentId": "base", "attributes": {"last": "true"}}
            }
        }"#,
    )
    .unwrap();

    DomainBuilder::load(&pattern, None, Some(&attribute), None).unwrap()
}

proptest! {
    #[test]
    fn classification_is_deterministic(input in input_strategy()) {
        let domain = domain();
        let first = domain.classify(&input).unwrap();
        let second = domain.classify(&input).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn strong_pattern_always_wins(input in input_strategy()) {
        let domain = domain();
        let result = domain.classify(&input).unwrap().unwrap();

        if input.split(' ').any(|token| token == "omega") {
            prop_assert_eq!(result.get("patternId").map(String::as_str), Some("omega"));
            prop_assert_eq!(result.get("last").map(String::as_str), Some("true"));
        } else {
            prop_assert_ne!(result.get("patternId").map(String::as_str), Some("omega"));
        }
    }

    #[test]
    fn child_values_override_inherited(input in input_strategy()) {
        let domain = domain();
        let result = domain.classify(&input).unwrap().unwrap();

        match result.get("patternId").map(String::as_str) {
            Some("a") | Some("ab") => {
                prop_assert_eq!(result.get("shared").map(String::as_str), Some("child"));
                prop_assert_eq!(result.get("family").map(String::as_str), Some("greek"));
            }
            Some("omega") => {
                prop_assert_eq!(result.get("shared").map(String::as_str), Some("parent"));
            }
            _ => {}
        }
    }

    #[test]
    fn every_input_resolves_with_default(input in input_strategy()) {
        let domain = domain();
        prop_assert!(domain.classify(&input).unwrap().is_some());
    }
}
