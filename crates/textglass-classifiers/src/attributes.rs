//! Attribute sets and inheritance-aware resolution
//!
//! Each pattern id may own one [`AttributeSet`]: static key/value pairs, an
//! optional parent pattern id, and attribute transformers that compute values
//! from the raw classification input. Resolution layers the parent chain under
//! the child so that a child's keys are never overwritten by an ancestor.

use crate::transformer::TransformerPipeline;
use indexmap::{IndexMap, IndexSet};
use std::borrow::Cow;
use textglass_core::{AttributeMap, Error, Result, ERROR_SUFFIX, PATTERN_ID_KEY};

/// Computes one dynamic attribute value from the raw input
#[derive(Debug, Clone)]
pub struct AttributeTransformer {
    pipeline: TransformerPipeline,
    default_value: String,
}

impl AttributeTransformer {
    /// Create an attribute transformer; the pipeline must not be empty
    pub fn new(pipeline: TransformerPipeline, default_value: impl Into<String>) -> Result<Self> {
        if pipeline.is_empty() {
            return Err(Error::config("No transformers defined for attributeTransformer"));
        }

        Ok(Self {
            pipeline,
            default_value: default_value.into(),
        })
    }

    /// Value substituted when the pipeline fails
    pub fn default_value(&self) -> &str {
        &self.default_value
    }

    /// Transformer stages
    pub fn pipeline(&self) -> &TransformerPipeline {
        &self.pipeline
    }

    /// Run the pipeline over `input`
    pub fn compute(&self, input: &str) -> Result<String> {
        self.pipeline.apply(input)
    }
}

/// Attributes owned by one pattern id
#[derive(Debug, Clone)]
pub struct AttributeSet {
    pattern_id: String,
    parent_id: Option<String>,
    attributes: AttributeMap,
    transformers: IndexMap<String, AttributeTransformer>,
}

impl AttributeSet {
    /// Create a validated attribute set.
    ///
    /// `patternId` is reserved, as is `<key>_error` for every key present.
    pub fn new(
        pattern_id: impl Into<String>,
        parent_id: Option<String>,
        attributes: IndexMap<String, String>,
        transformers: IndexMap<String, AttributeTransformer>,
    ) -> Result<Self> {
        let pattern_id = pattern_id.into();

        if pattern_id.is_empty() {
            return Err(Error::config("Empty patternId not allowed"));
        }

        let keys: IndexSet<&str> = attributes
            .keys()
            .chain(transformers.keys())
            .map(String::as_str)
            .collect();

        for key in &keys {
            if key.is_empty() {
                return Err(Error::config(format!(
                    "Empty attribute name not allowed for {}",
                    pattern_id
                )));
            }

            if *key == PATTERN_ID_KEY {
                return Err(Error::config(format!(
                    "{} is a reserved attribute name ({})",
                    PATTERN_ID_KEY, pattern_id
                )));
            }

            if let Some(base) = key.strip_suffix(ERROR_SUFFIX) {
                if keys.contains(base) {
                    return Err(Error::config(format!(
                        "This attribute is reserved: {} ({})",
                        key, pattern_id
                    )));
                }
            }
        }

        let mut attributes = attributes;
        attributes.insert(PATTERN_ID_KEY.to_string(), pattern_id.clone());

        Ok(Self {
            pattern_id,
            parent_id: parent_id.filter(|p| !p.is_empty()),
            attributes,
            transformers,
        })
    }

    /// Owning pattern id
    pub fn pattern_id(&self) -> &str {
        &self.pattern_id
    }

    /// Parent pattern id, if this set inherits
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Static attributes, including the `patternId` key
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Dynamic attribute transformers by key
    pub fn transformers(&self) -> &IndexMap<String, AttributeTransformer> {
        &self.transformers
    }

    /// Static attributes plus dynamic values computed from `input`.
    ///
    /// A failing transformer yields its default value and a `<key>_error`
    /// entry describing the failure.
    pub fn evaluate(&self, input: &str) -> Cow<'_, AttributeMap> {
        if self.transformers.is_empty() {
            return Cow::Borrowed(&self.attributes);
        }

        let mut map = self.attributes.clone();

        for (key, transformer) in &self.transformers {
            match transformer.compute(input) {
                Ok(value) => {
                    map.insert(key.clone(), value);
                }
                Err(e) => {
                    map.insert(key.clone(), transformer.default_value().to_string());
                    map.insert(format!("{}{}", key, ERROR_SUFFIX), e.to_string());
                }
            }
        }

        Cow::Owned(map)
    }
}

/// All attribute sets of a domain, keyed by pattern id
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    sets: IndexMap<String, AttributeSet>,
}

impl AttributeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the set for its pattern id, returning the replaced set
    pub fn insert(&mut self, set: AttributeSet) -> Option<AttributeSet> {
        self.sets.insert(set.pattern_id.clone(), set)
    }

    /// Set for `pattern_id`
    pub fn get(&self, pattern_id: &str) -> Option<&AttributeSet> {
        self.sets.get(pattern_id)
    }

    /// Number of sets
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Reject any parent chain that revisits a pattern id
    pub fn check_acyclic(&self) -> Result<()> {
        for set in self.sets.values() {
            let mut chain: IndexSet<&str> = IndexSet::new();
            chain.insert(set.pattern_id());

            let mut current = set;

            while let Some(parent_id) = current.parent_id() {
                if !chain.insert(parent_id) {
                    let path: Vec<&str> = chain.iter().copied().chain([parent_id]).collect();
                    return Err(Error::config(format!(
                        "cyclic parentId chain: {}",
                        path.join(" -> ")
                    )));
                }

                match self.get(parent_id) {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
        }

        Ok(())
    }

    /// Resolve the attribute map for `pattern_id` against the raw `input`.
    ///
    /// Ids without a set resolve to `{patternId: id}`. Parents only fill keys
    /// the accumulated map lacks; a missing parent ends the chain.
    pub fn resolve(&self, pattern_id: &str, input: &str) -> AttributeMap {
        let Some(set) = self.get(pattern_id) else {
            let mut map = AttributeMap::new();
            map.insert(PATTERN_ID_KEY.to_string(), pattern_id.to_string());
            return map;
        };

        let mut map = set.evaluate(input).into_owned();
        let mut current = set;

        // chains are acyclic once checked; the hop bound covers unchecked stores
        for _ in 0..self.sets.len() {
            let Some(parent) = current.parent_id().and_then(|id| self.get(id)) else {
                break;
            };

            for (key, value) in parent.evaluate(input).iter() {
                if !map.contains_key(key) {
                    map.insert(key.clone(), value.clone());
                }
            }

            current = parent;
        }

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformer::Transformer;

    fn statics(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn set(id: &str, parent: Option<&str>, pairs: &[(&str, &str)]) -> AttributeSet {
        AttributeSet::new(id, parent.map(String::from), statics(pairs), IndexMap::new()).unwrap()
    }

    #[test]
    fn test_pattern_id_is_synthesized() {
        let s = set("iphone", None, &[("vendor", "apple")]);
        assert_eq!(s.attributes().get("patternId").unwrap(), "iphone");
        assert_eq!(s.attributes().get("vendor").unwrap(), "apple");
    }

    #[test]
    fn test_reserved_names() {
        let err = AttributeSet::new("p", None, statics(&[("patternId", "x")]), IndexMap::new());
        assert!(err.is_err());

        let err = AttributeSet::new(
            "p",
            None,
            statics(&[("version", "1"), ("version_error", "x")]),
            IndexMap::new(),
        );
        assert!(err.is_err());

        let err = AttributeSet::new("p", None, statics(&[("", "x")]), IndexMap::new());
        assert!(err.is_err());

        // an _error key without its base key is allowed
        assert!(AttributeSet::new("p", None, statics(&[("odd_error", "x")]), IndexMap::new()).is_ok());
    }

    #[test]
    fn test_reserved_name_across_transformers() {
        let mut transformers = IndexMap::new();
        transformers.insert(
            "version".to_string(),
            AttributeTransformer::new(vec![Transformer::IsNumber].into(), "0").unwrap(),
        );

        let err = AttributeSet::new("p", None, statics(&[("version_error", "x")]), transformers);
        assert!(err.is_err());
    }

    #[test]
    fn test_empty_attribute_transformer_rejected() {
        assert!(AttributeTransformer::new(TransformerPipeline::default(), "x").is_err());
    }

    #[test]
    fn test_dynamic_attribute_failure_uses_default() {
        let mut transformers = IndexMap::new();
        transformers.insert(
            "prefix".to_string(),
            AttributeTransformer::new(vec![Transformer::substring(0, Some(3)).unwrap()].into(), "ERR")
                .unwrap(),
        );

        let s = AttributeSet::new("p", None, IndexMap::new(), transformers).unwrap();

        let ok = s.evaluate("abcdef");
        assert_eq!(ok.get("prefix").unwrap(), "abc");
        assert!(!ok.contains_key("prefix_error"));

        let failed = s.evaluate("ab");
        assert_eq!(failed.get("prefix").unwrap(), "ERR");
        assert!(failed.contains_key("prefix_error"));
    }

    #[test]
    fn test_resolve_without_set() {
        let store = AttributeStore::new();
        let map = store.resolve("unknown", "input");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("patternId").unwrap(), "unknown");
    }

    #[test]
    fn test_resolve_inherits_without_overwriting() {
        let mut store = AttributeStore::new();
        store.insert(set("root", None, &[("os", "generic"), ("type", "device")]));
        store.insert(set("android", Some("root"), &[("os", "android")]));
        store.insert(set("pixel", Some("android"), &[("model", "pixel")]));

        let map = store.resolve("pixel", "");
        assert_eq!(map.get("patternId").unwrap(), "pixel");
        assert_eq!(map.get("model").unwrap(), "pixel");
        assert_eq!(map.get("os").unwrap(), "android");
        assert_eq!(map.get("type").unwrap(), "device");
    }

    #[test]
    fn test_missing_parent_ends_chain() {
        let mut store = AttributeStore::new();
        store.insert(set("child", Some("ghost"), &[("a", "1")]));

        let map = store.resolve("child", "");
        assert_eq!(map.len(), 2);
        assert!(store.check_acyclic().is_ok());
    }

    #[test]
    fn test_cycle_detected() {
        let mut store = AttributeStore::new();
        store.insert(set("a", Some("b"), &[]));
        store.insert(set("b", Some("a"), &[]));

        let err = store.check_acyclic().unwrap_err();
        assert!(err.to_string().contains("a -> b -> a"));

        // resolution still terminates on an unchecked store
        assert_eq!(store.resolve("a", "").get("patternId").unwrap(), "a");
    }

    #[test]
    fn test_self_parent_is_cycle() {
        let mut store = AttributeStore::new();
        store.insert(set("a", Some("a"), &[]));
        assert!(store.check_acyclic().is_err());
    }

    #[test]
    fn test_empty_parent_id_is_no_parent() {
        let s = set("a", Some(""), &[]);
        assert!(s.parent_id().is_none());
    }

    #[test]
    fn test_insert_replaces() {
        let mut store = AttributeStore::new();
        store.insert(set("a", None, &[("v", "1")]));
        let replaced = store.insert(set("a", None, &[("v", "2")]));

        assert!(replaced.is_some());
        assert_eq!(store.len(), 1);
        assert_eq!(store.resolve("a", "").get("v").unwrap(), "2");
    }
}
