//! Classifier trait and shared handle

use crate::domain::Domain;
use std::sync::Arc;
use textglass_core::{AttributeMap, DomainIdentity, Result};

/// Trait for anything that classifies text into an attribute map
pub trait Classifier: Send + Sync {
    /// Classify the given text.
    ///
    /// `Ok(None)` means nothing matched and no default pattern is configured.
    fn classify(&self, text: &str) -> Result<Option<AttributeMap>>;

    /// Domain served by this classifier
    fn identity(&self) -> &DomainIdentity;
}

impl Classifier for Domain {
    fn classify(&self, text: &str) -> Result<Option<AttributeMap>> {
        Domain::classify(self, text)
    }

    fn identity(&self) -> &DomainIdentity {
        Domain::identity(self)
    }
}

/// Cheaply cloneable handle to a loaded domain
#[derive(Debug, Clone)]
pub struct SharedClassifier {
    domain: Arc<Domain>,
}

impl SharedClassifier {
    /// Wrap a loaded domain
    pub fn new(domain: Domain) -> Self {
        Self {
            domain: Arc::new(domain),
        }
    }

    /// Underlying domain
    pub fn domain(&self) -> &Domain {
        &self.domain
    }
}

impl From<Domain> for SharedClassifier {
    fn from(domain: Domain) -> Self {
        Self::new(domain)
    }
}

impl Classifier for SharedClassifier {
    fn classify(&self, text: &str) -> Result<Option<AttributeMap>> {
        self.domain.classify(text)
    }

    fn identity(&self) -> &DomainIdentity {
        self.domain.identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Document;
    use crate::domain::DomainBuilder;
    use std::thread;

    fn domain() -> Domain {
        let doc = Document::from_json(
            r#"{
                "specVersion": 1.0, "type": "pattern", "domain": "shared", "domainVersion": "1.0",
                "inputParser": {"tokenSeperators": [" "]},
                "patternSet": {
                    "defaultId": "other",
                    "patterns": [{"patternId": "cat", "patternType": "Simple", "patternTokens": ["cat"], "rankType": "None"}]
                }
            }"#,
        )
        .unwrap();

        DomainBuilder::load(&doc, None, None, None).unwrap()
    }

    #[test]
    fn test_shared_classifier_across_threads() {
        let classifier = SharedClassifier::new(domain());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let classifier = classifier.clone();
                thread::spawn(move || {
                    let input = if i % 2 == 0 { "a cat" } else { "a dog" };
                    classifier.classify(input).unwrap().unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.join().unwrap();
            let expected = if i % 2 == 0 { "cat" } else { "other" };
            assert_eq!(result.get("patternId").unwrap(), expected);
        }
    }

    #[test]
    fn test_trait_object() {
        let classifier: Box<dyn Classifier> = Box::new(domain());
        assert_eq!(classifier.identity().domain, "shared");
        assert!(classifier.classify("cat").unwrap().is_some());
    }
}
