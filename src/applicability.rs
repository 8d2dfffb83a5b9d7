//! Applicability engine (§4.4): decides whether a rule's declared platforms make it
//! applicable to the target system, via CPE matching, an optional dictionary model,
//! and an optional language model — each consulted in turn, first match wins.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::lattice::Verdict;
use crate::registry::EngineRegistry;

/// Well-known check-system URI the applicability engine dispatches platform checks
/// against when a platform reference is itself a checkable href (§4.4).
pub const PLATFORM_CHECK_SYSTEM: &str = "http://oval.mitre.org/XMLSchema/oval-definitions-5#applicability";

/// A CPE (or equivalent) platform dictionary: resolves a platform name to whether the
/// target matches it, without needing a full check-engine round trip.
pub trait DictionaryModel {
    fn is_name_applicable(&self, name: &str) -> Option<bool>;
}

/// A free-form "language model" fallback consulted when neither CPE nor dictionary
/// matching settles a platform reference (§4.4, §6) — e.g. a natural-language platform
/// description evaluated heuristically.
pub trait LanguageModel {
    fn is_platform_applicable(&self, platform: &str) -> Option<bool>;
}

/// Per-href memoized results of resolving one platform/applicability check (§4.4: "the
/// engine session cache"). Keyed by the item name the check dispatch asked about so a
/// single href backing several named checks doesn't re-evaluate per rule.
#[derive(Debug, Default)]
struct Session {
    results: HashMap<String, bool>,
}

/// Component D. Consults CPE platform strings directly, then an optional dictionary
/// model, then an optional language model, then falls back to dispatching a real
/// check through the registry.
#[derive(Default)]
pub struct ApplicabilityEngine {
    sessions: RefCell<HashMap<String, Session>>,
    dictionaries: Vec<Box<dyn DictionaryModel>>,
    language_models: Vec<Box<dyn LanguageModel>>,
    in_progress: RefCell<HashSet<(String, String)>>,
}

impl ApplicabilityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_dictionary(&mut self, model: Box<dyn DictionaryModel>) {
        self.dictionaries.push(model);
    }

    pub fn register_language_model(&mut self, model: Box<dyn LanguageModel>) {
        self.language_models.push(model);
    }

    /// Whether `platforms` makes the owning rule/group applicable: empty means
    /// "applicable everywhere" (§4.4); otherwise any one matching platform suffices.
    pub fn is_applicable(&self, platforms: &[String], registry: &RefCell<EngineRegistry>) -> Verdict {
        if platforms.is_empty() {
            return Verdict::Pass;
        }
        let any_match = platforms.iter().any(|p| self.platform_matches(p, registry));
        if any_match {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    fn platform_matches(&self, platform: &str, registry: &RefCell<EngineRegistry>) -> bool {
        if let Some(hit) = self.try_dictionary(platform) {
            return hit;
        }
        if let Some(hit) = self.try_language_model(platform) {
            return hit;
        }
        self.check_leaf(platform, platform, registry).unwrap_or(false)
    }

    fn try_dictionary(&self, platform: &str) -> Option<bool> {
        self.dictionaries.iter().find_map(|d| d.is_name_applicable(platform))
    }

    fn try_language_model(&self, platform: &str) -> Option<bool> {
        self.language_models.iter().find_map(|m| m.is_platform_applicable(platform))
    }

    /// Resolve one `(href, name)` leaf by dispatching a platform check through the
    /// registry, memoized per href/name and guarded against cyclic references: a
    /// revisit while the same pair is already being resolved fails closed.
    fn check_leaf(&self, href: &str, name: &str, registry: &RefCell<EngineRegistry>) -> Option<bool> {
        if let Some(cached) = self.sessions.borrow().get(href).and_then(|s| s.results.get(name)) {
            return Some(*cached);
        }

        let key = (href.to_string(), name.to_string());
        if !self.in_progress.borrow_mut().insert(key.clone()) {
            return Some(false);
        }

        let outcome = registry.borrow_mut().evaluate(
            PLATFORM_CHECK_SYSTEM,
            name,
            Some(name),
            href,
            &[],
            &mut Vec::new(),
        );

        self.in_progress.borrow_mut().remove(&key);

        let result = match outcome {
            Some(crate::registry::EvalOutcome::Verdict(Verdict::Pass)) => true,
            Some(crate::registry::EvalOutcome::Verdict(_)) => false,
            Some(crate::registry::EvalOutcome::Fatal(_)) | None => false,
        };

        self.sessions
            .borrow_mut()
            .entry(href.to_string())
            .or_default()
            .results
            .insert(name.to_string(), result);

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysYes;
    impl DictionaryModel for AlwaysYes {
        fn is_name_applicable(&self, _name: &str) -> Option<bool> {
            Some(true)
        }
    }

    struct AlwaysNo;
    impl DictionaryModel for AlwaysNo {
        fn is_name_applicable(&self, _name: &str) -> Option<bool> {
            Some(false)
        }
    }

    #[test]
    fn empty_platforms_is_applicable() {
        let engine = ApplicabilityEngine::new();
        let registry = RefCell::new(EngineRegistry::new());
        assert_eq!(engine.is_applicable(&[], &registry), Verdict::Pass);
    }

    #[test]
    fn dictionary_hit_short_circuits() {
        let mut engine = ApplicabilityEngine::new();
        engine.register_dictionary(Box::new(AlwaysYes));
        let registry = RefCell::new(EngineRegistry::new());
        assert_eq!(engine.is_applicable(&["cpe:/o:example:1".into()], &registry), Verdict::Pass);
    }

    #[test]
    fn no_match_anywhere_fails() {
        let mut engine = ApplicabilityEngine::new();
        engine.register_dictionary(Box::new(AlwaysNo));
        let registry = RefCell::new(EngineRegistry::new());
        assert_eq!(engine.is_applicable(&["cpe:/o:example:1".into()], &registry), Verdict::Fail);
    }

    #[test]
    fn cyclic_reference_fails_closed() {
        let engine = ApplicabilityEngine::new();
        let registry = RefCell::new(EngineRegistry::new());
        engine.in_progress.borrow_mut().insert(("href".into(), "name".into()));
        assert_eq!(engine.check_leaf("href", "name", &registry), Some(false));
    }

    #[test]
    fn check_leaf_result_is_memoized() {
        struct CountingEvaluator {
            calls: std::cell::Cell<u32>,
        }
        impl crate::registry::Evaluator for CountingEvaluator {
            fn evaluate(
                &mut self,
                _: &str,
                _: Option<&str>,
                _: &str,
                _: &[crate::binding::ValueBinding],
                _: &mut Vec<String>,
            ) -> crate::registry::EvalOutcome {
                self.calls.set(self.calls.get() + 1);
                Verdict::Pass.into()
            }
        }
        let engine = ApplicabilityEngine::new();
        let mut reg = EngineRegistry::new();
        reg.register_evaluator(PLATFORM_CHECK_SYSTEM, Box::new(CountingEvaluator { calls: std::cell::Cell::new(0) }));
        let registry = RefCell::new(reg);
        assert_eq!(engine.check_leaf("href1", "name1", &registry), Some(true));
        assert_eq!(engine.check_leaf("href1", "name1", &registry), Some(true));
        assert_eq!(engine.sessions.borrow().get("href1").unwrap().results.len(), 1);
    }
}
