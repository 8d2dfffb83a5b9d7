//! Engine registry (§4.3): maps check-system URIs to evaluator callbacks, and holds
//! the well-known start/output reporter callbacks.

use crate::evaluate::RuleResult;
use crate::binding::ValueBinding;
use crate::lattice::Verdict;

/// What an evaluator callback returns: a verdict, or the fatal sentinel that aborts
/// the whole evaluation loop (§7).
#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    Verdict(Verdict),
    Fatal(String),
}

impl From<Verdict> for EvalOutcome {
    fn from(v: Verdict) -> Self {
        EvalOutcome::Verdict(v)
    }
}

/// A checking engine registered against one or more check-system URIs.
///
/// `evaluate` takes `&mut self` because real engines hold state worth reusing across
/// calls (parsed content, open handles); evaluators with no such state simply ignore it.
pub trait Evaluator {
    fn evaluate(
        &mut self,
        context_id: &str,
        content_name: Option<&str>,
        href: &str,
        bindings: &[ValueBinding],
        imports: &mut Vec<String>,
    ) -> EvalOutcome;

    /// Answers `NAMES_FOR_HREF` (§4.3, §6). The default says this evaluator does not
    /// support multi-check fan-out.
    fn names_for_href(&mut self, href: &str) -> Option<Vec<String>> {
        let _ = href;
        None
    }
}

/// What a reporter is told about: a rule about to be evaluated, or a freshly
/// materialized rule-result.
pub enum ReporterEvent<'a> {
    Start { rule_id: &'a str },
    Output { result: &'a RuleResult },
}

/// `report(payload, user) -> int` from §6, recast as a bool: `true` continues,
/// `false` is the nonzero return that aborts the outer evaluation loop.
pub trait Reporter {
    fn report(&mut self, event: ReporterEvent<'_>) -> bool;
}

/// Component C. Holds evaluators (keyed by system URI, registration order preserved)
/// and the well-known start/output reporters.
#[derive(Default)]
pub struct EngineRegistry {
    evaluators: Vec<(String, Box<dyn Evaluator>)>,
    start_reporters: Vec<Box<dyn Reporter>>,
    output_reporters: Vec<Box<dyn Reporter>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_evaluator(&mut self, system: impl Into<String>, evaluator: Box<dyn Evaluator>) {
        self.evaluators.push((system.into(), evaluator));
    }

    pub fn register_start_reporter(&mut self, reporter: Box<dyn Reporter>) {
        self.start_reporters.push(reporter);
    }

    pub fn register_output_reporter(&mut self, reporter: Box<dyn Reporter>) {
        self.output_reporters.push(reporter);
    }

    /// Whether any evaluator is registered for `system`; used by the check dispatcher
    /// (§4.6) to decide which candidate check survives.
    pub fn has_evaluator(&self, system: &str) -> bool {
        self.evaluators.iter().any(|(uri, _)| uri == system)
    }

    /// Try every evaluator registered for `system`, in registration order, stopping at
    /// the first one whose outcome is not `NotChecked` (§4.3). `None` means no
    /// evaluator at all was registered for `system`.
    pub fn evaluate(
        &mut self,
        system: &str,
        context_id: &str,
        content_name: Option<&str>,
        href: &str,
        bindings: &[ValueBinding],
        imports: &mut Vec<String>,
    ) -> Option<EvalOutcome> {
        let mut last = None;
        for (uri, evaluator) in self.evaluators.iter_mut() {
            if uri != system {
                continue;
            }
            let outcome = evaluator.evaluate(context_id, content_name, href, bindings, imports);
            let keep_going = matches!(outcome, EvalOutcome::Verdict(Verdict::NotChecked));
            last = Some(outcome);
            if !keep_going {
                break;
            }
        }
        last
    }

    /// `NAMES_FOR_HREF` for the first registered evaluator of `system` that supports it.
    pub fn names_for_href(&mut self, system: &str, href: &str) -> Option<Vec<String>> {
        self.evaluators
            .iter_mut()
            .filter(|(uri, _)| uri == system)
            .find_map(|(_, evaluator)| evaluator.names_for_href(href))
    }

    /// Fire every start reporter; stops at (and reports) the first abort.
    pub fn fire_start(&mut self, rule_id: &str) -> bool {
        self.start_reporters
            .iter_mut()
            .all(|r| r.report(ReporterEvent::Start { rule_id }))
    }

    /// Fire every output reporter with a freshly materialized rule-result.
    pub fn fire_output(&mut self, result: &RuleResult) -> bool {
        self.output_reporters
            .iter_mut()
            .all(|r| r.report(ReporterEvent::Output { result }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Always(Verdict);
    impl Evaluator for Always {
        fn evaluate(&mut self, _: &str, _: Option<&str>, _: &str, _: &[ValueBinding], _: &mut Vec<String>) -> EvalOutcome {
            EvalOutcome::Verdict(self.0)
        }
    }

    struct NotChecked;
    impl Evaluator for NotChecked {
        fn evaluate(&mut self, _: &str, _: Option<&str>, _: &str, _: &[ValueBinding], _: &mut Vec<String>) -> EvalOutcome {
            EvalOutcome::Verdict(Verdict::NotChecked)
        }
    }

    #[test]
    fn evaluate_stops_at_first_non_notchecked() {
        let mut registry = EngineRegistry::new();
        registry.register_evaluator("sys:a", Box::new(NotChecked));
        registry.register_evaluator("sys:a", Box::new(Always(Verdict::Pass)));
        registry.register_evaluator("sys:a", Box::new(Always(Verdict::Fail)));

        let mut imports = Vec::new();
        let outcome = registry.evaluate("sys:a", "r1", None, "href", &[], &mut imports);
        assert_eq!(outcome, Some(EvalOutcome::Verdict(Verdict::Pass)));
    }

    #[test]
    fn evaluate_unregistered_system_is_none() {
        let mut registry = EngineRegistry::new();
        let mut imports = Vec::new();
        let outcome = registry.evaluate("sys:missing", "r1", None, "href", &[], &mut imports);
        assert_eq!(outcome, None);
    }

    #[test]
    fn has_evaluator_reflects_registration() {
        let mut registry = EngineRegistry::new();
        assert!(!registry.has_evaluator("sys:a"));
        registry.register_evaluator("sys:a", Box::new(Always(Verdict::Pass)));
        assert!(registry.has_evaluator("sys:a"));
    }
}
