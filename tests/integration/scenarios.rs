use std::rc::Rc;

use xccdf_core::model::{Check, ComplexCheck, Item, ItemId, Profile, Select};
use xccdf_core::testing::{benchmark_with, FixedEvaluator, NamedEvaluator, RuleBuilder};
use xccdf_core::{lattice, PolicyModel, Verdict};

#[test]
fn single_rule_passes() {
    let check = Check::new("sys:a").with_content_ref("href1", None);
    let rule = RuleBuilder::new("r1").check(check).build();
    let benchmark = benchmark_with(vec![Item::Rule(rule)]);
    let model = Rc::new(PolicyModel::new(benchmark));
    model.registry.borrow_mut().register_evaluator("sys:a", Box::new(FixedEvaluator(Verdict::Pass)));

    let policy = model.policy(None);
    let test_result = policy.evaluate().unwrap();

    assert_eq!(test_result.results.len(), 1);
    assert_eq!(test_result.results[0].verdict, Verdict::Pass);
    assert_eq!(test_result.id, "xccdf_org.open-scap_testresult_default-profile");
}

#[test]
fn not_selected_rule_produces_a_not_selected_result() {
    let check = Check::new("sys:a").with_content_ref("href1", None);
    let rule = RuleBuilder::new("r1").selected(false).check(check).build();
    let benchmark = benchmark_with(vec![Item::Rule(rule)]);
    let model = Rc::new(PolicyModel::new(benchmark));
    model.registry.borrow_mut().register_evaluator("sys:a", Box::new(FixedEvaluator(Verdict::Pass)));

    let policy = model.policy(None);
    let test_result = policy.evaluate().unwrap();

    assert_eq!(test_result.results.len(), 1);
    assert_eq!(test_result.results[0].verdict, Verdict::NotSelected);
    assert!(test_result.results[0].messages.is_empty());
}

#[test]
fn profile_selects_rule_that_is_unselected_by_default() {
    let check = Check::new("sys:a").with_content_ref("href1", None);
    let rule = RuleBuilder::new("r1").selected(false).check(check).build();
    let benchmark = benchmark_with(vec![Item::Rule(rule)]);
    let model = Rc::new(PolicyModel::new(benchmark));
    model.registry.borrow_mut().register_evaluator("sys:a", Box::new(FixedEvaluator(Verdict::Pass)));

    let profile = Profile {
        id: Some(ItemId::from("p1")),
        selects: vec![Select { item_id: ItemId::from("r1"), selected: true }],
        ..Default::default()
    };
    let policy = model.policy(Some(profile));
    let test_result = policy.evaluate().unwrap();

    assert_eq!(test_result.results.len(), 1);
    assert_eq!(test_result.results[0].verdict, Verdict::Pass);
}

#[test]
fn rule_with_unmatched_platform_is_not_applicable() {
    let check = Check::new("sys:a").with_content_ref("href1", None);
    let rule = RuleBuilder::new("r1").platform("cpe:/o:nonexistent:1").check(check).build();
    let benchmark = benchmark_with(vec![Item::Rule(rule)]);
    let model = Rc::new(PolicyModel::new(benchmark));
    model.registry.borrow_mut().register_evaluator("sys:a", Box::new(FixedEvaluator(Verdict::Pass)));

    let policy = model.policy(None);
    let test_result = policy.evaluate().unwrap();

    assert_eq!(test_result.results[0].verdict, Verdict::NotApplicable);
}

#[test]
fn second_content_ref_is_consulted_and_pinned_when_the_first_is_not_checked() {
    // Content-refs are iterated in declaration order; the first one whose verdict
    // isn't NotChecked wins, so a NotChecked lead content-ref falls through to the
    // next one instead of ending the rule.
    struct SecondHrefPasses;
    impl xccdf_core::registry::Evaluator for SecondHrefPasses {
        fn evaluate(
            &mut self,
            _: &str,
            _: Option<&str>,
            href: &str,
            _: &[xccdf_core::binding::ValueBinding],
            _: &mut Vec<String>,
        ) -> xccdf_core::registry::EvalOutcome {
            if href == "href1" {
                Verdict::NotChecked.into()
            } else {
                Verdict::Pass.into()
            }
        }
    }

    let check = Check::new("sys:a")
        .with_content_ref("href1", None)
        .with_content_ref("href2", None);
    let rule = RuleBuilder::new("r1").check(check).build();
    let benchmark = benchmark_with(vec![Item::Rule(rule)]);
    let model = Rc::new(PolicyModel::new(benchmark));
    model.registry.borrow_mut().register_evaluator("sys:a", Box::new(SecondHrefPasses));

    let policy = model.policy(None);
    let test_result = policy.evaluate().unwrap();

    assert_eq!(test_result.results.len(), 1);
    assert_eq!(test_result.results[0].verdict, Verdict::Pass);
}

#[test]
fn multi_check_fan_out_reports_one_result_per_name() {
    let check = Check::new("sys:multi").with_multi_check(true).with_content_ref("href1", None);
    let rule = RuleBuilder::new("r1").check(check).build();
    let benchmark = benchmark_with(vec![Item::Rule(rule)]);
    let model = Rc::new(PolicyModel::new(benchmark));
    model.registry.borrow_mut().register_evaluator(
        "sys:multi",
        Box::new(NamedEvaluator { verdict: Verdict::Pass, names: vec!["disk0".into(), "disk1".into()] }),
    );

    let policy = model.policy(None);
    let test_result = policy.evaluate().unwrap();

    assert_eq!(test_result.results.len(), 2);
    assert_eq!(test_result.results[0].content_name.as_deref(), Some("disk0"));
    assert_eq!(test_result.results[1].content_name.as_deref(), Some("disk1"));
}

#[test]
fn multi_check_fan_out_refires_start_reporter_between_names() {
    use std::cell::Cell;

    struct CountingStart(Rc<Cell<u32>>);
    impl xccdf_core::registry::Reporter for CountingStart {
        fn report(&mut self, event: xccdf_core::registry::ReporterEvent<'_>) -> bool {
            if matches!(event, xccdf_core::registry::ReporterEvent::Start { .. }) {
                self.0.set(self.0.get() + 1);
            }
            true
        }
    }

    let check = Check::new("sys:multi").with_multi_check(true).with_content_ref("href1", None);
    let rule = RuleBuilder::new("r1").check(check).build();
    let benchmark = benchmark_with(vec![Item::Rule(rule)]);
    let model = Rc::new(PolicyModel::new(benchmark));
    model.registry.borrow_mut().register_evaluator(
        "sys:multi",
        Box::new(NamedEvaluator { verdict: Verdict::Pass, names: vec!["disk0".into(), "disk1".into(), "disk2".into()] }),
    );
    let starts = Rc::new(Cell::new(0));
    model.registry.borrow_mut().register_start_reporter(Box::new(CountingStart(Rc::clone(&starts))));

    let policy = model.policy(None);
    let test_result = policy.evaluate().unwrap();

    assert_eq!(test_result.results.len(), 3);
    // one fire_start for the rule itself, plus one re-fire between each subsequent name
    assert_eq!(starts.get(), 3);
}

#[test]
fn complex_check_and_or_negate_combines_leaf_verdicts() {
    let a = Check::new("sys:a").with_content_ref("href-a", None);
    let b = Check::new("sys:b").with_content_ref("href-b", None);
    let c = Check::new("sys:c").with_content_ref("href-c", None);

    let tree = ComplexCheck::Combinator {
        op: lattice::Operator::And,
        negate: true,
        children: vec![
            ComplexCheck::Leaf(a),
            ComplexCheck::Combinator {
                op: lattice::Operator::Or,
                negate: false,
                children: vec![ComplexCheck::Leaf(b), ComplexCheck::Leaf(c)],
            },
        ],
    };

    let rule = RuleBuilder::new("r1").complex_check(tree).build();
    let benchmark = benchmark_with(vec![Item::Rule(rule)]);
    let model = Rc::new(PolicyModel::new(benchmark));
    model.registry.borrow_mut().register_evaluator("sys:a", Box::new(FixedEvaluator(Verdict::Pass)));
    model.registry.borrow_mut().register_evaluator("sys:b", Box::new(FixedEvaluator(Verdict::Fail)));
    model.registry.borrow_mut().register_evaluator("sys:c", Box::new(FixedEvaluator(Verdict::Pass)));

    let policy = model.policy(None);
    let test_result = policy.evaluate().unwrap();

    // AND(P, OR(F, P)) = P, negated => F
    assert_eq!(test_result.results[0].verdict, Verdict::Fail);
}

#[test]
fn unregistered_check_system_yields_not_checked() {
    let check = Check::new("sys:missing").with_content_ref("href1", None);
    let rule = RuleBuilder::new("r1").check(check).build();
    let benchmark = benchmark_with(vec![Item::Rule(rule)]);
    let model = Rc::new(PolicyModel::new(benchmark));

    let policy = model.policy(None);
    let test_result = policy.evaluate().unwrap();

    assert_eq!(test_result.results[0].verdict, Verdict::NotChecked);
    assert_eq!(test_result.results[0].messages, vec!["No candidate or applicable check found.".to_string()]);
}
