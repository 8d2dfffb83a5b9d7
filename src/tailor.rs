//! Tailoring (§4.9): a non-mutating clone-and-refine view of a rule, group, or value
//! under a profile, plus `%id%` textual substitution for prose that embeds value ids.

use crate::model::{Group, Item, Profile, Role, Rule, Severity, Value};

/// A tailored rule: the stored rule's fields with the profile's refine-rule overlay
/// applied, without touching the benchmark's own copy.
#[derive(Debug, Clone)]
pub struct TailoredRule {
    pub weight: f64,
    pub role: Role,
    pub severity: Severity,
    pub selector: Option<String>,
}

/// A tailored group: just the weight, the only group field a refine-rule can touch.
#[derive(Debug, Clone)]
pub struct TailoredGroup {
    pub weight: f64,
}

pub fn tailor_rule(rule: &Rule, profile: Option<&Profile>) -> TailoredRule {
    let refine = profile.and_then(|p| p.refine_rule_for(&rule.id));
    TailoredRule {
        weight: refine.and_then(|r| r.weight).unwrap_or(rule.weight),
        role: refine.and_then(|r| r.role).unwrap_or(rule.role),
        severity: refine.and_then(|r| r.severity).unwrap_or(rule.severity),
        selector: refine.and_then(|r| r.selector.clone()),
    }
}

pub fn tailor_group(group: &Group, _profile: Option<&Profile>) -> TailoredGroup {
    TailoredGroup { weight: group.weight }
}

/// Tailor any tree item uniformly; values have nothing to refine beyond what
/// [`crate::binding::assemble`] already resolves, so they pass through unchanged.
pub fn tailor_item<'a>(item: &'a Item, profile: Option<&Profile>) -> Tailored<'a> {
    match item {
        Item::Rule(r) => Tailored::Rule(tailor_rule(r, profile)),
        Item::Group(g) => Tailored::Group(tailor_group(g, profile)),
        Item::Value(v) => Tailored::Value(v),
    }
}

pub enum Tailored<'a> {
    Rule(TailoredRule),
    Group(TailoredGroup),
    Value(&'a Value),
}

/// Substitute every `%id%` occurrence in `text` (§4.9, §6): a plain-text lookup first,
/// falling back to the tailored default instance of a value with that id.
pub fn substitute(
    text: &str,
    benchmark: &crate::model::Benchmark,
    profile: Option<&Profile>,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('%') {
        let (before, after_pct) = rest.split_at(start);
        out.push_str(before);
        let after_pct = &after_pct[1..];
        match after_pct.find('%') {
            Some(end) => {
                let id_str = &after_pct[..end];
                out.push_str(&resolve_placeholder(id_str, benchmark, profile));
                rest = &after_pct[end + 1..];
            }
            None => {
                out.push('%');
                rest = after_pct;
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_placeholder(id_str: &str, benchmark: &crate::model::Benchmark, profile: Option<&Profile>) -> String {
    let id = crate::model::ItemId::from(id_str);

    if let Some(plain) = benchmark.get_plain_text(&id) {
        return plain.to_string();
    }

    if let Some(value) = benchmark.get_value(&id) {
        let set_value = profile.and_then(|p| p.set_value_for(&id)).map(|sv| sv.literal.clone());
        if let Some(literal) = set_value {
            return literal;
        }
        let selector = profile.and_then(|p| p.refine_value_for(&id)).and_then(|r| r.selector.as_deref());
        if let Some(instance) = value.instance(selector) {
            return instance.literal.clone();
        }
    }

    format!("%{id_str}%")
}
