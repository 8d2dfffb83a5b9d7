//! Value binding assembler (§4.2): resolves a check's exports into concrete,
//! type-tagged values using the profile's set-value / refine-value overlays.

use crate::model::{Benchmark, Export, Profile, ValueOperator, ValueType};
use crate::{Error, Result};

/// One resolved `(exported name, semantic type, value, operator)` quadruple, plus
/// the raw set-value override if the profile declared one.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueBinding {
    pub name: String,
    pub value_type: ValueType,
    pub literal: String,
    pub set_value: Option<String>,
    pub operator: ValueOperator,
}

/// Resolve every export in declaration order. Discards the partial list on the first
/// failure, matching §4.2's "on any failure the partial list must be discarded."
pub fn assemble(benchmark: &Benchmark, profile: Option<&Profile>, exports: &[Export]) -> Result<Vec<ValueBinding>> {
    let mut bindings = Vec::with_capacity(exports.len());
    for export in exports {
        let value = benchmark
            .get_value(&export.value_id)
            .ok_or_else(|| Error::ValueNotFound(export.value_id.clone()))?;

        let set_value = profile
            .and_then(|p| p.set_value_for(&export.value_id))
            .map(|sv| sv.literal.clone());

        let refine = profile.and_then(|p| p.refine_value_for(&export.value_id));
        let selector = refine.and_then(|r| r.selector.as_deref());
        let operator = refine.and_then(|r| r.operator).unwrap_or(value.operator);

        let instance = value.instance(selector).ok_or_else(|| Error::SelectorNotFound {
            value_id: export.value_id.clone(),
            selector: selector.map(str::to_string),
        })?;

        bindings.push(ValueBinding {
            name: export.name.clone(),
            value_type: value.value_type,
            literal: instance.literal.clone(),
            set_value,
            operator,
        });
    }
    Ok(bindings)
}
