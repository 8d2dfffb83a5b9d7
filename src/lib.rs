pub mod applicability;
pub mod binding;
pub mod dispatch;
pub mod evaluate;
pub mod lattice;
pub mod model;
pub mod policy;
pub mod registry;
pub mod scoring;
pub mod selection;
pub mod tailor;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use applicability::{ApplicabilityEngine, DictionaryModel, LanguageModel};
pub use binding::ValueBinding;
pub use evaluate::RuleResult;
pub use lattice::Verdict;
pub use model::{Benchmark, Group, Item, ItemId, Profile, Rule, Value};
pub use policy::{Policy, PolicyModel, TestResult};
pub use registry::{EngineRegistry, Evaluator, Reporter};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("value {0} has no matching export target")]
    ValueNotFound(model::ItemId),

    #[error("value {value_id} has no instance matching selector {selector:?}")]
    SelectorNotFound {
        value_id: model::ItemId,
        selector: Option<String>,
    },

    #[error("a reporter aborted the evaluation loop")]
    ReporterAborted,

    #[error("engine error: {0}")]
    Engine(String),
}

pub type Result<T> = std::result::Result<T, Error>;
