//! The read-only benchmark/profile data model the core consumes (§3, §6).
//!
//! These types represent the tree an external XML front end would have
//! already parsed. The core never mutates a [`Benchmark`]; every operation
//! that needs a modified view goes through [`crate::tailor`] instead.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::applicability::{DictionaryModel, LanguageModel};
use crate::lattice::Operator;

/// An item identifier, shared by rules, groups, and values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId(s)
    }
}

/// A value's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    String,
    Number,
    Boolean,
}

/// The comparison semantics a resolved value binding carries for its consumer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueOperator {
    Equals,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    PatternMatch,
}

/// A rule's scoring role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Full,
    Unscored,
    Unchecked,
}

/// A rule's severity, as carried into rule-results and refine-rule overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Unknown,
    Info,
    Low,
    Medium,
    High,
}

/// A `(href, optional name)` pair inside a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRef {
    pub href: String,
    pub name: Option<String>,
}

/// One export declared by a check: binds a value to a name the checking engine will see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    pub name: String,
    pub value_id: ItemId,
}

/// A reference to externally evaluated content producing one verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub system: String,
    pub selector: Option<String>,
    pub multi_check: bool,
    pub negate: bool,
    pub content_refs: Vec<ContentRef>,
    pub exports: Vec<Export>,
    pub imports: Vec<String>,
    /// Set once dispatch (§4.6) has chosen which content-ref to report; absent on the
    /// benchmark's own stored check, present only on the clone a rule evaluation produces.
    pub pinned: Option<ContentRef>,
}

impl Check {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            selector: None,
            multi_check: false,
            negate: false,
            content_refs: Vec::new(),
            exports: Vec::new(),
            imports: Vec::new(),
            pinned: None,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_multi_check(mut self, multi_check: bool) -> Self {
        self.multi_check = multi_check;
        self
    }

    pub fn with_negate(mut self, negate: bool) -> Self {
        self.negate = negate;
        self
    }

    pub fn with_content_ref(mut self, href: impl Into<String>, name: Option<&str>) -> Self {
        self.content_refs.push(ContentRef {
            href: href.into(),
            name: name.map(str::to_string),
        });
        self
    }

    pub fn with_export(mut self, name: impl Into<String>, value_id: impl Into<ItemId>) -> Self {
        self.exports.push(Export {
            name: name.into(),
            value_id: value_id.into(),
        });
        self
    }
}

/// A boolean combinator tree over checks (§3, §4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComplexCheck {
    Leaf(Check),
    Combinator {
        op: Operator,
        negate: bool,
        children: Vec<ComplexCheck>,
    },
}

/// One typed instance of a [`Value`], keyed by an optional selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueInstance {
    pub selector: Option<String>,
    pub literal: String,
}

/// A typed, tailorable parameter referenced by check exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub id: ItemId,
    pub value_type: ValueType,
    pub operator: ValueOperator,
    pub instances: Vec<ValueInstance>,
}

impl Value {
    /// Resolve an instance by selector; `None` means "the default instance"
    /// (the instance carrying no selector of its own).
    pub fn instance(&self, selector: Option<&str>) -> Option<&ValueInstance> {
        match selector {
            Some(sel) => self.instances.iter().find(|i| i.selector.as_deref() == Some(sel)),
            None => self.instances.iter().find(|i| i.selector.is_none()),
        }
    }
}

/// A reference to an identification scheme (e.g. CCE, CVE) carried by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    pub system: String,
    pub value: String,
}

/// A remediation fix script carried by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    pub id: Option<String>,
    pub system: Option<String>,
    pub content: String,
}

/// A leaf of the benchmark tree carrying one or more checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: ItemId,
    pub version: Option<String>,
    pub severity: Severity,
    pub role: Role,
    pub weight: f64,
    pub default_selected: bool,
    pub idents: Vec<Ident>,
    pub fixes: Vec<Fix>,
    pub platforms: Vec<String>,
    pub checks: Vec<Check>,
    pub complex_checks: Vec<ComplexCheck>,
}

/// An interior node of the benchmark tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: ItemId,
    pub weight: f64,
    pub default_selected: bool,
    pub platforms: Vec<String>,
    pub children: Vec<Item>,
}

/// A node of the benchmark tree: either an interior [`Group`] or a leaf [`Rule`]/[`Value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    Group(Group),
    Rule(Rule),
    Value(Value),
}

impl Item {
    pub fn id(&self) -> &ItemId {
        match self {
            Item::Group(g) => &g.id,
            Item::Rule(r) => &r.id,
            Item::Value(v) => &v.id,
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            Item::Group(g) => g.weight,
            Item::Rule(r) => r.weight,
            Item::Value(_) => 0.0,
        }
    }

    pub fn default_selected(&self) -> bool {
        match self {
            Item::Group(g) => g.default_selected,
            Item::Rule(r) => r.default_selected,
            Item::Value(_) => false,
        }
    }

    pub fn platforms(&self) -> &[String] {
        match self {
            Item::Group(g) => &g.platforms,
            Item::Rule(r) => &r.platforms,
            Item::Value(_) => &[],
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Item::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        match self {
            Item::Rule(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Item::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// One entry of a profile's select list: `item-id -> selected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Select {
    pub item_id: ItemId,
    pub selected: bool,
}

/// One entry of a profile's set-value list: `value-id -> literal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetValue {
    pub value_id: ItemId,
    pub literal: String,
}

/// One entry of a profile's refine-value list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineValue {
    pub value_id: ItemId,
    pub selector: Option<String>,
    pub operator: Option<ValueOperator>,
}

/// One entry of a profile's refine-rule list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineRule {
    pub item_id: ItemId,
    pub weight: Option<f64>,
    pub role: Option<Role>,
    pub severity: Option<Severity>,
    pub selector: Option<String>,
}

/// A named overlay selecting and parameterizing rules for a specific usage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub id: Option<ItemId>,
    pub selects: Vec<Select>,
    pub set_values: Vec<SetValue>,
    pub refine_values: Vec<RefineValue>,
    pub refine_rules: Vec<RefineRule>,
}

impl Profile {
    /// Last matching select entry for `id`, if any ("last entry wins").
    pub fn select_for(&self, id: &ItemId) -> Option<bool> {
        self.selects.iter().rev().find(|s| &s.item_id == id).map(|s| s.selected)
    }

    /// Last matching set-value entry for `value_id`, if any.
    pub fn set_value_for(&self, value_id: &ItemId) -> Option<&SetValue> {
        self.set_values.iter().rev().find(|s| &s.value_id == value_id)
    }

    /// Last matching refine-value entry for `value_id`, if any.
    pub fn refine_value_for(&self, value_id: &ItemId) -> Option<&RefineValue> {
        self.refine_values.iter().rev().find(|r| &r.value_id == value_id)
    }

    /// Last matching refine-rule entry for `item_id`, if any.
    pub fn refine_rule_for(&self, item_id: &ItemId) -> Option<&RefineRule> {
        self.refine_rules.iter().rev().find(|r| &r.item_id == item_id)
    }
}

/// Distinguishes the two rule-result id prefixing schemes of §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaVersion {
    Before1_2,
    V1_2OrLater,
}

/// The root document containing the rule/group/value tree (§3).
pub struct Benchmark {
    pub id: ItemId,
    pub schema_version: SchemaVersion,
    pub children: Vec<Item>,
    pub plain_texts: HashMap<ItemId, String>,
    pub dictionary: Option<Box<dyn DictionaryModel>>,
    pub language_model: Option<Box<dyn LanguageModel>>,
    paths: HashMap<ItemId, Vec<usize>>,
}

impl Benchmark {
    pub fn new(
        id: impl Into<ItemId>,
        schema_version: SchemaVersion,
        children: Vec<Item>,
        plain_texts: HashMap<ItemId, String>,
        dictionary: Option<Box<dyn DictionaryModel>>,
        language_model: Option<Box<dyn LanguageModel>>,
    ) -> Self {
        let mut paths = HashMap::new();
        let mut prefix = Vec::new();
        index_items(&children, &mut prefix, &mut paths);
        Self {
            id: id.into(),
            schema_version,
            children,
            plain_texts,
            dictionary,
            language_model,
            paths,
        }
    }

    /// `benchmark.getItemById(id)` (§6).
    pub fn get_item_by_id(&self, id: &ItemId) -> Option<&Item> {
        let path = self.paths.get(id)?;
        Some(get_by_path(&self.children, path))
    }

    /// `benchmark.getPlainText(id)` (§6).
    pub fn get_plain_text(&self, id: &ItemId) -> Option<&str> {
        self.plain_texts.get(id).map(String::as_str)
    }

    pub fn get_value(&self, id: &ItemId) -> Option<&Value> {
        self.get_item_by_id(id).and_then(Item::as_value)
    }
}

fn index_items(items: &[Item], prefix: &mut Vec<usize>, out: &mut HashMap<ItemId, Vec<usize>>) {
    for (i, item) in items.iter().enumerate() {
        prefix.push(i);
        out.insert(item.id().clone(), prefix.clone());
        if let Item::Group(g) = item {
            index_items(&g.children, prefix, out);
        }
        prefix.pop();
    }
}

fn get_by_path<'a>(children: &'a [Item], path: &[usize]) -> &'a Item {
    let (first, rest) = path.split_first().expect("index paths are never empty");
    let item = &children[*first];
    if rest.is_empty() {
        return item;
    }
    match item {
        Item::Group(g) => get_by_path(&g.children, rest),
        _ => unreachable!("index path descends past a leaf"),
    }
}
