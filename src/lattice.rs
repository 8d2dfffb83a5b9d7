//! The seven-plus-one-valued result lattice and its AND/OR/negate operators.

use serde::{Deserialize, Serialize};

/// A verdict produced by evaluating a check or combining other verdicts.
///
/// Ordering here is purely declaration order and carries no algebraic meaning;
/// all combination logic lives in [`and`], [`or`], and [`negate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    Fail,
    Error,
    Unknown,
    NotApplicable,
    NotChecked,
    NotSelected,
    Informational,
}

impl Verdict {
    const fn index(self) -> usize {
        match self {
            Verdict::Pass => 0,
            Verdict::Fail => 1,
            Verdict::Error => 2,
            Verdict::Unknown => 3,
            Verdict::NotApplicable => 4,
            Verdict::NotChecked => 5,
            Verdict::NotSelected => 6,
            Verdict::Informational => 7,
        }
    }

    const fn from_index(idx: usize) -> Verdict {
        match idx {
            0 => Verdict::Pass,
            1 => Verdict::Fail,
            2 => Verdict::Error,
            3 => Verdict::Unknown,
            4 => Verdict::NotApplicable,
            5 => Verdict::NotChecked,
            6 => Verdict::NotSelected,
            _ => Verdict::Informational,
        }
    }

    /// True for the two verdicts scoring excludes from the fixed-result contribution
    /// (`P` and the source's notion of "fixed", which this model does not distinguish
    /// from `P` since remediation status is out of scope).
    pub fn counts_as_pass(self) -> bool {
        matches!(self, Verdict::Pass)
    }

    /// True for verdicts scoring (§4.8) excludes from both numerator and denominator.
    pub fn excluded_from_scoring(self) -> bool {
        matches!(
            self,
            Verdict::NotSelected | Verdict::NotApplicable | Verdict::Informational | Verdict::NotChecked
        )
    }
}

#[rustfmt::skip]
const AND_TABLE: [[usize; 8]; 8] = [
    // P  F  E  U  N  K  S  I
    [0, 1, 2, 3, 0, 0, 0, 0], // P
    [1, 1, 1, 1, 1, 1, 1, 1], // F
    [2, 1, 2, 2, 2, 2, 2, 2], // E
    [3, 1, 2, 3, 3, 3, 3, 3], // U
    [0, 1, 2, 3, 4, 4, 4, 4], // N
    [0, 1, 2, 3, 4, 5, 5, 5], // K
    [0, 1, 2, 3, 4, 5, 6, 6], // S
    [0, 1, 2, 3, 4, 5, 6, 7], // I
];

#[rustfmt::skip]
const OR_TABLE: [[usize; 8]; 8] = [
    // P  F  E  U  N  K  S  I
    [0, 0, 0, 0, 0, 0, 0, 0], // P
    [0, 1, 2, 3, 1, 1, 1, 1], // F
    [0, 2, 2, 2, 2, 2, 2, 2], // E
    [0, 3, 2, 3, 3, 3, 3, 3], // U
    [0, 1, 2, 3, 4, 4, 4, 4], // N
    [0, 1, 2, 3, 4, 5, 5, 5], // K
    [0, 1, 2, 3, 4, 5, 6, 6], // S
    [0, 1, 2, 3, 4, 5, 6, 7], // I
];

/// Fold two verdicts with boolean AND. Not associative over the full lattice;
/// callers combining more than two values must fold left-to-right in declaration order.
pub fn and(a: Verdict, b: Verdict) -> Verdict {
    Verdict::from_index(AND_TABLE[a.index()][b.index()])
}

/// Fold two verdicts with boolean OR. Same left-to-right fold requirement as [`and`].
pub fn or(a: Verdict, b: Verdict) -> Verdict {
    Verdict::from_index(OR_TABLE[a.index()][b.index()])
}

/// The boolean operator carried by a complex-check interior node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    And,
    Or,
}

/// Fold a non-empty sequence of verdicts with the given operator, left to right.
///
/// # Panics
/// Panics if `verdicts` is empty; complex-check nodes and content-ref iteration
/// always provide at least one verdict by construction.
pub fn fold(op: Operator, verdicts: impl IntoIterator<Item = Verdict>) -> Verdict {
    let mut iter = verdicts.into_iter();
    let mut acc = iter.next().expect("fold requires at least one verdict");
    for v in iter {
        acc = match op {
            Operator::And => and(acc, v),
            Operator::Or => or(acc, v),
        };
    }
    acc
}

/// Negate a verdict: flips `Pass` <-> `Fail`, passes everything else through unchanged.
/// Applied exactly once per complex-check node, after folding its children.
pub fn negate(v: Verdict) -> Verdict {
    match v {
        Verdict::Pass => Verdict::Fail,
        Verdict::Fail => Verdict::Pass,
        other => other,
    }
}
