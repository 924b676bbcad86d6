//! The single output unit of every comparator.

use std::fmt::{self, Display};

use alloy::primitives::{hex, Address, Bloom, Bytes, B256, B64, U256};
use serde::{Deserialize, Serialize};

use crate::views::OpStepView;

/// One field-level difference between the reference (`a`) and the candidate
/// (`b`) record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchRecord {
    /// Dotted path of the field, e.g. `logs[2].topics[0]`.
    pub field_path: String,
    pub a: FieldValue,
    pub b: FieldValue,
    /// Extra qualifier that does not belong to either side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl MismatchRecord {
    pub fn new(
        field_path: impl Into<String>,
        a: impl Into<FieldValue>,
        b: impl Into<FieldValue>,
    ) -> Self {
        Self {
            field_path: field_path.into(),
            a: a.into(),
            b: b.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

impl Display for MismatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: A={} B={}", self.field_path, self.a, self.b)?;
        if let Some(note) = &self.note {
            write!(f, " ({note})")?;
        }
        Ok(())
    }
}

/// A step of an execution trace together with the step that preceded it on
/// the same side, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepContext {
    pub index: usize,
    pub step: OpStepView,
    pub previous: Option<OpStepView>,
}

/// A typed value of one side of a [`MismatchRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Hash(B256),
    Address(Address),
    Bloom(Bloom),
    Bytes(Bytes),
    Nonce(B64),
    Quantity(U256),
    Number(u64),
    Flag(bool),
    Hashes(Vec<B256>),
    Indices(Vec<u64>),
    Json(serde_json::Value),
    Step(Box<StepContext>),
    Absent,
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Hash(h) => write!(f, "{h}"),
            FieldValue::Address(a) => write!(f, "{a}"),
            FieldValue::Bloom(b) => f.write_str(&hex::encode_prefixed(b.as_slice())),
            FieldValue::Bytes(b) => f.write_str(&hex::encode_prefixed(&b[..])),
            FieldValue::Nonce(n) => f.write_str(&hex::encode_prefixed(n.as_slice())),
            FieldValue::Quantity(q) => write!(f, "{q}"),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Flag(b) => write!(f, "{b}"),
            FieldValue::Hashes(hashes) => write_list(f, hashes),
            FieldValue::Indices(indices) => write_list(f, indices),
            FieldValue::Json(v) => write!(f, "{v}"),
            FieldValue::Step(ctx) => {
                write!(f, "step {} ", ctx.index)?;
                write_step(f, &ctx.step)?;
                if let Some(prev) = &ctx.previous {
                    write!(f, " after ")?;
                    write_step(f, prev)?;
                }
                Ok(())
            }
            FieldValue::Absent => f.write_str("<absent>"),
        }
    }
}

fn write_list<T: Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

fn write_step(f: &mut fmt::Formatter<'_>, step: &OpStepView) -> fmt::Result {
    write!(
        f,
        "{{pc: {}, op: {}, gas: {}, gasCost: {}, depth: {}, refund: {}, stack: ",
        step.pc, step.op, step.gas, step.gas_cost, step.depth, step.refund
    )?;
    write_list(f, &step.stack)?;
    f.write_str("}")
}

impl From<B256> for FieldValue {
    fn from(v: B256) -> Self {
        Self::Hash(v)
    }
}

impl From<Address> for FieldValue {
    fn from(v: Address) -> Self {
        Self::Address(v)
    }
}

impl From<Bloom> for FieldValue {
    fn from(v: Bloom) -> Self {
        Self::Bloom(v)
    }
}

impl From<Bytes> for FieldValue {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}

impl From<B64> for FieldValue {
    fn from(v: B64) -> Self {
        Self::Nonce(v)
    }
}

impl From<U256> for FieldValue {
    fn from(v: U256) -> Self {
        Self::Quantity(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::Number(v)
    }
}

impl From<usize> for FieldValue {
    fn from(v: usize) -> Self {
        Self::Number(v as u64)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<Vec<B256>> for FieldValue {
    fn from(v: Vec<B256>) -> Self {
        Self::Hashes(v)
    }
}

impl From<Vec<u64>> for FieldValue {
    fn from(v: Vec<u64>) -> Self {
        Self::Indices(v)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<StepContext> for FieldValue {
    fn from(v: StepContext) -> Self {
        Self::Step(Box::new(v))
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Absent, Into::into)
    }
}

/// Byte-wise equality of two byte sequences.
pub fn bytes_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
}

/// Ordered accumulator used by the comparators. Every record it emits is
/// prefixed with the path of the record being compared.
#[derive(Debug, Default)]
pub(crate) struct Mismatches {
    prefix: String,
    records: Vec<MismatchRecord>,
}

impl Mismatches {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn path(&self, field: &str) -> String {
        match self.prefix.is_empty() {
            true => field.to_string(),
            false => format!("{}.{field}", self.prefix),
        }
    }

    /// Records `field` if `a != b`.
    pub(crate) fn field<T>(&mut self, field: &str, a: &T, b: &T)
    where
        T: PartialEq + Clone + Into<FieldValue>,
    {
        if a != b {
            self.push(field, a.clone(), b.clone());
        }
    }

    /// Records `field` if the two byte sequences differ in content.
    pub(crate) fn bytes(&mut self, field: &str, a: &Bytes, b: &Bytes) {
        if !bytes_eq(a, b) {
            self.push(field, a.clone(), b.clone());
        }
    }

    pub(crate) fn push(&mut self, field: &str, a: impl Into<FieldValue>, b: impl Into<FieldValue>) {
        let path = self.path(field);
        self.records.push(MismatchRecord::new(path, a, b));
    }

    pub(crate) fn push_record(&mut self, mut record: MismatchRecord) {
        record.field_path = self.path(&record.field_path);
        self.records.push(record);
    }

    /// Runs `f` with `segment` appended to the path prefix.
    pub(crate) fn nested(&mut self, segment: &str, f: impl FnOnce(&mut Self)) {
        let saved = self.prefix.clone();
        self.prefix = self.path(segment);
        f(self);
        self.prefix = saved;
    }

    pub(crate) fn finish(self) -> Vec<MismatchRecord> {
        self.records
    }
}
