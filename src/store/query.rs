//! Store-agnostic query arguments: predicate fragments, sort keys, paging.

use serde_json::Value;
use std::cmp::Ordering;

/// Query-predicate fragment produced by filters and combined by the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Eq(String, Value),
    Ne(String, Value),
    /// Case-insensitive substring match on the field's text form.
    Contains(String, String),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    IsNull(String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Field names referenced anywhere in the predicate.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Eq(f, _)
            | Predicate::Ne(f, _)
            | Predicate::Contains(f, _)
            | Predicate::Gt(f, _)
            | Predicate::Gte(f, _)
            | Predicate::Lt(f, _)
            | Predicate::Lte(f, _)
            | Predicate::In(f, _)
            | Predicate::IsNull(f) => out.push(f),
            Predicate::And(ps) | Predicate::Or(ps) => ps.iter().for_each(|p| p.collect_fields(out)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub order: SortOrder,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindMany {
    pub predicate: Option<Predicate>,
    pub order_by: Vec<SortKey>,
    pub skip: u64,
    pub take: u64,
}

/// Total order over JSON scalars: null < bool < number < string < other.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)).then_with(|| a.to_string().cmp(&b.to_string())),
    }
}
