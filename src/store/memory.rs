//! In-memory repository: ordered rows behind a lock, same error texts as the PostgreSQL adapter.

use super::query::{compare_values, FindMany, Predicate, SortOrder};
use super::{Record, Repository};
use crate::config::{FieldType, ModelDescriptor};
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use tokio::sync::RwLock;

pub struct MemoryRepository {
    model: ModelDescriptor,
    state: RwLock<State>,
}

struct State {
    rows: Vec<Record>,
    next_id: i64,
}

impl MemoryRepository {
    pub fn new(model: ModelDescriptor) -> Self {
        MemoryRepository {
            model,
            state: RwLock::new(State {
                rows: Vec::new(),
                next_id: 1,
            }),
        }
    }

    fn id_of<'a>(&self, row: &'a Record) -> &'a Value {
        row.get(&self.model.id_field().name).unwrap_or(&Value::Null)
    }

    fn check_unique(&self, rows: &[Record], candidate: &Record, skip: Option<usize>) -> Result<(), StoreError> {
        for field in self.model.scalar_fields().filter(|f| f.unique) {
            let Some(value) = candidate.get(&field.name).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = rows.iter().enumerate().any(|(i, row)| {
                Some(i) != skip
                    && row
                        .get(&field.name)
                        .map(|v| compare_values(v, value) == Ordering::Equal)
                        .unwrap_or(false)
            });
            if taken {
                return Err(StoreError::UniqueViolation(vec![field.name.clone()]));
            }
        }
        Ok(())
    }
}

fn matches(row: &Record, predicate: &Predicate) -> bool {
    let get = |f: &str| row.get(f).unwrap_or(&Value::Null);
    let cmp = |f: &str, v: &Value| {
        let current = get(f);
        (!current.is_null()).then(|| compare_values(current, v))
    };
    match predicate {
        Predicate::Eq(f, v) => compare_values(get(f), v) == Ordering::Equal,
        Predicate::Ne(f, v) => compare_values(get(f), v) != Ordering::Equal,
        Predicate::Contains(f, needle) => match get(f) {
            Value::Null => false,
            Value::String(s) => s.to_lowercase().contains(&needle.to_lowercase()),
            other => other.to_string().to_lowercase().contains(&needle.to_lowercase()),
        },
        Predicate::Gt(f, v) => cmp(f, v) == Some(Ordering::Greater),
        Predicate::Gte(f, v) => matches!(cmp(f, v), Some(Ordering::Greater | Ordering::Equal)),
        Predicate::Lt(f, v) => cmp(f, v) == Some(Ordering::Less),
        Predicate::Lte(f, v) => matches!(cmp(f, v), Some(Ordering::Less | Ordering::Equal)),
        Predicate::In(f, vs) => vs.iter().any(|v| compare_values(get(f), v) == Ordering::Equal),
        Predicate::IsNull(f) => get(f).is_null(),
        Predicate::And(ps) => ps.iter().all(|p| matches(row, p)),
        Predicate::Or(ps) => ps.iter().any(|p| matches(row, p)),
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_one(&self, id: &Value) -> Result<Option<Record>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .rows
            .iter()
            .find(|row| compare_values(self.id_of(row), id) == Ordering::Equal)
            .cloned())
    }

    async fn find_many(&self, args: &FindMany) -> Result<Vec<Record>, StoreError> {
        let state = self.state.read().await;
        let mut rows: Vec<&Record> = state
            .rows
            .iter()
            .filter(|row| args.predicate.as_ref().map(|p| matches(row, p)).unwrap_or(true))
            .collect();
        if !args.order_by.is_empty() {
            rows.sort_by(|a, b| {
                args.order_by.iter().fold(Ordering::Equal, |acc, key| {
                    acc.then_with(|| {
                        let ord = compare_values(
                            a.get(&key.field).unwrap_or(&Value::Null),
                            b.get(&key.field).unwrap_or(&Value::Null),
                        );
                        match key.order {
                            SortOrder::Asc => ord,
                            SortOrder::Desc => ord.reverse(),
                        }
                    })
                })
            });
        }
        Ok(rows
            .into_iter()
            .skip(args.skip as usize)
            .take(args.take as usize)
            .cloned()
            .collect())
    }

    async fn create(&self, data: &Record) -> Result<Record, StoreError> {
        let mut state = self.state.write().await;
        let mut row = Record::new();
        for field in self.model.scalar_fields() {
            let value = data.get(&field.name).filter(|v| !v.is_null()).cloned();
            let value = match value {
                Some(v) => v,
                None if field.is_id && field.has_default => match field.field_type {
                    FieldType::Int | FieldType::BigInt => Value::from(state.next_id),
                    _ => Value::String(uuid::Uuid::new_v4().to_string()),
                },
                None if field.default.is_some() => field.default.clone().unwrap_or(Value::Null),
                None if field.has_default && field.field_type == FieldType::DateTime => {
                    Value::String(chrono::Utc::now().to_rfc3339())
                }
                None if field.required && !field.has_default => {
                    return Err(StoreError::MissingArgument(field.name.clone()));
                }
                None => Value::Null,
            };
            row.insert(field.name.clone(), value);
        }
        self.check_unique(&state.rows, &row, None)?;
        if let Some(next) = self.id_of(&row).as_i64().and_then(|n| n.checked_add(1)) {
            state.next_id = state.next_id.max(next);
        }
        state.rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: &Value, data: &Record) -> Result<Record, StoreError> {
        let mut state = self.state.write().await;
        let index = state
            .rows
            .iter()
            .position(|row| compare_values(self.id_of(row), id) == Ordering::Equal)
            .ok_or(StoreError::RecordNotFound("update"))?;
        let mut row = state.rows[index].clone();
        for field in self.model.scalar_fields().filter(|f| !f.is_id) {
            if let Some(v) = data.get(&field.name) {
                if v.is_null() && field.required {
                    return Err(StoreError::MissingArgument(field.name.clone()));
                }
                row.insert(field.name.clone(), v.clone());
            }
        }
        self.check_unique(&state.rows, &row, Some(index))?;
        state.rows[index] = row.clone();
        Ok(row)
    }

    async fn delete(&self, id: &Value) -> Result<Record, StoreError> {
        let mut state = self.state.write().await;
        let index = state
            .rows
            .iter()
            .position(|row| compare_values(self.id_of(row), id) == Ordering::Equal)
            .ok_or(StoreError::RecordNotFound("delete"))?;
        Ok(state.rows.remove(index))
    }
}
