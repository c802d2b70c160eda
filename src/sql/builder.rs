//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from a model descriptor.

use crate::config::{FieldDescriptor, ModelDescriptor};
use crate::store::{FindMany, Predicate, SortOrder};
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from schema).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
fn qualified_table(model: &ModelDescriptor) -> String {
    format!("{}.{}", quoted(&model.schema_name), quoted(&model.table_name))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    /// Push a value and return its placeholder, cast to the field's database type.
    fn placeholder(&mut self, field: &FieldDescriptor, v: Value) -> String {
        let n = self.push_param(v);
        placeholder_for(field, n)
    }
}

fn placeholder_for(field: &FieldDescriptor, n: u32) -> String {
    field
        .cast()
        .map(|t| format!("${}::{}", n, t))
        .unwrap_or_else(|| format!("${}", n))
}

/// SELECT list: scalar columns as-is, except custom types (schema.typename) and numeric as col::text.
fn select_column_list(model: &ModelDescriptor) -> String {
    model
        .scalar_fields()
        .map(|f| {
            let q = quoted(&f.name);
            let cast = f.cast().unwrap_or("");
            if cast.contains('.') || cast == "numeric" {
                format!("{}::text AS {}", q, q)
            } else {
                q
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn scalar<'a>(model: &'a ModelDescriptor, name: &str) -> Option<&'a FieldDescriptor> {
    model.field(name).filter(|f| !f.is_relation())
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Render a predicate into `q`, returning the SQL condition. Fields outside the model render as FALSE.
fn render_predicate(q: &mut QueryBuf, model: &ModelDescriptor, p: &Predicate) -> String {
    let compare = |q: &mut QueryBuf, f: &str, op: &str, v: &Value| match scalar(model, f) {
        Some(field) => {
            let ph = q.placeholder(field, v.clone());
            format!("{} {} {}", quoted(f), op, ph)
        }
        None => unknown_field(model, f),
    };
    match p {
        Predicate::Eq(f, Value::Null) | Predicate::IsNull(f) => match scalar(model, f) {
            Some(_) => format!("{} IS NULL", quoted(f)),
            None => unknown_field(model, f),
        },
        Predicate::Eq(f, v) => compare(q, f, "=", v),
        Predicate::Ne(f, v) => compare(q, f, "IS DISTINCT FROM", v),
        Predicate::Gt(f, v) => compare(q, f, ">", v),
        Predicate::Gte(f, v) => compare(q, f, ">=", v),
        Predicate::Lt(f, v) => compare(q, f, "<", v),
        Predicate::Lte(f, v) => compare(q, f, "<=", v),
        Predicate::Contains(f, needle) => match scalar(model, f) {
            Some(_) => {
                let n = q.push_param(Value::String(format!("%{}%", escape_like(needle))));
                format!("{}::text ILIKE ${}", quoted(f), n)
            }
            None => unknown_field(model, f),
        },
        Predicate::In(f, values) => match scalar(model, f) {
            Some(_) if values.is_empty() => "FALSE".into(),
            Some(field) => {
                let phs: Vec<String> = values.iter().map(|v| q.placeholder(field, v.clone())).collect();
                format!("{} IN ({})", quoted(f), phs.join(", "))
            }
            None => unknown_field(model, f),
        },
        Predicate::And(ps) if ps.is_empty() => "TRUE".into(),
        Predicate::Or(ps) if ps.is_empty() => "FALSE".into(),
        Predicate::And(ps) => join_predicates(q, model, ps, " AND "),
        Predicate::Or(ps) => join_predicates(q, model, ps, " OR "),
    }
}

fn join_predicates(q: &mut QueryBuf, model: &ModelDescriptor, ps: &[Predicate], sep: &str) -> String {
    let parts: Vec<String> = ps.iter().map(|p| render_predicate(q, model, p)).collect();
    format!("({})", parts.join(sep))
}

fn unknown_field(model: &ModelDescriptor, field: &str) -> String {
    tracing::warn!(model = %model.name, field = %field, "predicate on unknown field");
    "FALSE".into()
}

/// SELECT by primary key. Caller adds id as sole param.
pub fn select_by_id(model: &ModelDescriptor) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id = model.id_field();
    let ph = placeholder_for(id, 1);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(model),
        qualified_table(model),
        quoted(&id.name),
        ph
    );
    q
}

/// SELECT list with optional predicate, ORDER BY sort keys (id when none), LIMIT/OFFSET.
pub fn select_many(model: &ModelDescriptor, args: &FindMany) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = args
        .predicate
        .as_ref()
        .map(|p| format!(" WHERE {}", render_predicate(&mut q, model, p)))
        .unwrap_or_default();

    let mut order: Vec<String> = args
        .order_by
        .iter()
        .filter(|k| scalar(model, &k.field).is_some())
        .map(|k| {
            let dir = match k.order {
                SortOrder::Asc => "ASC",
                SortOrder::Desc => "DESC",
            };
            format!("{} {}", quoted(&k.field), dir)
        })
        .collect();
    if order.is_empty() {
        order.push(quoted(&model.id_field().name));
    }

    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} LIMIT {} OFFSET {}",
        select_column_list(model),
        qualified_table(model),
        where_clause,
        order.join(", "),
        args.take,
        args.skip
    );
    q
}

/// INSERT only the scalar columns present in `data`; the database fills the rest.
pub fn insert(model: &ModelDescriptor, data: &serde_json::Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(model);
    let returning = select_column_list(model);
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for field in model.scalar_fields() {
        let Some(v) = data.get(&field.name) else { continue };
        cols.push(quoted(&field.name));
        placeholders.push(q.placeholder(field, v.clone()));
    }
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE by id: SET only non-id scalar columns present in `data`.
/// With nothing to set this degrades to a SELECT by id.
pub fn update(model: &ModelDescriptor, id: &Value, data: &serde_json::Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(model);
    let id_field = model.id_field();
    let mut sets = Vec::new();
    for field in model.scalar_fields().filter(|f| !f.is_id) {
        let Some(v) = data.get(&field.name) else { continue };
        let ph = q.placeholder(field, v.clone());
        sets.push(format!("{} = {}", quoted(&field.name), ph));
    }
    let id_ph = q.placeholder(id_field, id.clone());
    let returning = select_column_list(model);
    q.sql = if sets.is_empty() {
        format!(
            "SELECT {} FROM {} WHERE {} = {}",
            returning,
            table,
            quoted(&id_field.name),
            id_ph
        )
    } else {
        format!(
            "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
            table,
            sets.join(", "),
            quoted(&id_field.name),
            id_ph,
            returning
        )
    };
    q
}

/// DELETE by id. Caller adds id as sole param.
pub fn delete(model: &ModelDescriptor) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id = model.id_field();
    let ph = placeholder_for(id, 1);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        qualified_table(model),
        quoted(&id.name),
        ph,
        select_column_list(model)
    );
    q
}
