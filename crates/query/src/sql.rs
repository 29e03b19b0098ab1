//! Postgres compilation of predicates and query plans.
//!
//! Output is a parameterised fragment using `$n` placeholders; values are
//! never spliced into the SQL text. Table and column names come from static
//! schemas only.

use crate::page::QueryPlan;
use crate::predicate::{FieldRef, Predicate};
use crate::schema::{EntitySchema, FieldKind};
use crate::value::Value;

pub const ROOT_ALIAS: &str = "t";

#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Select and count statements for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    pub select: SqlFragment,
    pub count: SqlFragment,
}

pub fn compile_where(predicate: &Predicate) -> SqlFragment {
    let mut compiler = Compiler::default();
    let sql = compiler.predicate(predicate);
    SqlFragment {
        sql,
        params: compiler.params,
    }
}

pub fn compile_page(plan: &QueryPlan) -> PageQuery {
    let schema = plan.schema;
    let filter = compile_where(&plan.predicate);
    let columns = select_columns(schema);

    let order_by = plan
        .sort
        .iter()
        .map(|key| {
            format!(
                "{ROOT_ALIAS}.{} {}",
                key.field.column,
                key.direction.as_sql()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    let select = format!(
        "SELECT {columns} FROM {} {ROOT_ALIAS} WHERE {} ORDER BY {order_by} LIMIT {} OFFSET {}",
        schema.table, filter.sql, plan.limit, plan.offset
    );
    let count = format!(
        "SELECT COUNT(*) FROM {} {ROOT_ALIAS} WHERE {}",
        schema.table, filter.sql
    );

    PageQuery {
        select: SqlFragment {
            sql: select,
            params: filter.params.clone(),
        },
        count: SqlFragment {
            sql: count,
            params: filter.params,
        },
    }
}

/// Root-level scalar columns, qualified with the root alias.
pub fn select_columns(schema: &'static EntitySchema) -> String {
    schema
        .scalar_fields()
        .map(|f| format!("{ROOT_ALIAS}.{}", f.column))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Column rendered as text the way `Value::to_text` renders the same kind.
///
/// Floats go through `NUMERIC` so they never print in exponent form; values
/// needing more than 15 significant digits can still differ from Rust's
/// shortest round-trip output.
fn text_form(kind: &FieldKind, col: &str) -> String {
    match kind {
        FieldKind::Float => format!("CAST(CAST({col} AS NUMERIC) AS TEXT)"),
        FieldKind::Timestamp => format!(
            "to_char({col} AT TIME ZONE 'UTC', 'YYYY-MM-DD\"T\"HH24:MI:SS.US\"+00:00\"')"
        ),
        _ => format!("CAST({col} AS TEXT)"),
    }
}

/// Escape `%`, `_` and `\` for use inside a `LIKE` pattern.
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[derive(Default)]
struct Compiler {
    params: Vec<Value>,
    subqueries: usize,
}

impl Compiler {
    fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    fn predicate(&mut self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::True => "TRUE".to_string(),
            Predicate::And(clauses) if clauses.is_empty() => "TRUE".to_string(),
            Predicate::And(clauses) => clauses
                .iter()
                .map(|c| format!("({})", self.predicate(c)))
                .collect::<Vec<_>>()
                .join(" AND "),
            Predicate::Compare { field, op, value } => self.leaf(field, |c, col| {
                let p = c.bind(value.clone());
                format!("{col} {} {p}", op.as_sql())
            }),
            Predicate::Between { field, low, high } => self.leaf(field, |c, col| {
                let lo = c.bind(low.clone());
                let hi = c.bind(high.clone());
                format!("{col} BETWEEN {lo} AND {hi}")
            }),
            Predicate::In {
                field,
                values,
                include_null,
                negated,
            } => self.leaf(field, |c, col| {
                let list = values
                    .iter()
                    .map(|v| c.bind(v.clone()))
                    .collect::<Vec<_>>()
                    .join(", ");
                match (values.is_empty(), *include_null, *negated) {
                    (true, true, false) => format!("{col} IS NULL"),
                    (true, _, true) => format!("{col} IS NOT NULL"),
                    (true, false, false) => "FALSE".to_string(),
                    (false, true, false) => format!("({col} IS NULL OR {col} IN ({list}))"),
                    (false, true, true) => format!("({col} IS NOT NULL AND {col} NOT IN ({list}))"),
                    (false, false, false) => format!("{col} IN ({list})"),
                    (false, false, true) => format!("{col} NOT IN ({list})"),
                }
            }),
            Predicate::Like { field, needle } => self.leaf(field, |c, col| {
                let p = c.bind(Value::Text(format!("%{}%", escape_like(needle))));
                format!(
                    "LOWER({}) LIKE {p} ESCAPE '\\'",
                    text_form(field.kind(), col)
                )
            }),
            Predicate::IsNull { field, negated } => self.leaf(field, |_, col| {
                if *negated {
                    format!("{col} IS NOT NULL")
                } else {
                    format!("{col} IS NULL")
                }
            }),
        }
    }

    /// Compile a leaf. Root fields are referenced directly; relation paths
    /// become a correlated `EXISTS` over a LEFT JOIN chain, so an empty
    /// relation still yields one null row.
    fn leaf(&mut self, field: &FieldRef, body: impl FnOnce(&mut Self, &str) -> String) -> String {
        if field.is_root_level() {
            let col = format!("{ROOT_ALIAS}.{}", field.field.column);
            return body(self, &col);
        }

        let n = self.subqueries;
        self.subqueries += 1;

        let mut joins = String::new();
        let mut owner_alias = ROOT_ALIAS.to_string();
        let mut owner_schema = field.root;
        for (depth, relation) in field.relations.iter().enumerate() {
            let FieldKind::Relation(rel) = relation.kind else {
                continue;
            };
            let link = format!("j{n}_l{depth}");
            let target = format!("j{n}_t{depth}");
            joins.push_str(&format!(
                " LEFT JOIN {} {link} ON {link}.{} = {owner_alias}.{}",
                rel.join.table,
                rel.join.owner_column,
                owner_schema.id_column()
            ));
            joins.push_str(&format!(
                " LEFT JOIN {} {target} ON {target}.{} = {link}.{}",
                rel.target.table,
                rel.target.id_column(),
                rel.join.target_column
            ));
            owner_alias = target;
            owner_schema = rel.target;
        }

        let col = format!("{owner_alias}.{}", field.field.column);
        let condition = body(self, &col);
        format!("EXISTS (SELECT 1 FROM (VALUES (1)) AS j{n}(one){joins} WHERE {condition})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterCriterion, PageRequest, SortDirection};
    use crate::operator::FilterOperator;
    use crate::predicate::build_predicate;
    use crate::schema::fixtures::ITEM_SCHEMA;
    use crate::value::NOT_ASSIGNED;

    fn compile(criteria: &[FilterCriterion]) -> SqlFragment {
        compile_where(&build_predicate(&ITEM_SCHEMA, criteria).unwrap())
    }

    #[test]
    fn empty_predicate_is_true() {
        let frag = compile(&[]);
        assert_eq!(frag.sql, "TRUE");
        assert!(frag.params.is_empty());
    }

    #[test]
    fn root_comparison_binds_value() {
        let frag = compile(&[FilterCriterion::new("count", FilterOperator::GreaterThanOrEquals, ["3"])]);
        assert_eq!(frag.sql, "t.item_count >= $1");
        assert_eq!(frag.params, vec![Value::Int(3)]);
    }

    #[test]
    fn placeholders_are_numbered_across_clauses() {
        let frag = compile(&[
            FilterCriterion::new("name", FilterOperator::Equals, ["a"]),
            FilterCriterion::new("weight", FilterOperator::Between, ["1", "2"]),
        ]);
        assert_eq!(frag.sql, "(t.name = $1) AND (t.weight BETWEEN $2 AND $3)");
        assert_eq!(frag.params.len(), 3);
    }

    #[test]
    fn not_assigned_becomes_null_test() {
        let frag = compile(&[FilterCriterion::new("count", FilterOperator::In, [NOT_ASSIGNED, "5"])]);
        assert_eq!(frag.sql, "(t.item_count IS NULL OR t.item_count IN ($1))");
    }

    #[test]
    fn like_is_lowercased_and_escaped() {
        let frag = compile(&[FilterCriterion::new("name", FilterOperator::Like, ["50%_Off"])]);
        assert_eq!(frag.sql, "LOWER(CAST(t.name AS TEXT)) LIKE $1 ESCAPE '\\'");
        assert_eq!(frag.params, vec![Value::Text("%50\\%\\_off%".into())]);
    }

    #[test]
    fn like_renders_numbers_and_timestamps_like_the_in_memory_text() {
        let frag = compile(&[FilterCriterion::new("weight", FilterOperator::Like, ["15"])]);
        assert_eq!(
            frag.sql,
            "LOWER(CAST(CAST(t.weight AS NUMERIC) AS TEXT)) LIKE $1 ESCAPE '\\'"
        );

        let frag = compile(&[FilterCriterion::new("createdAt", FilterOperator::Like, ["2024-01"])]);
        assert!(frag.sql.starts_with("LOWER(to_char(t.created_at AT TIME ZONE 'UTC', "));
        assert!(frag.sql.contains("SS.US"));
    }

    #[test]
    fn relation_path_compiles_to_exists_over_left_joins() {
        let frag = compile(&[FilterCriterion::new("groups.tags.label", FilterOperator::Equals, ["red"])]);
        assert_eq!(
            frag.sql,
            "EXISTS (SELECT 1 FROM (VALUES (1)) AS j0(one) \
             LEFT JOIN items_groups j0_l0 ON j0_l0.item_id = t.id \
             LEFT JOIN groups j0_t0 ON j0_t0.id = j0_l0.group_id \
             LEFT JOIN groups_tags j0_l1 ON j0_l1.group_id = j0_t0.id \
             LEFT JOIN tags j0_t1 ON j0_t1.id = j0_l1.tag_id \
             WHERE j0_t1.label = $1)"
        );
    }

    #[test]
    fn page_query_orders_and_limits() {
        let req = PageRequest::new(2, 10, "name", SortDirection::Desc);
        let plan = QueryPlan::build(&ITEM_SCHEMA, &req).unwrap();
        let query = compile_page(&plan);
        assert!(query.select.sql.starts_with("SELECT t.id, t.name, t.active, t.item_count, t.weight, t.created_at FROM items t"));
        assert!(query.select.sql.ends_with("ORDER BY t.name DESC, t.id ASC LIMIT 10 OFFSET 20"));
        assert_eq!(query.count.sql, "SELECT COUNT(*) FROM items t WHERE TRUE");
    }
}
