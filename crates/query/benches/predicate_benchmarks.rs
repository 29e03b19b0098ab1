use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use storehub_query::sql::compile_where;
use storehub_query::{
    build_predicate, EntitySchema, Field, FieldDef, FieldKind, FilterCriterion, FilterOperator,
    IntWidth, PageRequest, QueryPlan, Record, SortDirection, NOT_ASSIGNED,
};

static ROW_SCHEMA: EntitySchema = EntitySchema {
    entity: "Row",
    table: "rows",
    fields: &[
        FieldDef::new("id", "id", FieldKind::Integer(IntWidth::Int64)),
        FieldDef::new("name", "name", FieldKind::Text),
        FieldDef::new("quantity", "quantity", FieldKind::Integer(IntWidth::Int32)),
        FieldDef::new("price", "price", FieldKind::Float),
    ],
};

#[derive(Debug, Clone)]
struct Row {
    id: i64,
    name: String,
    quantity: Option<i32>,
    price: f64,
}

impl Record for Row {
    fn field(&self, name: &str) -> Field<'_> {
        match name {
            "id" => Field::Value(self.id.into()),
            "name" => Field::Value(self.name.as_str().into()),
            "quantity" => Field::Value(self.quantity.into()),
            "price" => Field::Value(self.price.into()),
            _ => Field::Missing,
        }
    }
}

fn rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| Row {
            id: i as i64,
            name: format!("product-{i}"),
            quantity: (i % 7 != 0).then_some((i % 50) as i32),
            price: (i % 100) as f64 * 1.25,
        })
        .collect()
}

fn criteria() -> Vec<FilterCriterion> {
    vec![
        FilterCriterion::new("name", FilterOperator::Like, ["product-1"]),
        FilterCriterion::new("price", FilterOperator::Between, ["10", "90"]),
        FilterCriterion::new("quantity", FilterOperator::In, [NOT_ASSIGNED, "3", "12", "40"]),
    ]
}

fn bench_build(c: &mut Criterion) {
    let criteria = criteria();
    c.bench_function("build_predicate", |b| {
        b.iter(|| build_predicate(&ROW_SCHEMA, black_box(&criteria)).unwrap())
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("predicate_evaluation");
    let predicate = build_predicate(&ROW_SCHEMA, &criteria()).unwrap();

    for size in [100usize, 1_000, 10_000] {
        let data = rows(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("matches", size), &data, |b, data| {
            b.iter(|| data.iter().filter(|r| predicate.matches(*r)).count())
        });
    }
    group.finish();
}

fn bench_page(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_plan");
    let request = PageRequest::new(3, 20, "price", SortDirection::Desc).with_filters(criteria());
    let plan = QueryPlan::build(&ROW_SCHEMA, &request).unwrap();

    for size in [1_000usize, 10_000] {
        let data = rows(size);
        group.bench_with_input(BenchmarkId::new("apply", size), &data, |b, data| {
            b.iter(|| plan.apply(data.iter().cloned()).total)
        });
    }
    group.bench_function("compile_sql", |b| b.iter(|| compile_where(black_box(&plan.predicate))));
    group.finish();
}

criterion_group!(benches, bench_build, bench_evaluate, bench_page);
criterion_main!(benches);
