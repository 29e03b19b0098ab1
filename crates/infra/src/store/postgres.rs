//! Postgres-backed product store.
//!
//! Predicates and page plans are compiled by `storehub_query::sql` and run
//! through a shared `sqlx` pool. Calls block on the runtime handle given at
//! construction, so they must come from a multi-threaded tokio runtime.

use std::future::Future;
use std::sync::Arc;

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use tokio::runtime::Handle;
use tracing::debug;

use storehub_core::ProductId;
use storehub_products::{Category, Product, PRODUCT_SCHEMA};
use storehub_query::sql::{compile_page, compile_where, select_columns, SqlFragment, ROOT_ALIAS};
use storehub_query::{Predicate, QueryPlan, Slice, Value};

use super::{EntityStore, StoreError, StoreResult};

const UNIQUE_VIOLATION: &str = "23505";

pub struct PostgresProductStore {
    pool: Arc<PgPool>,
    handle: Handle,
}

impl PostgresProductStore {
    pub fn new(pool: PgPool, handle: Handle) -> Self {
        Self {
            pool: Arc::new(pool),
            handle,
        }
    }

    /// Connect using the current runtime.
    pub fn connect(database_url: &str) -> StoreResult<Self> {
        let handle = Handle::try_current().map_err(|e| StoreError::Backend(e.to_string()))?;
        let pool = tokio::task::block_in_place(|| handle.block_on(PgPool::connect(database_url)))
            .map_err(backend)?;
        Ok(Self::new(pool, handle))
    }

    fn block_on<F: Future>(&self, fut: F) -> F::Output {
        tokio::task::block_in_place(|| self.handle.block_on(fut))
    }

    fn fetch_rows(&self, fragment: SqlFragment) -> StoreResult<Vec<Product>> {
        debug!(sql = %fragment.sql, params = fragment.params.len(), "product query");
        let pool = self.pool.clone();
        let rows = self.block_on(async move {
            bind_all(sqlx::query(&fragment.sql), &fragment.params)
                .fetch_all(&*pool)
                .await
        });
        rows.map_err(backend)?.iter().map(product_from_row).collect()
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[Value],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param.clone() {
            Value::Null => query.bind(Option::<String>::None),
            Value::Uuid(v) => query.bind(v),
            Value::Text(v) => query.bind(v),
            Value::Bool(v) => query.bind(v),
            Value::Int(v) => query.bind(v),
            Value::Float(v) => query.bind(v),
            Value::Timestamp(v) => query.bind(v),
        };
    }
    query
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    let category: String = row.try_get("category").map_err(backend)?;
    let category = category
        .parse::<Category>()
        .map_err(|e| StoreError::Backend(e.to_string()))?;
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<uuid::Uuid, _>("id").map_err(backend)?),
        name: row.try_get("name").map_err(backend)?,
        description: row.try_get("description").map_err(backend)?,
        category,
        price: row.try_get("price").map_err(backend)?,
        quantity: row.try_get("quantity").map_err(backend)?,
        discount: row.try_get("discount").map_err(backend)?,
    })
}

impl EntityStore<Product> for PostgresProductStore {
    fn find_by_id(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        let sql = format!(
            "SELECT {} FROM {} {ROOT_ALIAS} WHERE {ROOT_ALIAS}.id = $1",
            select_columns(&PRODUCT_SCHEMA),
            PRODUCT_SCHEMA.table
        );
        let rows = self.fetch_rows(SqlFragment {
            sql,
            params: vec![Value::Uuid(*id.as_uuid())],
        })?;
        Ok(rows.into_iter().next())
    }

    fn exists_by_id(&self, id: &ProductId) -> StoreResult<bool> {
        Ok(self.find_by_id(id)?.is_some())
    }

    fn delete_by_id(&self, id: &ProductId) -> StoreResult<bool> {
        let pool = self.pool.clone();
        let id = *id.as_uuid();
        let result = self.block_on(async move {
            sqlx::query("DELETE FROM products WHERE id = $1")
                .bind(id)
                .execute(&*pool)
                .await
        });
        Ok(result.map_err(backend)?.rows_affected() > 0)
    }

    fn save(&self, product: Product) -> StoreResult<Product> {
        let pool = self.pool.clone();
        let row = product.clone();
        let result = self.block_on(async move {
            sqlx::query(
                r#"
                INSERT INTO products (id, name, description, category, price, quantity, discount)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (id)
                DO UPDATE SET
                    name = EXCLUDED.name,
                    description = EXCLUDED.description,
                    category = EXCLUDED.category,
                    price = EXCLUDED.price,
                    quantity = EXCLUDED.quantity,
                    discount = EXCLUDED.discount
                "#,
            )
            .bind(*row.id.as_uuid())
            .bind(&row.name)
            .bind(&row.description)
            .bind(row.category.as_str())
            .bind(row.price)
            .bind(row.quantity)
            .bind(row.discount)
            .execute(&*pool)
            .await
        });

        match result {
            Ok(_) => Ok(product),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Err(StoreError::UniqueViolation {
                    entity: "Product",
                    field: "name",
                    value: product.name,
                })
            }
            Err(e) => Err(backend(e)),
        }
    }

    fn find_all(&self, predicate: &Predicate) -> StoreResult<Vec<Product>> {
        let filter = compile_where(predicate);
        let sql = format!(
            "SELECT {} FROM {} {ROOT_ALIAS} WHERE {} ORDER BY {ROOT_ALIAS}.id ASC",
            select_columns(&PRODUCT_SCHEMA),
            PRODUCT_SCHEMA.table,
            filter.sql
        );
        self.fetch_rows(SqlFragment {
            sql,
            params: filter.params,
        })
    }

    fn find_page(&self, plan: &QueryPlan) -> StoreResult<Slice<Product>> {
        let query = compile_page(plan);
        let content = self.fetch_rows(query.select)?;

        let pool = self.pool.clone();
        let count = query.count;
        let total: i64 = self
            .block_on(async move {
                bind_all(sqlx::query(&count.sql), &count.params)
                    .fetch_one(&*pool)
                    .await
                    .and_then(|row| row.try_get::<i64, _>(0))
            })
            .map_err(backend)?;

        Ok(Slice {
            content,
            total: u64::try_from(total).unwrap_or(0),
        })
    }
}
