use crate::model::{NewOrder, Order, OrderChanges};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use shared::db::{Assignments, Database, DbError};
use shared::time::timestamp_now;
use uuid::Uuid;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS orders (
    id TEXT PRIMARY KEY NOT NULL,
    project_id TEXT NOT NULL,
    batch_id TEXT NOT NULL,
    buyer_name TEXT NOT NULL,
    qty_tons REAL NOT NULL,
    total REAL NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    processed_at TEXT
);
CREATE INDEX IF NOT EXISTS orders_project_id ON orders (project_id);
";

const COLUMNS: &str =
    "id, project_id, batch_id, buyer_name, qty_tons, total, status, created_at, processed_at";

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        project_id: row.get(1)?,
        batch_id: row.get(2)?,
        buyer_name: row.get(3)?,
        qty_tons: row.get(4)?,
        total: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        processed_at: row.get(8)?,
    })
}

fn select_order(conn: &Connection, id: &str) -> rusqlite::Result<Option<Order>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM orders WHERE id = ?1"),
        [id],
        order_from_row,
    )
    .optional()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub project_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Clone)]
pub struct OrderStore {
    db: Database,
}

impl OrderStore {
    /// Wraps `db`, creating the table and index if they are missing.
    pub async fn open(db: Database) -> Result<Self, DbError> {
        db.call(|conn| conn.execute_batch(SCHEMA)).await?;
        Ok(OrderStore { db })
    }

    pub async fn create(&self, new: NewOrder) -> Result<Order, DbError> {
        let order = Order {
            id: Uuid::new_v4().to_string(),
            project_id: new.project_id,
            batch_id: new.batch_id,
            buyer_name: new.buyer_name,
            qty_tons: new.qty_tons,
            total: new.total,
            status: new.status,
            created_at: timestamp_now(),
            processed_at: None,
        };

        let row = order.clone();
        self.db
            .call(move |conn| {
                conn.execute(
                    &format!("INSERT INTO orders ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
                    params![
                        row.id,
                        row.project_id,
                        row.batch_id,
                        row.buyer_name,
                        row.qty_tons,
                        row.total,
                        row.status,
                        row.created_at,
                        row.processed_at
                    ],
                )
            })
            .await?;
        Ok(order)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Order>, DbError> {
        let id = id.to_string();
        self.db.call(move |conn| select_order(conn, &id)).await
    }

    /// Newest first. Orders created within the same millisecond keep their
    /// insertion order, reversed.
    pub async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>, DbError> {
        self.db
            .call(move |conn| {
                let mut conditions = Vec::new();
                let mut values = Vec::new();
                if let Some(project_id) = filter.project_id {
                    conditions.push("project_id = ?");
                    values.push(SqlValue::Text(project_id));
                }
                if let Some(status) = filter.status {
                    conditions.push("status = ?");
                    values.push(SqlValue::Text(status));
                }
                let where_clause = if conditions.is_empty() {
                    String::new()
                } else {
                    format!(" WHERE {}", conditions.join(" AND "))
                };

                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM orders{where_clause} ORDER BY created_at DESC, rowid DESC"
                ))?;
                let orders = stmt
                    .query_map(params_from_iter(values), order_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(orders)
            })
            .await
    }

    pub async fn update(&self, id: Uuid, changes: OrderChanges) -> Result<Option<Order>, DbError> {
        let id = id.to_string();
        let mut assignments = Assignments::default();
        assignments.set("project_id", changes.project_id.map(SqlValue::Text));
        assignments.set("batch_id", changes.batch_id.map(SqlValue::Text));
        assignments.set("buyer_name", changes.buyer_name.map(SqlValue::Text));
        assignments.set("qty_tons", changes.qty_tons.map(SqlValue::Real));
        assignments.set("total", changes.total.map(SqlValue::Real));
        assignments.set("status", changes.status.map(SqlValue::Text));
        assignments.set(
            "processed_at",
            changes
                .processed_at
                .map(|at| at.map_or(SqlValue::Null, SqlValue::Text)),
        );

        self.db
            .call(move |conn| {
                assignments.apply(conn, "orders", &id)?;
                select_order(conn, &id)
            })
            .await
    }

    /// Returns whether an order was removed.
    pub async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let id = id.to_string();
        let deleted = self
            .db
            .call(move |conn| conn.execute("DELETE FROM orders WHERE id = ?1", [id]))
            .await?;
        Ok(deleted > 0)
    }
}
