//! Seeding helpers for unit tests

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::models::{CustomerType, OrderCreate, OrderStatus};
use sqlx::SqlitePool;

use crate::db::repository::order;

#[derive(Debug, Clone)]
pub struct OrderSeed {
    pub total: Decimal,
    pub branch: Option<i64>,
    pub manager: Option<i64>,
    pub status: OrderStatus,
    pub customer_type: Option<CustomerType>,
    pub doc_type: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub created_at: i64,
    pub client_name: String,
    pub client_phone: Option<String>,
}

impl OrderSeed {
    pub fn new(total: &str) -> Self {
        Self {
            total: total.parse().expect("decimal literal"),
            branch: None,
            manager: None,
            status: OrderStatus::NotStarted,
            customer_type: None,
            doc_type: None,
            deadline: None,
            created_at: 1_767_225_600_000, // 2026-01-01T00:00:00Z
            client_name: "Test Client".into(),
            client_phone: None,
        }
    }

    pub fn branch(mut self, id: i64) -> Self {
        self.branch = Some(id);
        self
    }

    pub fn manager(mut self, id: i64) -> Self {
        self.manager = Some(id);
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn customer_type(mut self, customer_type: CustomerType) -> Self {
        self.customer_type = Some(customer_type);
        self
    }

    pub fn doc_type(mut self, doc_type: &str) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    pub fn deadline(mut self, date: &str) -> Self {
        self.deadline = Some(date.parse().expect("date literal"));
        self
    }

    pub fn created_at(mut self, millis: i64) -> Self {
        self.created_at = millis;
        self
    }

    pub fn client(mut self, name: &str, phone: Option<&str>) -> Self {
        self.client_name = name.into();
        self.client_phone = phone.map(Into::into);
        self
    }
}

/// Millis for a UTC date-time
pub fn utc_millis(date: &str, hour: u32) -> i64 {
    date.parse::<NaiveDate>()
        .expect("date literal")
        .and_hms_opt(hour, 0, 0)
        .expect("valid hour")
        .and_utc()
        .timestamp_millis()
}

/// Insert an order (plus any branch/employee/client it references)
pub async fn seed_order(pool: &SqlitePool, seed: OrderSeed) -> i64 {
    if let Some(branch) = seed.branch {
        sqlx::query("INSERT OR IGNORE INTO branch (id, name) VALUES (?, ?)")
            .bind(branch)
            .bind(format!("Branch {branch}"))
            .execute(pool)
            .await
            .unwrap();
    }
    if let Some(manager) = seed.manager {
        sqlx::query(
            "INSERT OR IGNORE INTO employee (id, username, display_name, role, branch_id) VALUES (?, ?, ?, 'manager', ?)",
        )
        .bind(manager)
        .bind(format!("manager{manager}"))
        .bind(format!("Manager {manager}"))
        .bind(seed.branch)
        .execute(pool)
        .await
        .unwrap();
    }
    let client_id: i64 =
        sqlx::query_scalar("INSERT INTO client (full_name, phone) VALUES (?, ?) RETURNING id")
            .bind(&seed.client_name)
            .bind(&seed.client_phone)
            .fetch_one(pool)
            .await
            .unwrap();

    let data = OrderCreate {
        client_id,
        branch_id: seed.branch,
        manager_id: seed.manager,
        status: seed.status,
        customer_type: seed.customer_type,
        doc_type: seed.doc_type,
        country: None,
        payment_method: None,
        deadline: seed.deadline,
        total_amount: seed.total,
        notes: None,
    };
    order::create(pool, &data, seed.created_at).await.unwrap().id
}
