//! Catalog Store
//!
//! Read-only product queries with filtering, sorting, and fixed-size
//! pagination. Filters compose into one SQL statement via `QueryBuilder`;
//! the same filter set drives both the page query and the total count.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Product;

pub const PAGE_SIZE: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    NameAsc,
    PriceAsc,
    PriceDesc,
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogFilter {
    pub category: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    /// Case-insensitive substring match on the product name.
    pub search: Option<String>,
    /// Absent means insertion order.
    pub sort: Option<SortKey>,
    pub page: Option<u32>,
}

impl CatalogFilter {
    pub fn validate(&self) -> Result<()> {
        if let Some(min) = self.price_min {
            if min < Decimal::ZERO {
                return Err(AppError::Validation("price_min must be non-negative".into()));
            }
        }
        if let (Some(min), Some(max)) = (self.price_min, self.price_max) {
            if max < min {
                return Err(AppError::Validation(
                    "price_max must not be below price_min".into(),
                ));
            }
        }
        Ok(())
    }

    fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &CatalogFilter) {
    if let Some(category) = &filter.category {
        query.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(min) = filter.price_min {
        query.push(" AND selling_price >= ").push_bind(min);
    }
    if let Some(max) = filter.price_max {
        query.push(" AND selling_price <= ").push_bind(max);
    }
    if let Some(search) = &filter.search {
        query.push(" AND name ILIKE ").push_bind(format!("%{search}%"));
    }
}

/// An out-of-range page yields an empty page, not an error.
pub async fn list_products(
    db: &PgPool,
    filter: &CatalogFilter,
) -> Result<PaginatedResponse<Product>> {
    filter.validate()?;
    let page = filter.page();

    let mut query = QueryBuilder::new("SELECT * FROM products WHERE 1=1");
    push_filters(&mut query, filter);
    match filter.sort {
        Some(SortKey::NameAsc) => {
            query.push(" ORDER BY name ASC");
        }
        Some(SortKey::PriceAsc) => {
            query.push(" ORDER BY selling_price ASC");
        }
        Some(SortKey::PriceDesc) => {
            query.push(" ORDER BY selling_price DESC");
        }
        None => {}
    }
    query.push(" LIMIT ").push_bind(PAGE_SIZE);
    query.push(" OFFSET ").push_bind(i64::from(page - 1) * PAGE_SIZE);
    let data = query.build_query_as::<Product>().fetch_all(db).await?;

    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM products WHERE 1=1");
    push_filters(&mut count, filter);
    let total: i64 = count.build_query_scalar().fetch_one(db).await?;

    Ok(PaginatedResponse { data, total, page })
}

pub async fn get_product(db: &PgPool, id: Uuid) -> Result<Product> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound("product".into()))
}
