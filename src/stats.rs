use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::options::FindOptions;
use mongodb::Collection;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};
use crate::models::Product;

/// Products with fewer units than this count as low on stock.
pub const LOW_STOCK_THRESHOLD: i64 = 10;
pub const TOP_PRODUCTS_LIMIT: i64 = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: u64,
    pub total_stock: i64,
    pub total_sales: i64,
    pub low_stock_products: u64,
    pub category_stats: Vec<CategoryStat>,
    pub top_products: Vec<TopProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    #[serde(rename = "_id")]
    pub category: String,
    pub count: i64,
    pub total_sales: i64,
}

#[derive(Debug, Serialize)]
pub struct TopProduct {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub sales: i64,
}

#[derive(Debug, Deserialize)]
struct TopProductRow {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    sales: i64,
}

/// `$group` over the whole collection summing one numeric field.
pub fn sum_pipeline(field: &str) -> Vec<Document> {
    vec![doc! {
        "$group": { "_id": Bson::Null, "total": { "$sum": format!("${}", field) } }
    }]
}

pub fn category_pipeline() -> Vec<Document> {
    vec![
        doc! {
            "$group": {
                "_id": "$category",
                "count": { "$sum": 1 },
                "totalSales": { "$sum": "$sales" },
            }
        },
        doc! { "$sort": { "totalSales": -1 } },
    ]
}

pub fn low_stock_filter() -> Document {
    doc! { "stock": { "$lt": LOW_STOCK_THRESHOLD } }
}

/// Reads a numeric aggregation output regardless of the BSON number type
/// `$sum` produced. Missing or non-numeric values read as zero.
pub fn number(doc: &Document, key: &str) -> i64 {
    match doc.get(key) {
        Some(Bson::Int32(v)) => i64::from(*v),
        Some(Bson::Int64(v)) => *v,
        Some(Bson::Double(v)) => *v as i64,
        _ => 0,
    }
}

/// Total from a single-group pipeline; an empty collection yields no group.
pub fn total(groups: &[Document]) -> i64 {
    groups.first().map(|g| number(g, "total")).unwrap_or(0)
}

pub fn category_stat(group: &Document) -> CategoryStat {
    CategoryStat {
        category: group.get_str("_id").unwrap_or_default().to_string(),
        count: number(group, "count"),
        total_sales: number(group, "totalSales"),
    }
}

async fn aggregate(products: &Collection<Product>, pipeline: Vec<Document>) -> Result<Vec<Document>> {
    let cursor = products.aggregate(pipeline, None).await?;
    Ok(cursor.try_collect().await?)
}

async fn top_products(products: &Collection<Product>) -> Result<Vec<TopProduct>> {
    let options = FindOptions::builder()
        .sort(doc! { "sales": -1 })
        .limit(TOP_PRODUCTS_LIMIT)
        .projection(doc! { "name": 1, "sales": 1 })
        .build();

    let rows: Vec<TopProductRow> = products
        .clone_with_type::<TopProductRow>()
        .find(None, options)
        .await?
        .try_collect()
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| TopProduct {
            id: row.id.to_hex(),
            name: row.name,
            sales: row.sales,
        })
        .collect())
}

/// Runs every dashboard query concurrently.
pub async fn collect(products: &Collection<Product>) -> Result<DashboardStats> {
    let (total_products, stock, sales, low_stock_products, categories, top_products) = futures::try_join!(
        async { Ok::<_, AppError>(products.count_documents(None, None).await?) },
        aggregate(products, sum_pipeline("stock")),
        aggregate(products, sum_pipeline("sales")),
        async { Ok::<_, AppError>(products.count_documents(low_stock_filter(), None).await?) },
        aggregate(products, category_pipeline()),
        top_products(products),
    )?;

    Ok(DashboardStats {
        total_products,
        total_stock: total(&stock),
        total_sales: total(&sales),
        low_stock_products,
        category_stats: categories.iter().map(category_stat).collect(),
        top_products,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_pipeline_groups_everything() {
        let pipeline = sum_pipeline("stock");
        assert_eq!(pipeline.len(), 1);
        let group = pipeline[0].get_document("$group").unwrap();
        assert_eq!(group.get("_id"), Some(&Bson::Null));
        assert_eq!(
            group.get_document("total").unwrap().get_str("$sum").unwrap(),
            "$stock"
        );
    }

    #[test]
    fn category_pipeline_sorts_by_sales() {
        let pipeline = category_pipeline();
        let group = pipeline[0].get_document("$group").unwrap();
        assert_eq!(group.get_str("_id").unwrap(), "$category");
        let sort = pipeline[1].get_document("$sort").unwrap();
        assert_eq!(sort.get_i32("totalSales").unwrap(), -1);
    }

    #[test]
    fn low_stock_is_strictly_below_threshold() {
        let filter = low_stock_filter();
        let stock = filter.get_document("stock").unwrap();
        assert_eq!(stock.get_i64("$lt").unwrap(), LOW_STOCK_THRESHOLD);
    }

    #[test]
    fn totals_accept_any_number_type() {
        assert_eq!(total(&[doc! { "_id": Bson::Null, "total": 7_i32 }]), 7);
        assert_eq!(total(&[doc! { "_id": Bson::Null, "total": 7_i64 }]), 7);
        assert_eq!(total(&[doc! { "_id": Bson::Null, "total": 7.0 }]), 7);
        assert_eq!(total(&[]), 0);
    }

    #[test]
    fn category_group_is_read() {
        let stat = category_stat(&doc! { "_id": "Apparel", "count": 3, "totalSales": 41_i64 });
        assert_eq!(
            stat,
            CategoryStat { category: "Apparel".into(), count: 3, total_sales: 41 }
        );
        let value = serde_json::to_value(&stat).unwrap();
        assert_eq!(value["_id"], "Apparel");
        assert_eq!(value["totalSales"], 41);
    }
}
