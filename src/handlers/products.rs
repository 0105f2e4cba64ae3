use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use serde_json::json;
use validator::Validate;

use crate::db;
use crate::errors::{is_duplicate_key, AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Product, ProductInput, ProductResponse, ProductUpdate};
use crate::query::ProductQuery;
use crate::state::AppState;

fn parse_id(raw: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::BadRequest("Invalid product id".to_string()))
}

fn not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

fn sku_conflict(err: mongodb::error::Error) -> AppError {
    if is_duplicate_key(&err) {
        AppError::Duplicate("SKU already exists".to_string())
    } else {
        AppError::Database(err)
    }
}

pub async fn list_products(
    _admin: RequireAdmin,
    state: web::Data<AppState>,
    query: web::Query<ProductQuery>,
) -> Result<HttpResponse> {
    let products = db::products(&state.db);
    let filter = query.filter();

    let (items, total) = futures::try_join!(
        async {
            let cursor = products.find(filter.clone(), query.find_options()).await?;
            Ok::<_, AppError>(cursor.try_collect::<Vec<Product>>().await?)
        },
        async { Ok::<_, AppError>(products.count_documents(filter.clone(), None).await?) },
    )?;

    let items: Vec<ProductResponse> = items.into_iter().map(ProductResponse::from).collect();
    Ok(HttpResponse::Ok().json(json!({
        "products": items,
        "pagination": query.pagination(total),
    })))
}

pub async fn create_product(
    _admin: RequireAdmin,
    state: web::Data<AppState>,
    data: web::Json<ProductInput>,
) -> Result<HttpResponse> {
    let input = data.into_inner().normalize();
    input.validate()?;

    let mut product = input.into_product();
    let result = db::products(&state.db)
        .insert_one(&product, None)
        .await
        .map_err(sku_conflict)?;
    product.id = result.inserted_id.as_object_id();

    log::info!("Created product {} ({:?})", product.sku, product.id);
    Ok(HttpResponse::Created().json(ProductResponse::from(product)))
}

pub async fn get_product(
    _admin: RequireAdmin,
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let id = parse_id(&id)?;
    let product = db::products(&state.db)
        .find_one(doc! { "_id": id }, None)
        .await?
        .ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

pub async fn update_product(
    _admin: RequireAdmin,
    state: web::Data<AppState>,
    id: web::Path<String>,
    data: web::Json<ProductUpdate>,
) -> Result<HttpResponse> {
    let id = parse_id(&id)?;
    let update = data.into_inner().normalize();
    update.validate()?;

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    let product = db::products(&state.db)
        .find_one_and_update(doc! { "_id": id }, update.to_update(), options)
        .await
        .map_err(sku_conflict)?
        .ok_or_else(not_found)?;

    log::info!("Updated product {} ({})", product.sku, id);
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

pub async fn delete_product(
    _admin: RequireAdmin,
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let id = parse_id(&id)?;
    let products = db::products(&state.db);

    let product = products
        .find_one(doc! { "_id": id }, None)
        .await?
        .ok_or_else(not_found)?;

    futures::future::join_all(product.images.iter().map(|url| state.media.delete(url))).await;

    products.delete_one(doc! { "_id": id }, None).await?;

    log::info!(
        "Deleted product {} ({}) and {} image(s)",
        product.sku,
        id,
        product.images.len()
    );
    Ok(HttpResponse::Ok().json(json!({ "message": "Product deleted successfully" })))
}
