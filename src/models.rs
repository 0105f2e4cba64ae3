use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{
    normalize_email, normalize_optional, normalize_sku, validate_image_urls, SKU_REGEX,
};

fn to_chrono(dt: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl User {
    pub fn new_admin(name: &str, email: &str, password_hash: String) -> Self {
        let now = bson::DateTime::now();
        User {
            id: None,
            name: name.trim().to_string(),
            email: normalize_email(email),
            password: password_hash,
            role: Role::Admin,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: to_chrono(user.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OnboardInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl OnboardInput {
    pub fn normalize(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = normalize_email(&self.email);
        self
    }
}

/// Session claims carried by the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub sku: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default)]
    pub sales: i64,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub category: String,
    pub images: Vec<String>,
    pub sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub sales: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            id: p.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: p.name,
            description: p.description,
            price: p.price,
            stock: p.stock,
            category: p.category,
            images: p.images,
            sku: p.sku,
            brand: p.brand,
            sales: p.sales,
            created_at: to_chrono(p.created_at),
            updated_at: to_chrono(p.updated_at),
        }
    }
}

/// Body of a create request.
#[derive(Debug, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: String,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,
    #[validate(range(min = 0.0, message = "Price must be positive"))]
    pub price: f64,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i64,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(regex(path = *SKU_REGEX, message = "SKU must be uppercase alphanumeric with hyphens"))]
    pub sku: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_image_urls"))]
    pub images: Vec<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Sales cannot be negative"))]
    pub sales: i64,
}

impl ProductInput {
    /// Applies the storage normalization (trimming, SKU case) ahead of
    /// validation so that e.g. " tee-01 " is accepted as "TEE-01".
    pub fn normalize(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.category = self.category.trim().to_string();
        self.sku = normalize_sku(&self.sku);
        self.brand = normalize_optional(self.brand);
        self
    }

    pub fn into_product(self) -> Product {
        let now = bson::DateTime::now();
        Product {
            id: None,
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            category: self.category,
            images: self.images,
            sku: self.sku,
            brand: self.brand,
            sales: self.sales,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of an update request; only supplied fields change.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProductUpdate {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Price must be positive"))]
    pub price: Option<f64>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i64>,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: Option<String>,
    #[validate(regex(path = *SKU_REGEX, message = "SKU must be uppercase alphanumeric with hyphens"))]
    pub sku: Option<String>,
    pub brand: Option<String>,
    #[validate(custom(function = "validate_image_urls"))]
    pub images: Option<Vec<String>>,
    #[validate(range(min = 0, message = "Sales cannot be negative"))]
    pub sales: Option<i64>,
}

impl ProductUpdate {
    pub fn normalize(mut self) -> Self {
        self.name = self.name.map(|v| v.trim().to_string());
        self.category = self.category.map(|v| v.trim().to_string());
        self.sku = self.sku.map(|v| normalize_sku(&v));
        self
    }

    /// Builds the update document. A blank brand clears the field.
    pub fn to_update(&self) -> Document {
        let mut set = doc! { "updatedAt": bson::DateTime::now() };
        let mut unset = Document::new();

        if let Some(name) = &self.name {
            set.insert("name", name);
        }
        if let Some(description) = &self.description {
            set.insert("description", description);
        }
        if let Some(price) = self.price {
            set.insert("price", price);
        }
        if let Some(stock) = self.stock {
            set.insert("stock", stock);
        }
        if let Some(category) = &self.category {
            set.insert("category", category);
        }
        if let Some(sku) = &self.sku {
            set.insert("sku", sku);
        }
        if let Some(images) = &self.images {
            set.insert("images", images.clone());
        }
        if let Some(sales) = self.sales {
            set.insert("sales", sales);
        }
        if self.brand.is_some() {
            match normalize_optional(self.brand.clone()) {
                Some(brand) => {
                    set.insert("brand", brand);
                }
                None => {
                    unset.insert("brand", "");
                }
            }
        }

        let mut update = doc! { "$set": set };
        if !unset.is_empty() {
            update.insert("$unset", unset);
        }
        update
    }
}
