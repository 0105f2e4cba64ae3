use mongodb::bson::doc;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};

use crate::errors::Result;
use crate::models::{Product, User};

pub const PRODUCTS: &str = "products";
pub const USERS: &str = "users";

pub async fn connect(uri: &str, database_name: &str) -> Result<Database> {
    let mut client_options = ClientOptions::parse(uri).await?;
    client_options.app_name = Some("catalog-admin".to_string());

    let client = Client::with_options(client_options)?;
    Ok(client.database(database_name))
}

pub fn products(db: &Database) -> Collection<Product> {
    db.collection::<Product>(PRODUCTS)
}

pub fn users(db: &Database) -> Collection<User> {
    db.collection::<User>(USERS)
}

/// Creates the indexes the catalog relies on. Index creation is idempotent,
/// so this runs on every startup.
pub async fn ensure_indexes(db: &Database) -> Result<()> {
    let unique = || IndexOptions::builder().unique(true).build();

    products(db)
        .create_indexes(
            vec![
                IndexModel::builder()
                    .keys(doc! { "sku": 1 })
                    .options(unique())
                    .build(),
                IndexModel::builder().keys(doc! { "category": 1 }).build(),
                IndexModel::builder()
                    .keys(doc! { "name": "text", "description": "text" })
                    .build(),
                IndexModel::builder().keys(doc! { "createdAt": -1 }).build(),
            ],
            None,
        )
        .await?;

    users(db)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(unique())
                .build(),
            None,
        )
        .await?;

    log::info!("Collection indexes are in place");
    Ok(())
}
