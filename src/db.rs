use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{
    ClientOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument,
};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, ApiResult};
use crate::models::{NewProduct, Product, User};
use crate::store::{ProductStore, UserStore};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Serialize, Deserialize, Debug)]
struct Counter {
    _id: String,
    seq: i64,
}

#[derive(Serialize, Deserialize, Debug)]
struct UserDocument {
    _id: i64,
    username: String,
    password_hash: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct ProductDocument {
    _id: i64,
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    sku: String,
    image_url: Option<String>,
    description: Option<String>,
    quantity: i64,
    price: f64,
}

impl From<UserDocument> for User {
    fn from(d: UserDocument) -> Self {
        User { id: d._id, username: d.username, password_hash: d.password_hash }
    }
}

impl From<ProductDocument> for Product {
    fn from(d: ProductDocument) -> Self {
        Product {
            id: d._id,
            name: d.name,
            kind: d.kind,
            sku: d.sku,
            image_url: d.image_url,
            description: d.description,
            quantity: d.quantity,
            price: d.price,
        }
    }
}

pub async fn connect(database_url: &str, database_name: &str) -> Result<Database, MongoError> {
    let client_options = ClientOptions::parse(database_url).await?;
    let client = Client::with_options(client_options)?;
    Ok(client.database(database_name))
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

/// MongoDB-backed store for users and products.
#[derive(Clone)]
pub struct MongoStore {
    users: Collection<UserDocument>,
    products: Collection<ProductDocument>,
    counters: Collection<Counter>,
}

impl MongoStore {
    /// Wraps `db` and makes sure the unique indexes exist.
    pub async fn init(db: &Database) -> Result<Self, MongoError> {
        let store = MongoStore {
            users: db.collection("users"),
            products: db.collection("products"),
            counters: db.collection("counters"),
        };

        let unique = || IndexOptions::builder().unique(true).build();
        store
            .users
            .create_index(
                IndexModel::builder().keys(doc! {"username": 1}).options(unique()).build(),
                None,
            )
            .await?;
        store
            .products
            .create_index(
                IndexModel::builder().keys(doc! {"sku": 1}).options(unique()).build(),
                None,
            )
            .await?;

        Ok(store)
    }

    async fn next_id(&self, seq_name: &str) -> ApiResult<i64> {
        let filter = doc! {"_id": seq_name};
        let update = doc! {"$inc": {"seq": 1_i64}};

        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        match self.counters.find_one_and_update(filter, update, options).await? {
            Some(counter) => Ok(counter.seq),
            None => Err(ApiError::Internal(format!(
                "Failed to generate sequence value for {}",
                seq_name
            ))),
        }
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn find_by_username(&self, username: &str) -> ApiResult<Option<User>> {
        let user = self.users.find_one(doc! {"username": username}, None).await?;
        Ok(user.map(User::from))
    }

    async fn insert(&self, username: &str, password_hash: &str) -> ApiResult<i64> {
        let id = self.next_id("users").await?;
        let document = UserDocument {
            _id: id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        match self.users.insert_one(&document, None).await {
            Ok(_) => Ok(id),
            Err(e) if is_duplicate_key(&e) => Err(ApiError::DuplicateUsername),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ProductStore for MongoStore {
    async fn create(&self, product: NewProduct) -> ApiResult<i64> {
        let id = self.next_id("products").await?;
        let document = ProductDocument {
            _id: id,
            name: product.name,
            kind: product.kind,
            sku: product.sku,
            image_url: product.image_url,
            description: product.description,
            quantity: product.quantity,
            price: product.price,
        };
        match self.products.insert_one(&document, None).await {
            Ok(_) => Ok(id),
            Err(e) if is_duplicate_key(&e) => Err(ApiError::DuplicateSku),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_quantity(&self, id: i64, quantity: i64) -> ApiResult<Product> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .products
            .find_one_and_update(doc! {"_id": id}, doc! {"$set": {"quantity": quantity}}, options)
            .await?;
        updated.map(Product::from).ok_or(ApiError::NotFound)
    }

    async fn list_all(&self) -> ApiResult<Vec<Product>> {
        // Ids come from a monotonic counter, so `_id` order is insertion order.
        let options = FindOptions::builder().sort(doc! {"_id": 1}).build();
        let cursor = self.products.find(None, options).await?;
        let documents: Vec<ProductDocument> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(Product::from).collect())
    }
}
