use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::{ApiError, ApiResult};
use crate::models::{NewProduct, Product, User};

/// Persistence for user accounts. Usernames are unique.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> ApiResult<Option<User>>;

    /// Inserts a new user and returns its id, or `DuplicateUsername`.
    async fn insert(&self, username: &str, password_hash: &str) -> ApiResult<i64>;
}

/// Persistence for the product catalog. SKUs are unique.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Inserts a product and returns its id, or `DuplicateSku`.
    async fn create(&self, product: NewProduct) -> ApiResult<i64>;

    /// Overwrites the quantity and returns the updated record, or `NotFound`.
    async fn update_quantity(&self, id: i64, quantity: i64) -> ApiResult<Product>;

    /// All products in insertion order.
    async fn list_all(&self) -> ApiResult<Vec<Product>>;
}

/// In-process store backing both traits. Ids start at 1 and are never reused.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Table<User>>,
    products: Mutex<Table<Product>>,
}

struct Table<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Table { next_id: 1, rows: BTreeMap::new() }
    }
}

impl<T> Table<T> {
    fn push(&mut self, build: impl FnOnce(i64) -> T) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.insert(id, build(id));
        id
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> ApiResult<Option<User>> {
        let users = self.users.lock();
        Ok(users.rows.values().find(|u| u.username == username).cloned())
    }

    async fn insert(&self, username: &str, password_hash: &str) -> ApiResult<i64> {
        let mut users = self.users.lock();
        if users.rows.values().any(|u| u.username == username) {
            return Err(ApiError::DuplicateUsername);
        }
        Ok(users.push(|id| User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        }))
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn create(&self, product: NewProduct) -> ApiResult<i64> {
        let mut products = self.products.lock();
        if products.rows.values().any(|p| p.sku == product.sku) {
            return Err(ApiError::DuplicateSku);
        }
        Ok(products.push(|id| product.into_product(id)))
    }

    async fn update_quantity(&self, id: i64, quantity: i64) -> ApiResult<Product> {
        let mut products = self.products.lock();
        let product = products.rows.get_mut(&id).ok_or(ApiError::NotFound)?;
        product.quantity = quantity;
        Ok(product.clone())
    }

    async fn list_all(&self) -> ApiResult<Vec<Product>> {
        Ok(self.products.lock().rows.values().cloned().collect())
    }
}
