use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub sku: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub quantity: i64,
    pub price: f64,
}

/// Body of `/register` and `/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsInput {
    pub username: String,
    pub password: String,
}

impl CredentialsInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty() {
            return Err(ApiError::InvalidInput("username is required".to_string()));
        }
        if self.password.is_empty() {
            return Err(ApiError::InvalidInput("password is required".to_string()));
        }
        Ok(())
    }
}

/// Raw body of `POST /products`; required fields are checked by [`NewProduct::try_from`].
#[derive(Debug, Default, Deserialize)]
pub struct ProductInput {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<f64>,
}

/// A product that passed validation and is ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub kind: Option<String>,
    pub sku: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub quantity: i64,
    pub price: f64,
}

impl NewProduct {
    pub fn into_product(self, id: i64) -> Product {
        Product {
            id,
            name: self.name,
            kind: self.kind,
            sku: self.sku,
            image_url: self.image_url,
            description: self.description,
            quantity: self.quantity,
            price: self.price,
        }
    }
}

fn required_text(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::InvalidInput(format!("{} is required", field))),
    }
}

impl TryFrom<ProductInput> for NewProduct {
    type Error = ApiError;

    fn try_from(input: ProductInput) -> Result<Self, Self::Error> {
        let name = required_text(input.name, "name")?;
        let sku = required_text(input.sku, "sku")?;
        let price = match input.price {
            Some(p) if p.is_finite() => p,
            _ => return Err(ApiError::InvalidInput("price is required".to_string())),
        };

        Ok(NewProduct {
            name,
            kind: input.kind,
            sku,
            image_url: input.image_url,
            description: input.description,
            quantity: input.quantity.unwrap_or(0),
            price,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct QuantityInput {
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct ProductCreated {
    pub product_id: i64,
}

#[derive(Debug, Serialize)]
pub struct QuantityUpdated {
    pub product_id: i64,
    pub quantity: i64,
}
