use actix_cors::Cors;
use actix_web::{web, HttpResponse};

use crate::errors::{ApiError, ApiResult};
use crate::middleware::{AuthMiddleware, Caller};
use crate::models::{
    CredentialsInput, MessageResponse, NewProduct, ProductCreated, ProductInput, QuantityInput,
    QuantityUpdated, TokenResponse,
};
use crate::state::AppState;

async fn register(
    state: web::Data<AppState>,
    data: web::Json<CredentialsInput>,
) -> ApiResult<HttpResponse> {
    data.validate()?;
    state.credentials.register(&data.username, &data.password).await?;

    Ok(HttpResponse::Created().json(MessageResponse {
        message: "User registered".to_string(),
    }))
}

async fn login(
    state: web::Data<AppState>,
    data: web::Json<CredentialsInput>,
) -> ApiResult<HttpResponse> {
    data.validate()?;
    let username = state.credentials.authenticate(&data.username, &data.password).await?;

    let access_token = state.tokens.issue(&username).map_err(|e| {
        log::error!("Failed to encode token: {}", e);
        ApiError::Internal(e.to_string())
    })?;
    log::info!("User {} logged in", username);

    Ok(HttpResponse::Ok().json(TokenResponse { access_token }))
}

async fn add_product(
    caller: Caller,
    state: web::Data<AppState>,
    data: web::Json<ProductInput>,
) -> ApiResult<HttpResponse> {
    let product = NewProduct::try_from(data.into_inner())?;
    let sku = product.sku.clone();
    let product_id = state.products.create(product).await?;
    log::info!("{} added product {} (sku {})", caller.0, product_id, sku);

    Ok(HttpResponse::Created().json(ProductCreated { product_id }))
}

async fn update_quantity(
    caller: Caller,
    state: web::Data<AppState>,
    product_id: web::Path<i64>,
    data: web::Json<QuantityInput>,
) -> ApiResult<HttpResponse> {
    let product = state
        .products
        .update_quantity(product_id.into_inner(), data.quantity)
        .await?;
    log::info!("{} set quantity of product {} to {}", caller.0, product.id, product.quantity);

    Ok(HttpResponse::Ok().json(QuantityUpdated {
        product_id: product.id,
        quantity: product.quantity,
    }))
}

async fn list_products(_caller: Caller, state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let products = state.products.list_all().await?;
    Ok(HttpResponse::Ok().json(products))
}

/// Any origin, method and header, matching what browser clients of the API expect.
/// Must wrap the whole `App` so preflight requests are answered before [`AuthMiddleware`].
pub fn cors() -> Cors {
    Cors::permissive()
}

/// Registers every route. `/products` sits behind [`AuthMiddleware`].
pub fn routes(cfg: &mut web::ServiceConfig, state: web::Data<AppState>) {
    let tokens = state.tokens.clone();
    cfg.app_data(state)
        .app_data(
            web::JsonConfig::default()
                .error_handler(|err, _| ApiError::InvalidInput(err.to_string()).into()),
        )
        .app_data(web::PathConfig::default().error_handler(|_, _| ApiError::NotFound.into()))
        .route("/register", web::post().to(register))
        .route("/login", web::post().to(login))
        .service(
            web::scope("/products")
                .wrap(AuthMiddleware::new(tokens))
                .route("", web::post().to(add_product))
                .route("", web::get().to(list_products))
                .route("/{product_id}/quantity", web::put().to(update_quantity)),
        );
}
