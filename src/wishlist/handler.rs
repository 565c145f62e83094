//! HTTP handlers for wishlists and their wishes.
//!
//! Each handler validates its input first (400, no database call), then
//! checks that the addressed rows exist (404), then runs the statement (500
//! when the data layer returns nothing). Wish mutations bump the parent
//! wishlist's `wishlist_last_updated`.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::Value;

use super::{Wish, WishInput, Wishes, Wishlist, WishlistInput, Wishlists};
use crate::api::APIResponse;
use crate::db::WriteResult;
use crate::error::HandlerError;
use crate::handler::{AppState, json_body, path_id};
use crate::validate::{self, ValidationError, text_value};

type Reply<T> = Result<APIResponse<T>, HandlerError>;

// ============================================================================
// Request Bodies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct WishlistBody {
    #[serde(default)]
    pub wishlist_name: Value,
    #[serde(default)]
    pub wishlist_date: Value,
}

impl WishlistBody {
    fn parse(&self) -> Result<WishlistInput, ValidationError> {
        let name = text_value(&self.wishlist_name)
            .and_then(validate::name)
            .map_err(|e| e.on("wishlist_name"))?;
        let date = text_value(&self.wishlist_date)
            .and_then(|raw| validate::date(raw).map(|_| raw))
            .map_err(|e| e.on("wishlist_date"))?;

        Ok(WishlistInput {
            name: name.to_owned(),
            date: date.to_owned(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WishBody {
    #[serde(default)]
    pub wish_name: Value,
    #[serde(default)]
    pub wish_price: Value,
    #[serde(default)]
    pub wish_link: Value,
}

impl WishBody {
    fn parse(&self) -> Result<WishInput, ValidationError> {
        let name = text_value(&self.wish_name)
            .and_then(validate::name)
            .map_err(|e| e.on("wish_name"))?;
        let price = validate::number_value(&self.wish_price).map_err(|e| e.on("wish_price"))?;
        let link = text_value(&self.wish_link).map_err(|e| e.on("wish_link"))?;

        Ok(WishInput {
            name: name.to_owned(),
            price,
            link: link.to_owned(),
        })
    }
}

// ============================================================================
// Existence Checks
// ============================================================================

async fn ensure_wishlist(lists: &Wishlists<'_>, wishlist_id: i64) -> Result<(), HandlerError> {
    if lists.exists(wishlist_id).await? {
        Ok(())
    } else {
        Err(HandlerError::NotFound("Wishlist not found."))
    }
}

async fn ensure_wish(wishes: &Wishes<'_>, wishlist_id: i64, wish_id: i64) -> Result<(), HandlerError> {
    if wishes.exists(wishlist_id, wish_id).await? {
        Ok(())
    } else {
        Err(HandlerError::NotFound("Wish not found."))
    }
}

async fn touch_parent(lists: &Wishlists<'_>, wishlist_id: i64) {
    if let Err(e) = lists.touch(wishlist_id).await {
        tracing::warn!(wishlist_id, error = %e, "failed to bump wishlist last updated");
    }
}

// ============================================================================
// Wishlist Handlers
// ============================================================================

pub async fn list_wishlists(State(state): State<AppState>) -> Reply<Vec<Wishlist>> {
    let wishlists = Wishlists::new(&state.db).get_all().await?;
    Ok(APIResponse::ok("Fetched wishlists.", wishlists))
}

pub async fn get_wishlist(State(state): State<AppState>, Path(raw_id): Path<String>) -> Reply<Wishlist> {
    let wishlist_id = path_id("wishlist_id", &raw_id)?;
    let lists = Wishlists::new(&state.db);

    ensure_wishlist(&lists, wishlist_id).await?;

    match lists.get(wishlist_id).await? {
        Some(wishlist) => Ok(APIResponse::ok("Fetched wishlist.", wishlist)),
        None => Err(HandlerError::NotFound("Wishlist not found.")),
    }
}

pub async fn create_wishlist(
    State(state): State<AppState>,
    body: Result<Json<WishlistBody>, JsonRejection>,
) -> Reply<WriteResult> {
    let input = json_body(body)?.parse()?;

    let result = Wishlists::new(&state.db).create(&input).await?;
    tracing::info!(wishlist_id = result.insert_id, "created wishlist");

    Ok(APIResponse::created("Created wishlist.", result))
}

pub async fn update_wishlist(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Json<WishlistBody>, JsonRejection>,
) -> Reply<WriteResult> {
    let wishlist_id = path_id("wishlist_id", &raw_id)?;
    let input = json_body(body)?.parse()?;
    let lists = Wishlists::new(&state.db);

    ensure_wishlist(&lists, wishlist_id).await?;

    let result = lists.update(wishlist_id, &input).await?;
    Ok(APIResponse::ok("Updated wishlist.", result))
}

pub async fn delete_wishlist(State(state): State<AppState>, Path(raw_id): Path<String>) -> Reply<WriteResult> {
    let wishlist_id = path_id("wishlist_id", &raw_id)?;
    let lists = Wishlists::new(&state.db);

    ensure_wishlist(&lists, wishlist_id).await?;

    let result = lists.delete(wishlist_id).await?;
    tracing::info!(wishlist_id, "deleted wishlist");

    Ok(APIResponse::ok("Deleted wishlist.", result))
}

// ============================================================================
// Wish Handlers
// ============================================================================

pub async fn list_wishes(State(state): State<AppState>, Path(raw_id): Path<String>) -> Reply<Vec<Wish>> {
    let wishlist_id = path_id("wishlist_id", &raw_id)?;

    ensure_wishlist(&Wishlists::new(&state.db), wishlist_id).await?;

    let wishes = Wishes::new(&state.db).get_all(wishlist_id).await?;
    Ok(APIResponse::ok("Fetched wishes.", wishes))
}

pub async fn get_wish(
    State(state): State<AppState>,
    Path((raw_list_id, raw_wish_id)): Path<(String, String)>,
) -> Reply<Wish> {
    let wishlist_id = path_id("wishlist_id", &raw_list_id)?;
    let wish_id = path_id("wish_id", &raw_wish_id)?;
    let wishes = Wishes::new(&state.db);

    ensure_wishlist(&Wishlists::new(&state.db), wishlist_id).await?;
    ensure_wish(&wishes, wishlist_id, wish_id).await?;

    match wishes.get(wishlist_id, wish_id).await? {
        Some(wish) => Ok(APIResponse::ok("Fetched wish.", wish)),
        None => Err(HandlerError::NotFound("Wish not found.")),
    }
}

pub async fn create_wish(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Json<WishBody>, JsonRejection>,
) -> Reply<WriteResult> {
    let wishlist_id = path_id("wishlist_id", &raw_id)?;
    let input = json_body(body)?.parse()?;
    let lists = Wishlists::new(&state.db);

    ensure_wishlist(&lists, wishlist_id).await?;

    let result = Wishes::new(&state.db).create(wishlist_id, &input).await?;
    touch_parent(&lists, wishlist_id).await;
    tracing::info!(wishlist_id, wish_id = result.insert_id, "created wish");

    Ok(APIResponse::created("Created wish.", result))
}

pub async fn update_wish(
    State(state): State<AppState>,
    Path((raw_list_id, raw_wish_id)): Path<(String, String)>,
    body: Result<Json<WishBody>, JsonRejection>,
) -> Reply<WriteResult> {
    let wishlist_id = path_id("wishlist_id", &raw_list_id)?;
    let wish_id = path_id("wish_id", &raw_wish_id)?;
    let input = json_body(body)?.parse()?;
    let lists = Wishlists::new(&state.db);
    let wishes = Wishes::new(&state.db);

    ensure_wishlist(&lists, wishlist_id).await?;
    ensure_wish(&wishes, wishlist_id, wish_id).await?;

    let result = wishes.update(wishlist_id, wish_id, &input).await?;
    touch_parent(&lists, wishlist_id).await;

    Ok(APIResponse::ok("Updated wish.", result))
}

pub async fn delete_wish(
    State(state): State<AppState>,
    Path((raw_list_id, raw_wish_id)): Path<(String, String)>,
) -> Reply<WriteResult> {
    let wishlist_id = path_id("wishlist_id", &raw_list_id)?;
    let wish_id = path_id("wish_id", &raw_wish_id)?;
    let lists = Wishlists::new(&state.db);
    let wishes = Wishes::new(&state.db);

    ensure_wishlist(&lists, wishlist_id).await?;
    ensure_wish(&wishes, wishlist_id, wish_id).await?;

    let result = wishes.delete(wishlist_id, wish_id).await?;
    touch_parent(&lists, wishlist_id).await;
    tracing::info!(wishlist_id, wish_id, "deleted wish");

    Ok(APIResponse::ok("Deleted wish.", result))
}
