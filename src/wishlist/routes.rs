use axum::{Router, routing::get};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/wishlists",
            get(handler::list_wishlists).post(handler::create_wishlist),
        )
        .route(
            "/wishlists/:wishlist_id",
            get(handler::get_wishlist)
                .put(handler::update_wishlist)
                .delete(handler::delete_wishlist),
        )
        .route(
            "/wishlists/:wishlist_id/wishes",
            get(handler::list_wishes).post(handler::create_wish),
        )
        .route(
            "/wishlists/:wishlist_id/wishes/:wish_id",
            get(handler::get_wish)
                .put(handler::update_wish)
                .delete(handler::delete_wish),
        )
}
