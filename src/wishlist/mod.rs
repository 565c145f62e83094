//! Wishlist Module
//!
//! Wishlists are named, dated collections of wishes; a wish is a named,
//! priced link that belongs to exactly one wishlist.
//!
//! # Features
//!
//! - `Wishlists` / `Wishes`: thin SQL translators over the pooled [`Database`]
//! - HTTP handlers enforcing validate → exists → execute → respond
//! - Routes under `/wishlists`, wishes nested under their wishlist
//!
//! # Usage
//!
//! ```rust,ignore
//! use wishlist::wishlist;
//!
//! let app = Router::new()
//!     .merge(wishlist::routes())
//!     .with_state(app_state);
//!
//! let lists = wishlist::Wishlists::new(&db);
//! let created = lists.create(&input).await?;
//! ```
//!
//! [`Database`]: crate::db::Database

mod handler;
mod lib;
mod routes;

pub use handler::{WishBody, WishlistBody};
pub use lib::*;
pub use routes::routes;
