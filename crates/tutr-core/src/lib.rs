//! Core types and trait definitions for the Tutr marketplace.
//!
//! Nothing here knows about HTTP or SQL.
//! Users, posts and teach/learn requests are defined here, together with the
//! [`store::MarketStore`] abstraction and the [`market::Market`] service that
//! enforces who may create and decide requests.

// `MarketStore` spells out `Send` futures itself; the impls use `async fn`.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod market;
pub mod post;
pub mod request;
pub mod store;
pub mod user;

pub use error::{Error, ErrorKind, Result};
pub use market::Market;
