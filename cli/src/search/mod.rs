//! Hotel and restaurant search.
//!
//! Builds the query string for the search endpoints from the user's
//! destination, dates and party.

pub mod query;

pub use query::{Guests, HotelSearch, RestaurantSearch, SearchRequest};
