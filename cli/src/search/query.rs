//! Search query construction.

use chrono::NaiveDate;

use crate::error::{Result, StaybookError};

/// Who is travelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guests {
    pub adults: u32,
    pub children: u32,
    pub rooms: u32,
    pub pets: bool,
}

impl Default for Guests {
    fn default() -> Self {
        Self {
            adults: 2,
            children: 0,
            rooms: 1,
            pets: false,
        }
    }
}

/// A hotel search over a stay.
#[derive(Debug, Clone)]
pub struct HotelSearch {
    pub destination: String,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guests: Guests,
}

/// A restaurant search for one day.
#[derive(Debug, Clone)]
pub struct RestaurantSearch {
    pub destination: String,
    pub date: Option<NaiveDate>,
    pub party_size: u32,
}

/// Either kind of search.
#[derive(Debug, Clone)]
pub enum SearchRequest {
    Hotels(HotelSearch),
    Restaurants(RestaurantSearch),
}

impl SearchRequest {
    /// Endpoint path relative to the API base URL.
    #[must_use]
    pub const fn endpoint(&self) -> &'static str {
        match self {
            Self::Hotels(_) => "hotels/",
            Self::Restaurants(_) => "restaurants/",
        }
    }

    /// Validates the request and returns its query parameters.
    ///
    /// Parameters at their default value are left out to keep URLs short.
    pub fn query(&self) -> Result<Vec<(&'static str, String)>> {
        match self {
            Self::Hotels(search) => hotel_query(search),
            Self::Restaurants(search) => restaurant_query(search),
        }
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn require_destination(destination: &str) -> Result<String> {
    let destination = destination.trim();
    if destination.is_empty() {
        return Err(StaybookError::Validation(
            "Please select a destination".to_string(),
        ));
    }
    Ok(destination.to_string())
}

fn hotel_query(search: &HotelSearch) -> Result<Vec<(&'static str, String)>> {
    let city = require_destination(&search.destination)?;
    let guests = search.guests;

    if guests.adults < 1 {
        return Err(StaybookError::Validation(
            "At least one adult is required".to_string(),
        ));
    }
    if guests.rooms < 1 {
        return Err(StaybookError::Validation(
            "At least one room is required".to_string(),
        ));
    }
    if let (Some(check_in), Some(check_out)) = (search.check_in, search.check_out) {
        if check_out <= check_in {
            return Err(StaybookError::Validation(
                "Check-out must be after check-in".to_string(),
            ));
        }
    }

    let mut query = vec![("city", city)];
    if let Some(check_in) = search.check_in {
        query.push(("checkin", format_date(check_in)));
    }
    if let Some(check_out) = search.check_out {
        query.push(("checkout", format_date(check_out)));
    }
    if guests.adults > 1 {
        query.push(("adults", guests.adults.to_string()));
    }
    if guests.children > 0 {
        query.push(("children", guests.children.to_string()));
    }
    if guests.rooms > 1 {
        query.push(("rooms", guests.rooms.to_string()));
    }
    if guests.pets {
        query.push(("pets", "true".to_string()));
    }
    Ok(query)
}

fn restaurant_query(search: &RestaurantSearch) -> Result<Vec<(&'static str, String)>> {
    let city = require_destination(&search.destination)?;
    if search.party_size < 1 {
        return Err(StaybookError::Validation(
            "Party size must be at least 1".to_string(),
        ));
    }

    let mut query = vec![("city", city)];
    if let Some(date) = search.date {
        query.push(("date", format_date(date)));
    }
    query.push(("party_size", search.party_size.to_string()));
    Ok(query)
}
