//! Listings domain module (properties for sale or rent, and their showings).
//!
//! Pure record logic; a property only becomes sold/rented through a closed
//! deal (see `Property::settle`).

pub mod property;
pub mod showing;

pub use property::{
    ListingType, NewProperty, Property, PropertyFilter, PropertyStatus, PropertyType,
    PropertyUpdate,
};
pub use showing::{Showing, ShowingStatus, upcoming_showings};
