//! Request / response types for the JSON endpoints.

pub mod contact;
pub mod convert;
