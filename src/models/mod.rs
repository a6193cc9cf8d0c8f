pub mod admin;
pub mod contact;
pub mod plot;
pub mod quiz;
pub mod request;
