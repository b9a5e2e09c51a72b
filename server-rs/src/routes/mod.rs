pub mod admin;
pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod checkout;
pub mod coins;
pub mod health;
pub mod webhooks;
