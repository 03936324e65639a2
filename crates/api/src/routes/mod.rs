pub mod activities;
pub mod admin;
pub mod attendance;
pub mod auth;
pub mod diplomas;
pub mod health;
pub mod payments;
pub mod reports;
