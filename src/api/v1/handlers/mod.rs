pub mod health;
pub mod profile;
