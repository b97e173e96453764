pub mod auth;
pub mod invoices;
pub mod parties;
pub mod payments;
pub mod products;
pub mod purchases;
pub mod reports;
pub mod settings;
pub mod tenancy;
