pub mod auth;
pub mod invoice;
pub mod party;
pub mod payment;
pub mod product;
pub mod purchase;
pub mod report;
pub mod settings;
pub mod tenancy;
