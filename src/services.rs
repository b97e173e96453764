pub mod auth;
pub mod invoice_service;
pub mod numbering;
pub mod payment_service;
pub mod purchase_service;
pub mod report_service;
pub mod tenancy_service;
