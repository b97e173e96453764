pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod party_repo;
pub use party_repo::PartyRepository;
pub mod invoice_repo;
pub use invoice_repo::InvoiceRepository;
pub mod purchase_repo;
pub use purchase_repo::PurchaseRepository;
pub mod payment_repo;
pub use payment_repo::PaymentRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
