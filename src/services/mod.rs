pub mod admin;
pub mod company_search;
pub mod csv_export;
pub mod history_store;
pub mod retry;

pub use admin::{AdminGate, AdminSession};
pub use company_search::{CompanySearchService, SearchProvider};
pub use history_store::{BlobStore, FileBlobStore, HistoryLog, MemoryBlobStore};
pub use retry::{with_retry, RetryPolicy};
