pub mod company;
pub mod history;

pub use company::{name_key, CompanyRecord, NOT_AVAILABLE};
pub use history::HistoryEntry;
