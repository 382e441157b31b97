pub mod contract;
pub mod draft;
pub mod store;
