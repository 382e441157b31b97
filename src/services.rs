pub mod contracts;
pub mod drafts;
