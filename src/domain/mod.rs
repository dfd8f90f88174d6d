pub mod company;
pub mod listing;
