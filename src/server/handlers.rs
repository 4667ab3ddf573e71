pub mod bids;
pub mod carriers;
pub mod loads;
