pub mod recommender;
pub mod similarity;
pub mod store;
