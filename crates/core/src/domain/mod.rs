pub mod dataset;
pub mod filters;
pub mod view;
