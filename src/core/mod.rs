pub mod assignment;
pub mod error;
pub mod geometry;
pub mod model;
