//! Core value types shared by every stage

pub mod crs;
pub mod geometry;

pub use crs::Crs;
pub use geometry::{Extent, Point2, Point3};
