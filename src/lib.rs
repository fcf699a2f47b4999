//! Gridlight 2D ray tracer
//!
//! Casts a fan of rays from a camera pose into a binary occupancy grid
//! (an RGBA map image where alpha 255 marks solid cells) and produces one
//! intersection per screen column for a pseudo-3D projection. Walls reflect
//! specularly with per-bounce energy loss; stochastic reflection sampling is
//! denoised by progressively averaging frames while the camera holds still.

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod accumulate;
pub mod color;
pub mod config;
pub mod grid;
pub mod projection;
pub mod random;
pub mod ray;
pub mod tracer;
pub mod vector;
