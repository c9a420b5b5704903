pub mod config;
pub mod constants;
pub mod image_frame;
pub mod landmark_frame;
pub mod score;
