mod api;
mod image;
mod openai;

pub use api::*;
pub use image::*;
pub use openai::*;
