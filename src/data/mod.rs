pub mod decoder;
pub mod raster;
pub mod tag_file;
