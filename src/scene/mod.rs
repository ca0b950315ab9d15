pub mod layers;
pub mod status;
pub mod surface;
pub mod view;
