pub mod canvas;
pub mod layer_panel;
pub mod status_bar;
pub mod tag_panel;
pub mod theme;
pub mod toolbar;
