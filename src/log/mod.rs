/// Session activity recording

pub mod activity;
