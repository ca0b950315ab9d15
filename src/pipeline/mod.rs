/// Image pipelines: one-off log transfer and the live adjustment chain

pub mod adjustment;
pub mod log_transfer;
