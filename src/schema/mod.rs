pub mod line;
pub mod status;
