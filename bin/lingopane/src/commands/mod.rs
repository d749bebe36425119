pub mod config_cmd;
pub mod status;
pub mod translate;
