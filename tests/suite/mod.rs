mod config_file;
mod scenarios;
