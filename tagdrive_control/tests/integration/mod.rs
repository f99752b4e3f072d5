mod closed_loop;
mod config_load;
mod scenarios;
