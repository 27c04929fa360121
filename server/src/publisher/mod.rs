mod control_loop;
pub mod publisher;
pub mod publisher_config;
mod send_loop;
