mod receive_loop;
pub mod subscriber;
pub mod subscriber_config;
