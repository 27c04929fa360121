pub mod error;
pub mod host_world_manager;
pub mod published_objects;
