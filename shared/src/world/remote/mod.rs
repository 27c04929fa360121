pub mod error;
pub mod mirror_event;
pub mod network_id_map;
pub mod network_waitlist;
pub mod remote_world_manager;
pub mod tombstones;
