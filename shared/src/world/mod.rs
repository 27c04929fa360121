pub mod change_clock;
pub mod error;
pub mod host;
pub mod network_event;
pub mod network_id;
pub mod network_wrapper;
pub mod object_kinds;
pub mod remote;
pub mod replicate;
pub mod scene_type;
