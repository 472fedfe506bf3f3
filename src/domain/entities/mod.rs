pub mod backend_state;
pub mod manifest;
pub mod store_handle;
pub mod workspace_config;
