pub mod artifact_id;
pub mod remote_ref;
