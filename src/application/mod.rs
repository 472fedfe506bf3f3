/// Application layer: services over the active backend and the workspace
/// use cases
pub mod services;
pub mod use_cases;
