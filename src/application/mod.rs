// Application layer - Use cases and the provider boundary
pub mod frame_builder;
pub mod pagination;
pub mod qualifying_service;
pub mod replay_service;
pub mod schedule_service;
pub mod session_provider;
