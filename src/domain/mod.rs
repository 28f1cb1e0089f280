// Domain layer - Pure models and algorithms, no I/O
pub mod diagnostics;
pub mod event;
pub mod frame;
pub mod geometry;
pub mod progress;
pub mod qualifying;
pub mod session;
pub mod track;
