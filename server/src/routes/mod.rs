pub mod api;
pub mod publish;
pub mod sse;
