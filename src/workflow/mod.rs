pub mod generate_flow;
pub mod request_ctx;

pub use generate_flow::GenerateFlow;
pub use request_ctx::RequestCtx;
