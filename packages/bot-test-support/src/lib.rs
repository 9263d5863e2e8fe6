//! Shared helpers for cafebot integration tests: one-time log setup and
//! assertions over the ProblemDetails error contract.

pub mod problem_details;
pub mod test_logging;
