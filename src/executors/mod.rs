pub mod step_executor;
