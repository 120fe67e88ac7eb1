//! End-to-end tests: discovered entities through the pipeline into a table

pub mod pipeline_test;
