pub mod recognition_pipeline;
