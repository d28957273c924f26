//! Integration test modules.

mod challenge_test;
mod concurrency_test;
mod leaderboard_test;
mod plan_lifecycle_test;
mod workout_pipeline_test;
