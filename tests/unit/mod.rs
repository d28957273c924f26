//! Unit test modules.

mod aggregator_test;
mod goal_evaluator_test;
mod plan_generator_test;
mod ranking_test;
mod record_candidates_test;
