pub mod calibration_tracker;
pub mod event_state_machine;
pub mod rate_meter;
pub mod score_fusion;
