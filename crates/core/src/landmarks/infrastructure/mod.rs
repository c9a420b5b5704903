pub mod detecting_landmark_source;
pub mod jsonl_landmark_source;
pub mod replay_landmark_provider;
