pub mod attention_detector;
pub mod confusion_detector;
pub mod drowsiness_detector;
pub mod signal_detector;
pub mod stress_detector;
