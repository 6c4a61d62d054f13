pub mod classifier;
pub mod postprocess;
pub mod yolo;

pub use classifier::PostureModel;
pub use yolo::YoloPostureModel;
