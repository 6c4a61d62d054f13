pub const APP_NAME: &str = "posture_report";

pub const SETTINGS_FILE: &str = "posture_report.config";
pub const ERROR_LOG_FILE: &str = "error.log";
pub const DEBUG_LOG_FILE: &str = "debug.log";
pub const REPORT_FILE: &str = "posture_report.csv";

pub const DEFAULT_MODEL_PATH: &str = "small640.pt";
pub const DEFAULT_TARGET_FPS: u32 = 5;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const DEFAULT_INPUT_SIZE: u32 = 640;

pub const CSV_DELIMITER: char = ';';
pub const CSV_HEADER: &[&str] = &["Posture", "Frames", "Seconds"];

pub const LABEL_SITTING_GOOD: &str = "sitting_good";
pub const LABEL_SITTING_BAD: &str = "sitting_bad";
pub const LABEL_UNDETECTED: &str = "undetected";

/// Report order. Index into this slice is also the tally slot.
pub const POSTURE_LABELS: &[&str] = &[LABEL_SITTING_GOOD, LABEL_SITTING_BAD, LABEL_UNDETECTED];

/// Model class index -> label. Anything missing here counts as undetected.
pub const CLASS_LABELS: &[(usize, &str)] = &[(0, LABEL_SITTING_GOOD), (1, LABEL_SITTING_BAD)];
