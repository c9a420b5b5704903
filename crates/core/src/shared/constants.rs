/// Points in a face mesh without iris refinement. Iris-refined meshes carry
/// 478 points; the extra ten are ignored.
pub const FACE_MESH_LANDMARKS: usize = 468;

/// Six-point eye contours: [outer corner, upper, upper, inner corner, lower, lower].
pub const LEFT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];
pub const RIGHT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];

pub const LEFT_EYE_TOP: usize = 159;
pub const RIGHT_EYE_TOP: usize = 386;
pub const LEFT_EYE_OUTER: usize = 33;
pub const RIGHT_EYE_OUTER: usize = 263;

pub const MOUTH_TOP: usize = 13;
pub const MOUTH_BOTTOM: usize = 14;
pub const MOUTH_LEFT: usize = 61;
pub const MOUTH_RIGHT: usize = 291;

pub const NOSE_TIP: usize = 1;
pub const LEFT_CHEEK: usize = 234;
pub const RIGHT_CHEEK: usize = 454;

pub const LEFT_INNER_BROW: usize = 105;
pub const RIGHT_INNER_BROW: usize = 334;
pub const LEFT_OUTER_BROW: usize = 70;
pub const RIGHT_OUTER_BROW: usize = 300;

pub const CONFIG_DIR_NAME: &str = "CognitiveLens";
pub const CONFIG_FILE_NAME: &str = "config.json";
