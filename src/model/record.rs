//! The per-frame annotation record.

use serde::{Deserialize, Serialize};

/// Number of ordinal criteria scored per frame.
pub const CRITERIA_COUNT: usize = 3;

/// One row of the annotation table: a single extracted video frame together
/// with everything the annotator has recorded about it.
///
/// `video_id` and `frame_id` identify the frame and are immutable after
/// discovery. `frame_id` keeps the original file stem as text so leading
/// zeros survive a save/load round trip; `frame_id_int` carries the numeric
/// value used for sorting and lookup.
///
/// All flags default to `false` and `comment` to the empty string, so a
/// freshly discovered record serializes without any null/missing fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Name of the per-video folder this frame came from.
    pub video_id: String,
    /// Numeric file stem as text (leading zeros preserved).
    pub frame_id: String,
    /// Numeric value of `frame_id`, the sort and lookup key.
    pub frame_id_int: u64,

    /// Free-text annotator comment.
    #[serde(default)]
    pub comment: String,

    /// Frame has been reviewed.
    #[serde(default)]
    pub seen: bool,
    /// Frame is difficult to review.
    #[serde(default)]
    pub difficult: bool,
    /// Camera is outside the body.
    #[serde(default)]
    pub out_of_body: bool,
    /// Posterior view of the operative field.
    #[serde(default)]
    pub post_view: bool,
    /// Anatomical variation present.
    #[serde(default)]
    pub anatomical_variation: bool,
    /// Region of interest not visible.
    #[serde(default)]
    pub roi_not_seen: bool,
    /// Imaging artifact present.
    #[serde(default)]
    pub artifact: bool,
    /// Region of interest only partially visible.
    #[serde(default)]
    pub roi_visible_partially: bool,
    /// Instrument occludes the region of interest.
    #[serde(default)]
    pub instr_in_roi: bool,

    /// First ordinal criterion score.
    #[serde(default)]
    pub cvs_cri_1: bool,
    /// Second ordinal criterion score.
    #[serde(default)]
    pub cvs_cri_2: bool,
    /// Third ordinal criterion score.
    #[serde(default)]
    pub cvs_cri_3: bool,
}

impl AnnotationRecord {
    /// Create a default-initialized record for a newly discovered frame.
    pub fn new(video_id: impl Into<String>, frame_id: impl Into<String>, frame_id_int: u64) -> Self {
        Self {
            video_id: video_id.into(),
            frame_id: frame_id.into(),
            frame_id_int,
            comment: String::new(),
            seen: false,
            difficult: false,
            out_of_body: false,
            post_view: false,
            anatomical_variation: false,
            roi_not_seen: false,
            artifact: false,
            roi_visible_partially: false,
            instr_in_roi: false,
            cvs_cri_1: false,
            cvs_cri_2: false,
            cvs_cri_3: false,
        }
    }

    /// The three criterion scores in fixed order.
    pub fn labels(&self) -> [bool; CRITERIA_COUNT] {
        [self.cvs_cri_1, self.cvs_cri_2, self.cvs_cri_3]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_defaults() {
        let record = AnnotationRecord::new("video01", "000042", 42);
        assert_eq!(record.video_id, "video01");
        assert_eq!(record.frame_id, "000042");
        assert_eq!(record.frame_id_int, 42);
        assert_eq!(record.comment, "");
        assert!(!record.seen);
        assert!(!record.artifact);
        assert_eq!(record.labels(), [false, false, false]);
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        // A table written before a flag existed must still load cleanly.
        let json = r#"{"video_id":"v1","frame_id":"001","frame_id_int":1}"#;
        let record: AnnotationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.comment, "");
        assert!(!record.difficult);
        assert!(!record.cvs_cri_3);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut record = AnnotationRecord::new("video02", "007", 7);
        record.seen = true;
        record.cvs_cri_2 = true;
        record.comment = "gallbladder partially occluded".to_string();

        let json = serde_json::to_string(&record).unwrap();
        let loaded: AnnotationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, loaded);
        // Leading zeros survive the round trip.
        assert_eq!(loaded.frame_id, "007");
    }
}
