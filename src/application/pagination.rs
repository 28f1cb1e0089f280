// Frame pagination
use crate::domain::frame::Frame;
use serde::Serialize;

/// A contiguous slice of the frame sequence plus the bookkeeping the
/// frontend needs to request the next page.
#[derive(Debug, Clone, Serialize)]
pub struct FramePage {
    pub frames: Vec<Frame>,
    pub total_frames: usize,
    pub start_frame: usize,
    pub end_frame: usize,
    pub has_more: bool,
}

/// Slice `[start_frame, min(start_frame + frame_count, total))` out of
/// the full sequence. A start beyond the end yields an empty page, not
/// an error.
pub fn paginate(frames: &[Frame], start_frame: usize, frame_count: usize) -> FramePage {
    let total_frames = frames.len();
    let start = start_frame.min(total_frames);
    let end_frame = start.saturating_add(frame_count).min(total_frames);

    FramePage {
        frames: frames[start..end_frame].to_vec(),
        total_frames,
        start_frame,
        end_frame,
        has_more: end_frame < total_frames,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn frames(count: usize) -> Vec<Frame> {
        (0..count)
            .map(|i| Frame {
                timestamp: i as f64,
                leader_lap: 1,
                drivers: BTreeMap::new(),
                weather: None,
            })
            .collect()
    }

    #[test]
    fn test_full_page_inside_the_sequence() {
        let all = frames(10);
        let page = paginate(&all, 2, 5);
        assert_eq!(page.frames.len(), 5);
        assert_eq!(page.frames[0].timestamp, 2.0);
        assert_eq!(page.total_frames, 10);
        assert_eq!(page.end_frame, 7);
        assert!(page.has_more);
    }

    #[test]
    fn test_last_page_is_truncated() {
        let all = frames(10);
        let page = paginate(&all, 8, 5);
        assert_eq!(page.frames.len(), 2);
        assert_eq!(page.end_frame, 10);
        assert!(!page.has_more);
    }

    #[test]
    fn test_start_beyond_total_yields_empty_page() {
        let all = frames(10);
        let page = paginate(&all, 25, 5);
        assert!(page.frames.is_empty());
        assert_eq!(page.total_frames, 10);
        assert_eq!(page.end_frame, 10);
        assert!(!page.has_more);
    }

    #[test]
    fn test_returns_exactly_min_count_total_minus_start() {
        let all = frames(7);
        for start in 0..7 {
            for count in 1..10 {
                let page = paginate(&all, start, count);
                assert_eq!(page.frames.len(), count.min(7 - start));
                assert_eq!(page.has_more, page.end_frame < 7);
            }
        }
    }

    #[test]
    fn test_empty_sequence() {
        let page = paginate(&[], 0, 100);
        assert!(page.frames.is_empty());
        assert_eq!(page.total_frames, 0);
        assert!(!page.has_more);
    }
}
