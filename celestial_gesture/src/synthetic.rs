//! Synthetic hands.
//!
//! Deterministic 21-point hands in plausible poses, used by the keyboard
//! simulator and by tests.  Every builder takes the wrist position in
//! normalised image coordinates; fingers point toward smaller `y` (up).

use crate::landmark::{
    HandFrame, Landmark, INDEX_TIP, LANDMARK_COUNT, MIDDLE_TIP, THUMB_TIP, WRIST,
};

/// Length of the wrist → middle-MCP segment.
const PALM: f32 = 0.1;

/// Horizontal offsets of the index, middle, ring and pinky columns.
const FINGER_X: [f32; 4] = [-0.03, 0.0, 0.025, 0.05];

/// Index list for [`moved`] that shifts the wrist only.
pub const WRIST_ONLY: &[usize] = &[WRIST];

/// A hand whose fist ratio (wrist→middle tip over wrist→middle MCP) is
/// exactly `ratio`.  Every finger is extended by the same amount.
pub fn hand_with_ratio(wrist: (f32, f32), ratio: f32) -> HandFrame {
    let (cx, cy) = wrist;
    let reach = PALM * (ratio - 1.0);
    let mut pts = vec![Landmark::default(); LANDMARK_COUNT];

    pts[WRIST] = Landmark::new(cx, cy, 0.0);

    // thumb: CMC, MCP, IP, TIP angled out to the left
    pts[1] = Landmark::new(cx - 0.03, cy - 0.03, -0.01);
    pts[2] = Landmark::new(cx - 0.05, cy - 0.06, -0.015);
    pts[3] = Landmark::new(cx - 0.06, cy - 0.09, -0.02);
    pts[THUMB_TIP] = Landmark::new(cx - 0.07, cy - 0.12, -0.02);

    for (f, dx) in FINGER_X.iter().enumerate() {
        let mcp = 5 + f * 4;
        let base_y = cy - PALM;
        for k in 0..4 {
            let y = base_y - reach * k as f32 / 3.0;
            pts[mcp + k] = Landmark::new(cx + dx, y, -0.01 * k as f32);
        }
    }

    HandFrame::new(pts)
}

/// Closed hand, ratio 1.0.
pub fn fist_hand(wrist: (f32, f32)) -> HandFrame {
    hand_with_ratio(wrist, 1.0)
}

/// Spread hand, ratio 2.0.
pub fn open_hand(wrist: (f32, f32)) -> HandFrame {
    hand_with_ratio(wrist, 2.0)
}

/// A relaxed hand (ratio inside the hysteresis band) whose thumb and index
/// tips are exactly `distance` apart.
pub fn pinch_hand(wrist: (f32, f32), distance: f32) -> HandFrame {
    let base = hand_with_ratio(wrist, 1.5);
    let mut pts = base.points().to_vec();
    let thumb = pts[THUMB_TIP];
    pts[INDEX_TIP] = Landmark::new(thumb.x, thumb.y - distance, thumb.z);
    HandFrame::new(pts)
}

/// Two hands making the heart pose centred on `center`.
pub fn heart_pair(center: (f32, f32)) -> (HandFrame, HandFrame) {
    heart_pair_with_middle_gap(center, 0.24)
}

/// Heart pose with the middle fingertips `gap` apart.  Gaps at or below
/// 0.15 break the pose.
pub fn heart_pair_with_middle_gap(center: (f32, f32), gap: f32) -> (HandFrame, HandFrame) {
    let (cx, cy) = center;
    let half = gap / 2.0;

    let build = |side: f32| {
        let wrist = (cx + side * 0.1, cy + 0.15);
        let mut pts = hand_with_ratio(wrist, 1.6).points().to_vec();
        pts[THUMB_TIP]  = Landmark::new(cx + side * 0.02, cy + 0.04, 0.0);
        pts[INDEX_TIP]  = Landmark::new(cx + side * 0.02, cy - 0.04, 0.0);
        pts[MIDDLE_TIP] = Landmark::new(cx + side * half, cy - 0.10, 0.0);
        HandFrame::new(pts)
    };

    (build(-1.0), build(1.0))
}

/// Copy of `hand` with the listed landmarks shifted by `(dx, dy)`.
pub fn moved(hand: &HandFrame, indices: &[usize], offset: (f32, f32)) -> HandFrame {
    let mut pts = hand.points().to_vec();
    for &i in indices {
        if let Some(p) = pts.get_mut(i) {
            p.x += offset.0;
            p.y += offset.1;
        }
    }
    HandFrame::new(pts)
}

/// Copy of `hand` translated as a whole.
pub fn translated(hand: &HandFrame, offset: (f32, f32)) -> HandFrame {
    let all: Vec<usize> = (0..hand.len()).collect();
    moved(hand, &all, offset)
}
