//! Hand landmark frames as delivered by the external tracker.

use serde::{Deserialize, Serialize};

use crate::error::{InstrumentError, Result};

pub const LANDMARK_COUNT: usize = 21;
/// Values per hand in a flat `[x, y, z, x, y, z, ...]` array.
pub const VALUES_PER_HAND: usize = LANDMARK_COUNT * 3;

pub const WRIST: usize = 0;
/// Thumb, index, middle, ring and pinky tips.
pub const FINGERTIPS: [usize; 5] = [4, 8, 12, 16, 20];
/// Index, middle, ring and pinky MCP joints.
pub const KNUCKLES: [usize; 4] = [5, 9, 13, 17];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Landmark { x, y, z }
    }

    /// 3D distance with depth weighted at half scale.
    pub fn distance_half_z(&self, other: &Landmark) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = (self.z - other.z) * 0.5;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn distance(&self, other: &Landmark) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn planar_distance(&self, other: &Landmark) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// Parse the tracker's label (`"Left"` / `"Right"`, any case).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Handedness::Left),
            "right" => Some(Handedness::Right),
            _ => None,
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Handedness::Left => Handedness::Right,
            Handedness::Right => Handedness::Left,
        }
    }
}

/// One detected hand in one video frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandFrame {
    pub landmarks: [Landmark; LANDMARK_COUNT],
    pub handedness: Handedness,
}

impl HandFrame {
    pub fn new(landmarks: [Landmark; LANDMARK_COUNT], handedness: Handedness) -> Self {
        HandFrame {
            landmarks,
            handedness,
        }
    }

    /// Build from exactly [`VALUES_PER_HAND`] coordinates.
    pub fn from_flat(values: &[f64], handedness: Handedness) -> Result<Self> {
        if values.len() != VALUES_PER_HAND {
            return Err(InstrumentError::InvalidLandmarks {
                expected: VALUES_PER_HAND,
                found: values.len(),
            });
        }
        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        for (lm, xyz) in landmarks.iter_mut().zip(values.chunks_exact(3)) {
            *lm = Landmark::new(xyz[0], xyz[1], xyz[2]);
        }
        Ok(HandFrame::new(landmarks, handedness))
    }

    /// Split a flat array holding one hand per label. Hands with an
    /// unrecognized label are dropped.
    pub fn parse_all<S: AsRef<str>>(values: &[f64], labels: &[S]) -> Result<Vec<HandFrame>> {
        let expected = labels.len() * VALUES_PER_HAND;
        if values.len() != expected {
            return Err(InstrumentError::InvalidLandmarks {
                expected,
                found: values.len(),
            });
        }
        let mut hands = Vec::with_capacity(labels.len());
        for (chunk, label) in values.chunks_exact(VALUES_PER_HAND).zip(labels) {
            match Handedness::from_label(label.as_ref()) {
                Some(handedness) => hands.push(HandFrame::from_flat(chunk, handedness)?),
                None => log::debug!("Dropping hand with label '{}'", label.as_ref()),
            }
        }
        Ok(hands)
    }

    pub fn wrist(&self) -> Landmark {
        self.landmarks[WRIST]
    }

    /// Mean of the wrist and the four knuckles.
    pub fn palm_center(&self) -> Landmark {
        let points = std::iter::once(WRIST).chain(KNUCKLES).map(|i| self.landmarks[i]);
        let (sx, sy, sz) = points.fold((0.0, 0.0, 0.0), |(x, y, z), p| (x + p.x, y + p.y, z + p.z));
        let n = (KNUCKLES.len() + 1) as f64;
        Landmark::new(sx / n, sy / n, sz / n)
    }

    /// Median fingertip-to-wrist distance.
    pub fn openness(&self) -> f64 {
        let wrist = self.wrist();
        let mut d = FINGERTIPS.map(|i| self.landmarks[i].distance_half_z(&wrist));
        d.sort_by(f64::total_cmp);
        d[FINGERTIPS.len() / 2]
    }

    /// Wrist depth minus mean knuckle depth.
    pub fn palm_tilt(&self) -> f64 {
        let knuckle_z = KNUCKLES.iter().map(|&i| self.landmarks[i].z).sum::<f64>() / KNUCKLES.len() as f64;
        self.wrist().z - knuckle_z
    }

    pub fn is_finite(&self) -> bool {
        self.landmarks
            .iter()
            .all(|l| l.x.is_finite() && l.y.is_finite() && l.z.is_finite())
    }
}

/// A synthetic hand for tests: fingertips `reach` away from the wrist.
#[cfg(test)]
pub(crate) fn test_hand(handedness: Handedness, wrist: (f64, f64), reach: f64) -> HandFrame {
    let (wx, wy) = wrist;
    let mut landmarks = [Landmark::new(wx, wy, 0.0); LANDMARK_COUNT];
    for (n, &k) in KNUCKLES.iter().enumerate() {
        landmarks[k] = Landmark::new(wx - 0.03 + 0.02 * n as f64, wy - 0.05, 0.0);
    }
    for &tip in &FINGERTIPS {
        landmarks[tip] = Landmark::new(wx, wy - reach, 0.0);
    }
    HandFrame::new(landmarks, handedness)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_array_must_hold_whole_hands() {
        let err = HandFrame::from_flat(&[0.0; 10], Handedness::Left).unwrap_err();
        assert!(matches!(
            err,
            InstrumentError::InvalidLandmarks { expected: 63, found: 10 }
        ));

        let values: Vec<f64> = (0..VALUES_PER_HAND * 2).map(|i| i as f64).collect();
        let hands = HandFrame::parse_all(&values, &["Right", "Left"]).unwrap();
        assert_eq!(hands.len(), 2);
        assert_eq!(hands[0].handedness, Handedness::Right);
        assert_eq!(hands[1].landmarks[0], Landmark::new(63.0, 64.0, 65.0));

        assert!(HandFrame::parse_all(&values, &["Left"]).is_err());
    }

    #[test]
    fn unknown_labels_are_dropped() {
        let values = vec![0.5; VALUES_PER_HAND * 2];
        let hands = HandFrame::parse_all(&values, &["Left", "Unknown"]).unwrap();
        assert_eq!(hands.len(), 1);
    }

    #[test]
    fn openness_is_median_tip_distance() {
        let mut hand = test_hand(Handedness::Left, (0.5, 0.5), 0.2);
        // One wild fingertip does not move the median.
        hand.landmarks[FINGERTIPS[0]] = Landmark::new(0.5, -0.5, 0.0);
        assert!((hand.openness() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn depth_counts_half_in_openness() {
        let mut hand = test_hand(Handedness::Right, (0.5, 0.5), 0.0);
        for &tip in &FINGERTIPS {
            hand.landmarks[tip] = Landmark::new(0.5, 0.5, 0.2);
        }
        assert!((hand.openness() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn palm_center_averages_wrist_and_knuckles() {
        let hand = test_hand(Handedness::Left, (0.5, 0.5), 0.2);
        let c = hand.palm_center();
        assert!((c.y - (0.5 - 0.05 * 4.0 / 5.0)).abs() < 1e-12);
        assert!((c.x - (0.5 + (-0.03 - 0.01 + 0.01 + 0.03) / 5.0)).abs() < 1e-12);
    }
}
