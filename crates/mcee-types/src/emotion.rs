use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::error::{clamp01, Error, Result};

/// Order-pinned emotion labels. Index into `EmotionVector` matches this
/// order exactly; tests and the wire codec both depend on it.
pub const EMOTION_NAMES: [&str; 24] = [
    "Admiration",
    "Adoration",
    "AestheticAppreciation",
    "Amusement",
    "Anxiety",
    "Awe",
    "Embarrassment",
    "Boredom",
    "Calm",
    "Confusion",
    "Disgust",
    "EmpathicPain",
    "Fascination",
    "Excitement",
    "Fear",
    "Horror",
    "Interest",
    "Joy",
    "Nostalgia",
    "Relief",
    "Sadness",
    "Satisfaction",
    "Sympathy",
    "Triumph",
];

pub const EMOTION_COUNT: usize = 24;

fn index_of(name: &str) -> Option<usize> {
    EMOTION_NAMES.iter().position(|n| *n == name)
}

/// The 24-dimensional emotion vector, values clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionVector(pub [f64; EMOTION_COUNT]);

impl Default for EmotionVector {
    fn default() -> Self {
        EmotionVector([0.0; EMOTION_COUNT])
    }
}

impl EmotionVector {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn clamp(&mut self) {
        for v in self.0.iter_mut() {
            *v = clamp01(*v);
        }
    }

    pub fn clamped(mut self) -> Self {
        self.clamp();
        self
    }

    pub fn mean(&self) -> f64 {
        self.0.iter().sum::<f64>() / EMOTION_COUNT as f64
    }

    pub fn max(&self) -> f64 {
        self.0.iter().cloned().fold(f64::MIN, f64::max)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        index_of(name).map(|i| self.0[i])
    }

    /// Euclidean distance between two vectors, not normalised.
    pub fn euclidean_distance(&self, other: &EmotionVector) -> f64 {
        self.0
        .iter()
        .zip(other.0.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        .sqrt()
    }

    /// Euclidean distance normalised by `sqrt(24)`, used by the dream
    /// engine's consolidation-score (Csocial) formula.
    pub fn normalised_distance(&self, other: &EmotionVector) -> f64 {
        self.euclidean_distance(other) / (EMOTION_COUNT as f64).sqrt()
    }

    pub fn index_of_dominant(&self) -> usize {
        let mut best = 0usize;
        let mut best_val = f64::MIN;
        for (i, v) in self.0.iter().enumerate() {
            if *v > best_val {
                best_val = *v;
                best = i;
            }
        }
        best
    }

    pub fn dominant_name(&self) -> &'static str {
        EMOTION_NAMES[self.index_of_dominant()]
    }

    /// Decodes a raw emotion payload keyed by label. Unknown keys are ignored; a missing labelled
    /// dimension is rejected with `MissingInput`, and any value outside
    /// `[0, 1]` is rejected with `OutOfRange` rather than silently
    /// defaulted (see DESIGN.md, Open Question 5).
    pub fn from_named_map(map: &HashMap<String, f64>) -> Result<Self> {
        let mut out = [0.0; EMOTION_COUNT];
        for (i, name) in EMOTION_NAMES.iter().enumerate() {
            let value = map
            .get(*name)
            .ok_or_else(|| Error::MissingInput(name.to_string()))?;
            if !value.is_finite() || *value < 0.0 || *value > 1.0 {
                return Err(Error::OutOfRange {
                        field: name.to_string(),
                        value: *value,
                        lo: 0.0,
                        hi: 1.0,
                });
            }
            out[i] = *value;
        }
        Ok(EmotionVector(out))
    }

    pub fn to_named_map(&self) -> HashMap<String, f64> {
        EMOTION_NAMES
        .iter()
        .zip(self.0.iter())
        .map(|(name, value)| (name.to_string(), *value))
        .collect()
    }
}

impl Index<usize> for EmotionVector {
    type Output = f64;
    fn index(&self, idx: usize) -> &f64 {
        &self.0[idx]
    }
}

impl IndexMut<usize> for EmotionVector {
    fn index_mut(&mut self, idx: usize) -> &mut f64 {
        &mut self.0[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_pinned() {
        assert_eq!(EMOTION_NAMES[0], "Admiration");
        assert_eq!(EMOTION_NAMES[17], "Joy");
        assert_eq!(EMOTION_NAMES[23], "Triumph");
    }

    #[test]
    fn missing_dimension_is_rejected() {
        let mut map = HashMap::new();
        for name in EMOTION_NAMES.iter().skip(1) {
            map.insert(name.to_string(), 0.1);
        }
        let err = EmotionVector::from_named_map(&map).unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn out_of_range_is_rejected() {
        let mut map: HashMap<String, f64> =
        EMOTION_NAMES.iter().map(|n| (n.to_string(), 0.1)).collect();
        map.insert("Joy".to_string(), 1.5);
        let err = EmotionVector::from_named_map(&map).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { .. }));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut map: HashMap<String, f64> =
        EMOTION_NAMES.iter().map(|n| (n.to_string(), 0.2)).collect();
        map.insert("NotAnEmotion".to_string(), 99.0);
        let vector = EmotionVector::from_named_map(&map).unwrap();
        assert_eq!(vector.mean(), 0.2);
    }
}
