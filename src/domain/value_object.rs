//! Value objects of the session domain.

use super::DomainError;

/// Length of a flattened hand-landmark feature vector:
/// 2 hand slots x 21 landmarks x 3 coordinates.
pub const FEATURE_LEN: usize = 126;

/// Opaque peer-addressable identifier.
///
/// Issued out of band (see `session::identity`) and embedded verbatim in the
/// peer-scoped channel URLs, so the accepted alphabet is restricted to
/// characters that need no escaping there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(value: String) -> Result<Self, DomainError> {
        let valid = !value.is_empty()
            && value.len() <= 64
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidPeerId(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix timestamp in milliseconds (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Prediction confidence in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidConfidence(value))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Fixed-width hand-landmark feature vector.
///
/// Always exactly [`FEATURE_LEN`] finite elements; absent hand slots are
/// zero-padded. A vector never encodes "no hands detected" by itself — that
/// is carried by the explicit `has_hands` flag next to it, and consumers must
/// branch on the flag, not on vector content.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Result<Self, DomainError> {
        if values.len() != FEATURE_LEN {
            return Err(DomainError::InvalidVectorLength {
                expected: FEATURE_LEN,
                actual: values.len(),
            });
        }
        for (index, value) in values.iter().enumerate() {
            if !value.is_finite() {
                return Err(DomainError::NonFiniteElement { index });
            }
        }
        Ok(Self(values))
    }

    /// The all-zero vector used alongside `has_hands = false`
    pub fn zeroed() -> Self {
        Self(vec![0.0; FEATURE_LEN])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.clone()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_id_accepts_url_safe_identifier() {
        // テスト項目: 英数字とハイフン・アンダースコアからなる ID が受理される
        // given (前提条件):
        let raw = "ABCD1234".to_string();

        // when (操作):
        let peer_id = PeerId::new(raw);

        // then (期待する結果):
        assert_eq!(peer_id.unwrap().as_str(), "ABCD1234");
    }

    #[test]
    fn test_peer_id_rejects_empty_string() {
        // テスト項目: 空文字列の ID が拒否される
        // given (前提条件):
        let raw = String::new();

        // when (操作):
        let peer_id = PeerId::new(raw);

        // then (期待する結果):
        assert!(peer_id.is_err());
    }

    #[test]
    fn test_peer_id_rejects_url_breaking_characters() {
        // テスト項目: URL を壊す文字を含む ID が拒否される
        // given (前提条件):
        let raw = "abc/../def".to_string();

        // when (操作):
        let peer_id = PeerId::new(raw);

        // then (期待する結果):
        assert!(peer_id.is_err());
    }

    #[test]
    fn test_confidence_accepts_boundary_values() {
        // テスト項目: 境界値 0.0 と 1.0 が受理される
        // given (前提条件):

        // when (操作):
        let zero = Confidence::new(0.0);
        let one = Confidence::new(1.0);

        // then (期待する結果):
        assert_eq!(zero.unwrap().value(), 0.0);
        assert_eq!(one.unwrap().value(), 1.0);
    }

    #[test]
    fn test_confidence_rejects_out_of_range_values() {
        // テスト項目: [0, 1] の範囲外・非有限の値が拒否される
        // given (前提条件):

        // when (操作):
        let negative = Confidence::new(-0.1);
        let above_one = Confidence::new(1.2);
        let nan = Confidence::new(f64::NAN);

        // then (期待する結果):
        assert!(negative.is_err());
        assert!(above_one.is_err());
        assert!(nan.is_err());
    }

    #[test]
    fn test_feature_vector_requires_exact_length() {
        // テスト項目: 長さが 126 以外のベクトルが拒否される
        // given (前提条件):
        let short = vec![0.5; FEATURE_LEN - 1];
        let long = vec![0.5; FEATURE_LEN + 1];

        // when (操作):
        let short_result = FeatureVector::new(short);
        let long_result = FeatureVector::new(long);

        // then (期待する結果):
        assert!(matches!(
            short_result,
            Err(DomainError::InvalidVectorLength { .. })
        ));
        assert!(matches!(
            long_result,
            Err(DomainError::InvalidVectorLength { .. })
        ));
    }

    #[test]
    fn test_feature_vector_rejects_non_finite_elements() {
        // テスト項目: 非有限の要素を含むベクトルが拒否される
        // given (前提条件):
        let mut values = vec![0.5; FEATURE_LEN];
        values[17] = f32::NAN;

        // when (操作):
        let result = FeatureVector::new(values);

        // then (期待する結果):
        assert_eq!(result, Err(DomainError::NonFiniteElement { index: 17 }));
    }

    #[test]
    fn test_feature_vector_zeroed_has_full_length() {
        // テスト項目: zeroed が長さ 126 の全ゼロベクトルを返す
        // given (前提条件):

        // when (操作):
        let vector = FeatureVector::zeroed();

        // then (期待する結果):
        assert_eq!(vector.as_slice().len(), FEATURE_LEN);
        assert!(vector.is_zero());
    }

    #[test]
    fn test_feature_vector_is_zero_detects_nonzero_element() {
        // テスト項目: 非ゼロ要素を含むベクトルで is_zero が false になる
        // given (前提条件):
        let mut values = vec![0.0; FEATURE_LEN];
        values[0] = 0.25;
        let vector = FeatureVector::new(values).unwrap();

        // when (操作):
        let result = vector.is_zero();

        // then (期待する結果):
        assert!(!result);
    }
}
