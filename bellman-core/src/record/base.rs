use crate::error::BellmanError;
use std::collections::HashMap;

/// Value stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single value, such as a loss.
    Scalar(f32),
}

/// Key-value pairs produced by agents, for example the loss of a training step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, BellmanError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            None => Err(BellmanError::RecordKeyError(k.to_string())),
        }
    }

    /// Returns `true` if the record contains no key-value pairs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_scalar() {
        let record = Record::from_slice(&[
            ("loss", RecordValue::Scalar(0.25)),
            ("n_opts", RecordValue::Scalar(3.0)),
        ]);
        assert_eq!(record.get_scalar("loss"), Ok(0.25));
        assert_eq!(record.get_scalar("n_opts"), Ok(3.0));
        assert_eq!(
            record.get_scalar("q"),
            Err(BellmanError::RecordKeyError("q".to_string()))
        );
    }

    #[test]
    fn test_empty() {
        assert!(Record::empty().is_empty());
        assert!(!Record::from_slice(&[("loss", RecordValue::Scalar(0.0))]).is_empty());
    }
}
