use serde::Serialize;
use std::ops::Index;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
/// One decoded leaf of one row.
pub enum Value {
    /// A leaf holding exactly one value at this row.
    Scalar(f64),
    /// A leaf holding any other number of values at this row, including none.
    Array(Vec<f64>),
}

impl Value {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            Value::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            Value::Scalar(_) => None,
            Value::Array(values) => Some(values),
        }
    }

    /// Number of values carried: 1 for a scalar.
    pub fn arity(&self) -> usize {
        match self {
            Value::Scalar(_) => 1,
            Value::Array(values) => values.len(),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(values: Vec<f64>) -> Self {
        Value::Array(values)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
/// The values of one row, one per selected leaf, in selection order.
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Value> {
        self.values.get(i)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }
}

impl Index<usize> for Record {
    type Output = Value;

    fn index(&self, i: usize) -> &Value {
        &self.values[i]
    }
}

impl FromIterator<Value> for Record {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Record {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        let scalar = Value::from(1.5);
        assert_eq!(scalar.as_scalar(), Some(1.5));
        assert_eq!(scalar.as_array(), None);
        assert_eq!(scalar.arity(), 1);

        let empty = Value::from(vec![]);
        assert_eq!(empty.as_scalar(), None);
        assert_eq!(empty.arity(), 0);
        assert_eq!(empty.as_array(), Some(&[][..]));
    }

    #[test]
    fn test_record_serializes_as_nested_list() {
        let record: Record = vec![Value::from(vec![5.0, 6.0]), Value::from(1.0)]
            .into_iter()
            .collect();

        assert_eq!(record.len(), 2);
        assert_eq!(record[1], Value::Scalar(1.0));
        assert_eq!(serde_json::to_string(&record).unwrap(), "[[5.0,6.0],1.0]");
        assert_eq!(serde_json::to_string(&Record::default()).unwrap(), "[]");

        let values = record.into_values();
        assert_eq!(values, vec![Value::Array(vec![5.0, 6.0]), Value::Scalar(1.0)]);
    }
}
