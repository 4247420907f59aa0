//! Typed payloads: dataset arrays and attribute values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DType {
    #[serde(rename = "f64")]
    F64,
    #[serde(rename = "i64")]
    I64,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F64 => write!(f, "f64"),
            DType::I64 => write!(f, "i64"),
        }
    }
}

/// Flat, row-major dataset payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrayData {
    #[serde(rename = "f64")]
    F64(Vec<f64>),
    #[serde(rename = "i64")]
    I64(Vec<i64>),
}

impl ArrayData {
    pub fn dtype(&self) -> DType {
        match self {
            ArrayData::F64(_) => DType::F64,
            ArrayData::I64(_) => DType::I64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayData::F64(v) => v.len(),
            ArrayData::I64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An empty payload of the given type.
    pub fn empty(dtype: DType) -> Self {
        match dtype {
            DType::F64 => ArrayData::F64(Vec::new()),
            DType::I64 => ArrayData::I64(Vec::new()),
        }
    }

    /// Element `index` widened to `f64`.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match self {
            ArrayData::F64(v) => v.get(index).copied(),
            ArrayData::I64(v) => v.get(index).map(|x| *x as f64),
        }
    }

    /// Store `value` at `index`; integer payloads truncate toward zero.
    pub fn set_f64(&mut self, index: usize, value: f64) -> bool {
        match self {
            ArrayData::F64(v) => v.get_mut(index).map(|slot| *slot = value).is_some(),
            ArrayData::I64(v) => v.get_mut(index).map(|slot| *slot = value as i64).is_some(),
        }
    }

    /// Arithmetic mean over every element. NaN when empty.
    pub fn mean(&self) -> f64 {
        let n = self.len();
        if n == 0 {
            return f64::NAN;
        }
        let sum: f64 = match self {
            ArrayData::F64(v) => v.iter().sum(),
            ArrayData::I64(v) => v.iter().map(|x| *x as f64).sum(),
        };
        sum / n as f64
    }

    /// Grow or shrink to `len` elements, zero-filling new slots.
    pub fn resize(&mut self, len: usize) {
        match self {
            ArrayData::F64(v) => v.resize(len, 0.0),
            ArrayData::I64(v) => v.resize(len, 0),
        }
    }

    /// Overwrite elements starting at `offset` with `src`.
    ///
    /// Returns false when the types differ or the write would run past the end.
    pub fn write_at(&mut self, offset: usize, src: &ArrayData) -> bool {
        if offset + src.len() > self.len() {
            return false;
        }
        match (self, src) {
            (ArrayData::F64(dst), ArrayData::F64(s)) => {
                dst[offset..offset + s.len()].copy_from_slice(s);
                true
            }
            (ArrayData::I64(dst), ArrayData::I64(s)) => {
                dst[offset..offset + s.len()].copy_from_slice(s);
                true
            }
            _ => false,
        }
    }
}

/// Attribute value attached to a group or dataset.
///
/// Scalars are length-1 arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    #[serde(rename = "int")]
    Int(Vec<i64>),
    #[serde(rename = "float")]
    Float(Vec<f64>),
    #[serde(rename = "str")]
    Str(Vec<String>),
    #[serde(rename = "bytes")]
    Bytes(Vec<Vec<u8>>),
}

impl AttrValue {
    pub fn int(value: i64) -> Self {
        AttrValue::Int(vec![value])
    }

    pub fn float(value: f64) -> Self {
        AttrValue::Float(vec![value])
    }

    pub fn text(value: impl Into<String>) -> Self {
        AttrValue::Str(vec![value.into()])
    }

    /// Byte-encoded string list.
    pub fn byte_strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        AttrValue::Bytes(
            items
                .into_iter()
                .map(|s| s.as_ref().as_bytes().to_vec())
                .collect(),
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AttrValue::Int(_) => "int",
            AttrValue::Float(_) => "float",
            AttrValue::Str(_) => "str",
            AttrValue::Bytes(_) => "bytes",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AttrValue::Int(v) => v.len(),
            AttrValue::Float(v) => v.len(),
            AttrValue::Str(v) => v.len(),
            AttrValue::Bytes(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First element of an integer attribute.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => v.first().copied(),
            _ => None,
        }
    }

    /// Numeric elements widened to `f64`; `None` for string kinds.
    pub fn as_f64s(&self) -> Option<Vec<f64>> {
        match self {
            AttrValue::Int(v) => Some(v.iter().map(|x| *x as f64).collect()),
            AttrValue::Float(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Decode a byte or string list to text, lossily.
    pub fn to_strings(&self) -> Option<Vec<String>> {
        match self {
            AttrValue::Bytes(v) => Some(
                v.iter()
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .collect(),
            ),
            AttrValue::Str(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Concatenate `other` after `self`. Int with Float promotes to Float.
    pub fn appended(&self, other: &AttrValue) -> Result<AttrValue, String> {
        match (self, other) {
            (AttrValue::Int(a), AttrValue::Int(b)) => {
                Ok(AttrValue::Int(a.iter().chain(b).copied().collect()))
            }
            (AttrValue::Str(a), AttrValue::Str(b)) => {
                Ok(AttrValue::Str(a.iter().chain(b).cloned().collect()))
            }
            (AttrValue::Bytes(a), AttrValue::Bytes(b)) => {
                Ok(AttrValue::Bytes(a.iter().chain(b).cloned().collect()))
            }
            (a, b) => match (a.as_f64s(), b.as_f64s()) {
                (Some(mut x), Some(y)) => {
                    x.extend(y);
                    Ok(AttrValue::Float(x))
                }
                _ => Err(format!("cannot append {} to {}", b.kind(), a.kind())),
            },
        }
    }

    /// Element-wise `sqrt(self^2 + other^2)`.
    pub fn quadrature(&self, other: &AttrValue) -> Result<AttrValue, String> {
        let (a, b) = match (self.as_f64s(), other.as_f64s()) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(format!(
                    "quadrature needs numeric values, got {} and {}",
                    self.kind(),
                    other.kind()
                ))
            }
        };
        if a.len() != b.len() {
            return Err(format!(
                "quadrature length mismatch: {} vs {}",
                a.len(),
                b.len()
            ));
        }
        Ok(AttrValue::Float(
            a.iter()
                .zip(&b)
                .map(|(x, y)| (x * x + y * y).sqrt())
                .collect(),
        ))
    }
}
