// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Links as produced by engines and as delivered to consumers.

Engines are dynamically typed: they hand back [`RawLink`]s whose payload may
hold any [`PayloadValue`]. The generator converts them to [`Link`]s carrying
exactly `arity` floating-point values, rejecting anything else.
*/

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConnGenError, ConnGenResult};
use crate::interval::Index;

/// Engine-native payload value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PayloadValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Text(String),
    Missing,
}

impl PayloadValue {
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PayloadValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            PayloadValue::Float(_) => "float",
            PayloadValue::Int(_) => "int",
            PayloadValue::Bool(_) => "bool",
            PayloadValue::Text(_) => "text",
            PayloadValue::Missing => "missing",
        }
    }
}

impl From<f64> for PayloadValue {
    fn from(v: f64) -> Self {
        PayloadValue::Float(v)
    }
}

impl fmt::Display for PayloadValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadValue::Float(v) => write!(f, "{}", v),
            PayloadValue::Int(v) => write!(f, "{}", v),
            PayloadValue::Bool(v) => write!(f, "{}", v),
            PayloadValue::Text(v) => write!(f, "{:?}", v),
            PayloadValue::Missing => write!(f, "<missing>"),
        }
    }
}

/// Link as yielded by an engine cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLink {
    pub source: Index,
    pub target: Index,
    pub values: Vec<PayloadValue>,
}

impl RawLink {
    pub fn new(source: Index, target: Index, values: Vec<PayloadValue>) -> Self {
        Self {
            source,
            target,
            values,
        }
    }

    /// Link whose payload is all floats
    pub fn numeric(source: Index, target: Index, values: &[f64]) -> Self {
        Self {
            source,
            target,
            values: values.iter().copied().map(PayloadValue::Float).collect(),
        }
    }

    /// Write the first `out.len()` payload slots into `out` as floats
    ///
    /// Absent slots count as non-numeric. `out` is left untouched on error.
    pub fn write_values(&self, out: &mut [f64]) -> ConnGenResult<()> {
        for slot in 0..out.len() {
            let value = self.values.get(slot).unwrap_or(&PayloadValue::Missing);
            if value.as_float().is_none() {
                return Err(ConnGenError::TypeMismatch {
                    slot,
                    found: value.type_name().to_string(),
                });
            }
        }
        for (dst, value) in out.iter_mut().zip(&self.values) {
            if let PayloadValue::Float(v) = value {
                *dst = *v;
            }
        }
        Ok(())
    }
}

/// Link delivered to the consumer: `(source, target, value₁…valueₖ)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: Index,
    pub target: Index,
    pub values: Vec<f64>,
}

impl Link {
    pub fn new(source: Index, target: Index, values: Vec<f64>) -> Self {
        Self {
            source,
            target,
            values,
        }
    }

    /// Convert a raw link, taking exactly `arity` float values
    pub fn from_raw(raw: &RawLink, arity: usize) -> ConnGenResult<Self> {
        let mut values = vec![0.0; arity];
        raw.write_values(&mut values)?;
        Ok(Self {
            source: raw.source,
            target: raw.target,
            values,
        })
    }
}
