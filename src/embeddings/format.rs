// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding vector rendering
//!
//! Both endpoints return the vector as a single string: the values inside
//! square brackets, separated by single spaces. The two backends differ only
//! in how each value is printed:
//!
//! - [`VectorFormat::Fixed10`]: fixed-point with ten fractional digits
//!   (`[0.0123456789 -0.5000000000]`), used by the local ONNX backend.
//! - [`VectorFormat::Repr`]: shortest round-trip decimal that always keeps a
//!   fractional part or exponent (`[0.5 1.0 -2e-05]`), used by the remote
//!   backend, which passes through the numbers the API returned.

use anyhow::{Context, Result};

/// How the values of an embedding are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFormat {
    /// `{:.10}` per value
    Fixed10,
    /// Shortest round-trip decimal, scientific outside `[1e-4, 1e16)`
    Repr,
}

impl VectorFormat {
    /// Renders a vector as `"[v0 v1 ... vn]"`
    pub fn render(&self, values: &[f64]) -> String {
        let mut out = String::with_capacity(values.len() * 14 + 2);
        out.push('[');
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            match self {
                VectorFormat::Fixed10 => out.push_str(&fixed10(*value)),
                VectorFormat::Repr => out.push_str(&repr(*value)),
            }
        }
        out.push(']');
        out
    }
}

fn non_finite(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("nan")
    } else if value == f64::INFINITY {
        Some("inf")
    } else if value == f64::NEG_INFINITY {
        Some("-inf")
    } else {
        None
    }
}

fn fixed10(value: f64) -> String {
    if let Some(s) = non_finite(value) {
        return s.to_string();
    }
    format!("{:.10}", value)
}

fn repr(value: f64) -> String {
    if let Some(s) = non_finite(value) {
        return s.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let magnitude = value.abs();
    if (1e-4..1e16).contains(&magnitude) {
        let s = value.to_string();
        if s.contains('.') {
            s
        } else {
            format!("{}.0", s)
        }
    } else {
        // `{:e}` gives the shortest mantissa, e.g. "2e-5"; widen the exponent
        // to a signed two-digit field ("2e-05", "1.5e+16").
        let s = format!("{:e}", value);
        match s.split_once('e') {
            Some((mantissa, exponent)) => {
                let exponent: i32 = exponent.parse().unwrap_or(0);
                let sign = if exponent < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exponent.abs())
            }
            None => s,
        }
    }
}

/// Parses an embedding string produced by either format back into floats
///
/// Accepts `"[a b c]"`, tolerating extra whitespace. `"[]"` yields an empty
/// vector.
pub fn parse_vector_string(s: &str) -> Result<Vec<f32>> {
    let inner = s.trim();
    let inner = inner.strip_prefix('[').unwrap_or(inner);
    let inner = inner.strip_suffix(']').unwrap_or(inner);

    inner
        .split_whitespace()
        .enumerate()
        .map(|(i, part)| {
            part.parse::<f32>()
                .with_context(|| format!("Invalid vector element {} at index {}", part, i))
        })
        .collect()
}
