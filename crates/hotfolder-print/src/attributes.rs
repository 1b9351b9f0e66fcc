// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mapping of operator-supplied JSON job attributes onto IPP values.

use ipp::prelude::*;
use serde_json::Value;
use tracing::warn;

use hotfolder_core::types::{JOB_NAME_KEY, JobAttributes};

/// Convert a JSON value into an IPP value.
///
/// Booleans, integers in `i32` range, strings (as keywords) and homogeneous
/// arrays of those are supported. Anything else yields `None`.
pub fn to_ipp_value(value: &Value) -> Option<IppValue> {
    match value {
        Value::Bool(b) => Some(IppValue::Boolean(*b)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .map(IppValue::Integer),
        Value::String(s) => Some(IppValue::Keyword(s.clone())),
        Value::Array(items) => items
            .iter()
            .map(to_ipp_value)
            .collect::<Option<Vec<_>>>()
            .filter(|values| !values.is_empty())
            .map(IppValue::Array),
        Value::Null | Value::Object(_) => None,
    }
}

/// Convert every attribute except the job name into an [`IppAttribute`].
///
/// The job name travels as the Print-Job `job-name` operation attribute and
/// is handled separately by the client. Unconvertible entries are dropped
/// with a warning so one bad default cannot block every job.
pub fn job_attributes_to_ipp(attributes: &JobAttributes) -> Vec<IppAttribute> {
    attributes
        .iter()
        .filter(|(name, _)| name.as_str() != JOB_NAME_KEY)
        .filter_map(|(name, value)| match to_ipp_value(value) {
            Some(ipp_value) => Some(IppAttribute::new(name, ipp_value)),
            None => {
                warn!(attribute = %name, %value, "dropping job attribute with no IPP mapping");
                None
            }
        })
        .collect()
}
