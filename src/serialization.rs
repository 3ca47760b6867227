// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! JSON, BSON and MessagePack renditions of the same logical objects.
//!
//! MessagePack is written with field names, so every format carries the same self-describing
//! structure and optional fields can be omitted.

use serde::{de::DeserializeOwned, Serialize};

use crate::Result;

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    Ok(serde_json::from_str(json)?)
}

/// Fails for values that are not documents, such as bare strings or integers.
pub fn to_bson<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bson::to_vec(value)?)
}

pub fn from_bson<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bson::from_slice(bytes)?)
}

pub fn to_msgpack<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(value)?)
}

pub fn from_msgpack<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(rmp_serde::from_slice(bytes)?)
}
