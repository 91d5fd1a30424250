//! `#[serde(with = "serde_b58")]`: keys as base-58 strings instead of byte arrays.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serializer};
use solana_sdk::pubkey::Pubkey;

pub fn serialize<S: Serializer>(key: &Pubkey, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&key.to_string())
}

pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Pubkey, D::Error> {
    let raw = String::deserialize(d)?;
    Pubkey::from_str(&raw).map_err(serde::de::Error::custom)
}
