//! # Numeric Fidelity
//!
//! JSON numbers are IEEE-754 doubles on most peers, so anything above 2^53
//! silently loses precision. Amounts therefore travel as strings:
//!
//! - `u64` as a decimal string (`"18446744073709551615"`)
//! - `U256` as `0x`-prefixed lowercase hex (`"0xde0b6b3a7640000"`)
//!
//! Decoding accepts decimal or `0x` hex text for both, plus plain JSON
//! integers that fit in a `u64`. Token maps travel as `[[key, value], ...]`
//! and decode from either that list or a plain object.
//!
//! All adapters are `serde_with` types, used as
//! `#[serde_as(as = "U64String")]`.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use primitive_types::U256;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serializer};
use serde_with::de::DeserializeAsWrap;
use serde_with::ser::SerializeAsWrap;
use serde_with::{DeserializeAs, Same, SerializeAs};

use crate::errors::CodecError;

/// Native token id → amount, ordered by token id.
pub type TokenAmounts = BTreeMap<String, U256>;

/// `u64` as decimal text.
pub struct U64String;

/// `U256` as `0x` hex text.
pub struct U256Hex;

/// Ordered map as a list of `[key, value]` pairs.
pub struct PairList<KAs = Same, VAs = Same>(PhantomData<(KAs, VAs)>);

#[derive(Deserialize)]
#[serde(untagged)]
enum NumericRepr {
    Number(u64),
    Text(String),
}

/// Parses decimal or `0x` hex text into a `u64`.
pub fn parse_u64(text: &str) -> Result<u64, CodecError> {
    let trimmed = text.trim();
    let parsed = match strip_hex_prefix(trimmed) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => trimmed.parse::<u64>().ok(),
    };
    parsed.ok_or_else(|| CodecError::InvalidAmount(text.to_string()))
}

/// Parses decimal or `0x` hex text into a `U256`.
pub fn parse_u256(text: &str) -> Result<U256, CodecError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CodecError::InvalidAmount(text.to_string()));
    }
    let parsed = match strip_hex_prefix(trimmed) {
        Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
        Some(_) => None,
        None if trimmed.bytes().all(|b| b.is_ascii_digit()) => U256::from_dec_str(trimmed).ok(),
        None => None,
    };
    parsed.ok_or_else(|| CodecError::InvalidAmount(text.to_string()))
}

/// Canonical wire form of a `U256`.
#[must_use]
pub fn u256_to_hex(value: &U256) -> String {
    format!("0x{value:x}")
}

fn strip_hex_prefix(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}

impl SerializeAs<u64> for U64String {
    fn serialize_as<S>(source: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(source)
    }
}

impl<'de> DeserializeAs<'de, u64> for U64String {
    fn deserialize_as<D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumericRepr::deserialize(deserializer)? {
            NumericRepr::Number(value) => Ok(value),
            NumericRepr::Text(text) => parse_u64(&text).map_err(de::Error::custom),
        }
    }
}

impl SerializeAs<U256> for U256Hex {
    fn serialize_as<S>(source: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&u256_to_hex(source))
    }
}

impl<'de> DeserializeAs<'de, U256> for U256Hex {
    fn deserialize_as<D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumericRepr::deserialize(deserializer)? {
            NumericRepr::Number(value) => Ok(U256::from(value)),
            NumericRepr::Text(text) => parse_u256(&text).map_err(de::Error::custom),
        }
    }
}

impl<K, V, KAs, VAs> SerializeAs<BTreeMap<K, V>> for PairList<KAs, VAs>
where
    KAs: SerializeAs<K>,
    VAs: SerializeAs<V>,
{
    fn serialize_as<S>(source: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(source.len()))?;
        for (key, value) in source {
            seq.serialize_element(&(
                SerializeAsWrap::<K, KAs>::new(key),
                SerializeAsWrap::<V, VAs>::new(value),
            ))?;
        }
        seq.end()
    }
}

impl<'de, K, V, KAs, VAs> DeserializeAs<'de, BTreeMap<K, V>> for PairList<KAs, VAs>
where
    K: Ord + fmt::Debug,
    KAs: DeserializeAs<'de, K>,
    VAs: DeserializeAs<'de, V>,
{
    fn deserialize_as<D>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PairListVisitor::<K, V, KAs, VAs>(PhantomData))
    }
}

struct PairListVisitor<K, V, KAs, VAs>(PhantomData<(K, V, KAs, VAs)>);

impl<K, V, KAs, VAs> PairListVisitor<K, V, KAs, VAs>
where
    K: Ord + fmt::Debug,
{
    fn insert<E: de::Error>(map: &mut BTreeMap<K, V>, key: K, value: V) -> Result<(), E> {
        if map.contains_key(&key) {
            return Err(E::custom(format!("duplicate map key {key:?}")));
        }
        map.insert(key, value);
        Ok(())
    }
}

impl<'de, K, V, KAs, VAs> Visitor<'de> for PairListVisitor<K, V, KAs, VAs>
where
    K: Ord + fmt::Debug,
    KAs: DeserializeAs<'de, K>,
    VAs: DeserializeAs<'de, V>,
{
    type Value = BTreeMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a list of [key, value] pairs or an object")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut map = BTreeMap::new();
        while let Some((key, value)) =
            seq.next_element::<(DeserializeAsWrap<K, KAs>, DeserializeAsWrap<V, VAs>)>()?
        {
            Self::insert(&mut map, key.into_inner(), value.into_inner())?;
        }
        Ok(map)
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = BTreeMap::new();
        while let Some((key, value)) =
            access.next_entry::<DeserializeAsWrap<K, KAs>, DeserializeAsWrap<V, VAs>>()?
        {
            Self::insert(&mut map, key.into_inner(), value.into_inner())?;
        }
        Ok(map)
    }
}
