//! Rejects values JSON cannot represent faithfully.
//!
//! `serde_json` writes NaN and infinities as `null`, which the session layer
//! would read back as "absent". Walking the value first turns that silent loss
//! into an error.

use serde::Serialize;
use serde::ser::{self, Error as _};

type Result<T = ()> = std::result::Result<T, serde_json::Error>;

/// Fail if `value` contains a NaN or infinite float anywhere
pub(crate) fn ensure_finite<T>(value: &T) -> Result
where
    T: Serialize + ?Sized,
{
    value.serialize(FiniteFloats)
}

fn check(value: f64) -> Result {
    if value.is_finite() {
        Ok(())
    } else {
        Err(serde_json::Error::custom(format!(
            "{} has no JSON representation",
            value
        )))
    }
}

struct FiniteFloats;

impl ser::Serializer for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _v: bool) -> Result {
        Ok(())
    }

    fn serialize_i8(self, _v: i8) -> Result {
        Ok(())
    }

    fn serialize_i16(self, _v: i16) -> Result {
        Ok(())
    }

    fn serialize_i32(self, _v: i32) -> Result {
        Ok(())
    }

    fn serialize_i64(self, _v: i64) -> Result {
        Ok(())
    }

    fn serialize_i128(self, _v: i128) -> Result {
        Ok(())
    }

    fn serialize_u8(self, _v: u8) -> Result {
        Ok(())
    }

    fn serialize_u16(self, _v: u16) -> Result {
        Ok(())
    }

    fn serialize_u32(self, _v: u32) -> Result {
        Ok(())
    }

    fn serialize_u64(self, _v: u64) -> Result {
        Ok(())
    }

    fn serialize_u128(self, _v: u128) -> Result {
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result {
        check(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result {
        check(v)
    }

    fn serialize_char(self, _v: char) -> Result {
        Ok(())
    }

    fn serialize_str(self, _v: &str) -> Result {
        Ok(())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result {
        Ok(())
    }

    fn serialize_none(self) -> Result {
        Ok(())
    }

    fn serialize_some<T>(self, value: &T) -> Result
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result {
        Ok(())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self> {
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self> {
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self> {
        Ok(self)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self> {
        Ok(self)
    }
}

impl ser::SerializeSeq for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result
    where
        T: Serialize + ?Sized,
    {
        value.serialize(FiniteFloats)
    }

    fn end(self) -> Result {
        Ok(())
    }
}

impl ser::SerializeTuple for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result
    where
        T: Serialize + ?Sized,
    {
        value.serialize(FiniteFloats)
    }

    fn end(self) -> Result {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result
    where
        T: Serialize + ?Sized,
    {
        value.serialize(FiniteFloats)
    }

    fn end(self) -> Result {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result
    where
        T: Serialize + ?Sized,
    {
        value.serialize(FiniteFloats)
    }

    fn end(self) -> Result {
        Ok(())
    }
}

impl ser::SerializeMap for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result
    where
        T: Serialize + ?Sized,
    {
        key.serialize(FiniteFloats)
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result
    where
        T: Serialize + ?Sized,
    {
        value.serialize(FiniteFloats)
    }

    fn end(self) -> Result {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result
    where
        T: Serialize + ?Sized,
    {
        value.serialize(FiniteFloats)
    }

    fn end(self) -> Result {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result
    where
        T: Serialize + ?Sized,
    {
        value.serialize(FiniteFloats)
    }

    fn end(self) -> Result {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Reading {
        sensor: String,
        samples: Vec<f64>,
    }

    #[test]
    fn test_finite_values_pass() {
        assert!(ensure_finite(&1.5f64).is_ok());
        assert!(ensure_finite(&Some(0.0f32)).is_ok());
        assert!(ensure_finite("text").is_ok());
        assert!(ensure_finite(&Option::<f64>::None).is_ok());
    }

    #[test]
    fn test_nested_non_finite_rejected() {
        let reading = Reading {
            sensor: "t1".to_string(),
            samples: vec![1.0, f64::NAN],
        };
        assert!(ensure_finite(&reading).is_err());

        let mut map = BTreeMap::new();
        map.insert("limit", f32::INFINITY);
        assert!(ensure_finite(&map).is_err());

        assert!(ensure_finite(&(1, f64::NEG_INFINITY)).is_err());
    }
}
