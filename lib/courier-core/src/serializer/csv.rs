//! CSV support.
//!
//! Serialization goes through `serde_json::Value` so any record shape with
//! scalar fields can be written: a sequence of maps becomes one row per item,
//! a single map becomes one row. The header row lists the first record's keys.
//!
//! Deserialization reads the header row and exposes the document as a sequence
//! of maps keyed by header. Fields are parsed on demand, so `"42"` reads as a
//! number when the target field is numeric and as text when it is a `String`.

use std::fmt;

use serde::de::{self, DeserializeSeed, IntoDeserializer, MapAccess, SeqAccess, Visitor};
use serde::forward_to_deserialize_any;
use serde_json::Value;

use super::{DataFormat, DeserializeVisitor, Serializer};
use crate::{Error, Result};

const CONTENT_TYPES: &[&str] = &["text/csv", "application/csv"];

/// CSV serializer backed by the `csv` crate.
///
/// Accepts any content type containing `csv` (e.g. `text/x-csv`).
#[derive(Debug, Clone, Copy)]
pub struct CsvSerializer {
    delimiter: u8,
}

impl Default for CsvSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvSerializer {
    /// Create a comma separated serializer.
    #[must_use]
    pub const fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Use another field delimiter (e.g. `b';'` or `b'\t'`).
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl Serializer for CsvSerializer {
    fn data_format(&self) -> DataFormat {
        DataFormat::Csv
    }

    fn content_type(&self) -> &str {
        "text/csv"
    }

    fn supported_content_types(&self) -> &[&str] {
        CONTENT_TYPES
    }

    fn accepts(&self, content_type: &str) -> bool {
        content_type.to_ascii_lowercase().contains("csv")
    }

    fn serialize(&self, value: &dyn erased_serde::Serialize) -> Result<String> {
        let value =
            serde_json::to_value(value).map_err(|e| Error::serialization(DataFormat::Csv, e))?;
        let rows = match value {
            Value::Array(items) => items,
            Value::Object(_) => vec![value],
            Value::Null => Vec::new(),
            other => {
                return Err(Error::serialization(
                    DataFormat::Csv,
                    format!("expected a record or a sequence of records, got {other}"),
                ));
            }
        };

        let headers: Vec<String> = match rows.first() {
            Some(Value::Object(first)) => first.keys().cloned().collect(),
            Some(_) => {
                return Err(Error::serialization(
                    DataFormat::Csv,
                    "sequence items must be records",
                ));
            }
            None => return Ok(String::new()),
        };

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());
        writer
            .write_record(&headers)
            .map_err(|e| Error::serialization(DataFormat::Csv, e))?;

        for row in &rows {
            let Value::Object(fields) = row else {
                return Err(Error::serialization(
                    DataFormat::Csv,
                    "sequence items must be records",
                ));
            };
            let record = headers
                .iter()
                .map(|header| fields.get(header).map(cell).unwrap_or_default());
            writer
                .write_record(record)
                .map_err(|e| Error::serialization(DataFormat::Csv, e))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::serialization(DataFormat::Csv, e))?;
        String::from_utf8(bytes).map_err(|e| Error::serialization(DataFormat::Csv, e))
    }

    fn deserialize(&self, content: &[u8], visitor: &mut DeserializeVisitor<'_>) -> Result<()> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(content);
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| Error::deserialization(DataFormat::Csv, ".", e))?
            .iter()
            .map(str::to_string)
            .collect();
        let records = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::deserialization(DataFormat::Csv, ".", e))?;

        let document = DocumentDeserializer {
            headers: &headers,
            records: &records,
        };
        let mut erased = <dyn erased_serde::Deserializer>::erase(document);
        visitor(&mut erased).map_err(|e| Error::deserialization(DataFormat::Csv, ".", e))
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug)]
struct CsvDeError(String);

impl fmt::Display for CsvDeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for CsvDeError {}

impl de::Error for CsvDeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

/// Whole document: a sequence of records, or the first record for map targets.
struct DocumentDeserializer<'a> {
    headers: &'a [String],
    records: &'a [csv::StringRecord],
}

impl<'de> de::Deserializer<'de> for DocumentDeserializer<'_> {
    type Error = CsvDeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, Self::Error> {
        visitor.visit_seq(Records {
            headers: self.headers,
            records: self.records.iter(),
        })
    }

    fn deserialize_option<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> std::result::Result<V::Value, Self::Error> {
        if self.records.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, Self::Error> {
        let record = self
            .records
            .first()
            .ok_or_else(|| CsvDeError("document has no records".to_string()))?;
        RecordDeserializer {
            headers: self.headers,
            record,
        }
        .deserialize_map(visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> std::result::Result<V::Value, Self::Error> {
        self.deserialize_map(visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct newtype_struct seq tuple
        tuple_struct enum identifier ignored_any
    }
}

struct Records<'a> {
    headers: &'a [String],
    records: std::slice::Iter<'a, csv::StringRecord>,
}

impl<'de> SeqAccess<'de> for Records<'_> {
    type Error = CsvDeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> std::result::Result<Option<T::Value>, Self::Error> {
        match self.records.next() {
            Some(record) => seed
                .deserialize(RecordDeserializer {
                    headers: self.headers,
                    record,
                })
                .map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.records.len())
    }
}

/// One row: a map of header to field, or a sequence of fields for tuple targets.
struct RecordDeserializer<'a> {
    headers: &'a [String],
    record: &'a csv::StringRecord,
}

impl<'de> de::Deserializer<'de> for RecordDeserializer<'_> {
    type Error = CsvDeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, Self::Error> {
        visitor.visit_map(Fields {
            headers: self.headers.iter(),
            values: self.record.iter(),
            pending: None,
        })
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, Self::Error> {
        visitor.visit_seq(Cells(self.record.iter()))
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> std::result::Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> std::result::Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct map struct
        enum identifier ignored_any
    }
}

struct Fields<'a> {
    headers: std::slice::Iter<'a, String>,
    values: csv::StringRecordIter<'a>,
    pending: Option<&'a str>,
}

impl<'de> MapAccess<'de> for Fields<'_> {
    type Error = CsvDeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> std::result::Result<Option<K::Value>, Self::Error> {
        match (self.headers.next(), self.values.next()) {
            (Some(header), Some(value)) => {
                self.pending = Some(value);
                seed.deserialize(header.as_str().into_deserializer())
                    .map(Some)
            }
            _ => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> std::result::Result<V::Value, Self::Error> {
        let value = self
            .pending
            .take()
            .ok_or_else(|| CsvDeError("value requested before key".to_string()))?;
        seed.deserialize(FieldDeserializer(value))
    }
}

struct Cells<'a>(csv::StringRecordIter<'a>);

impl<'de> SeqAccess<'de> for Cells<'_> {
    type Error = CsvDeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> std::result::Result<Option<T::Value>, Self::Error> {
        self.0
            .next()
            .map(|value| seed.deserialize(FieldDeserializer(value)))
            .transpose()
    }
}

/// A single cell, parsed according to the requested type.
struct FieldDeserializer<'a>(&'a str);

impl FieldDeserializer<'_> {
    fn parse<T>(&self, expected: &str) -> std::result::Result<T, CsvDeError>
    where
        T: std::str::FromStr,
    {
        self.0
            .trim()
            .parse()
            .map_err(|_| CsvDeError(format!("invalid {expected}: `{}`", self.0)))
    }
}

macro_rules! deserialize_parsed {
    ($de:lifetime; $($method:ident => $visit:ident: $ty:ty,)*) => {
        $(
            fn $method<V: Visitor<$de>>(self, visitor: V) -> std::result::Result<V::Value, Self::Error> {
                visitor.$visit(self.parse::<$ty>(stringify!($ty))?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for FieldDeserializer<'_> {
    type Error = CsvDeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, Self::Error> {
        let text = self.0.trim();
        if text.is_empty() {
            visitor.visit_unit()
        } else if let Ok(v) = text.parse::<bool>() {
            visitor.visit_bool(v)
        } else if let Ok(v) = text.parse::<i64>() {
            visitor.visit_i64(v)
        } else if let Ok(v) = text.parse::<u64>() {
            visitor.visit_u64(v)
        } else if let Ok(v) = text.parse::<f64>() {
            visitor.visit_f64(v)
        } else {
            visitor.visit_str(self.0)
        }
    }

    deserialize_parsed! {
        'de;
        deserialize_bool => visit_bool: bool,
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_i128 => visit_i128: i128,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_u128 => visit_u128: u128,
        deserialize_f32 => visit_f32: f32,
        deserialize_f64 => visit_f64: f64,
        deserialize_char => visit_char: char,
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, Self::Error> {
        visitor.visit_str(self.0)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, Self::Error> {
        visitor.visit_string(self.0.to_string())
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, Self::Error> {
        if self.0.trim().is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> std::result::Result<V::Value, Self::Error> {
        visitor.visit_enum(self.0.trim().into_deserializer())
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> std::result::Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    forward_to_deserialize_any! {
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Tier {
        Free,
        Pro,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Account {
        id: u32,
        name: String,
        active: bool,
        balance: f64,
        tier: Tier,
        note: Option<String>,
    }

    fn accounts() -> Vec<Account> {
        vec![
            Account {
                id: 1,
                name: "Ada, Countess".to_string(),
                active: true,
                balance: 10.5,
                tier: Tier::Pro,
                note: None,
            },
            Account {
                id: 2,
                name: "007".to_string(),
                active: false,
                balance: 0.0,
                tier: Tier::Free,
                note: Some("vip".to_string()),
            },
        ]
    }

    #[test]
    fn writes_header_and_rows() {
        let text = CsvSerializer::new().serialize(&accounts()).expect("serialize");
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("id,name,active,balance,tier,note"));
        assert_eq!(lines.next(), Some("1,\"Ada, Countess\",true,10.5,pro,"));
        assert_eq!(lines.next(), Some("2,007,false,0.0,free,vip"));
    }

    #[test]
    fn reads_typed_records() {
        let serializer = CsvSerializer::new();
        let text = serializer.serialize(&accounts()).expect("serialize");
        let back: Vec<Account> = deserialize(&serializer, text.as_bytes()).expect("deserialize");
        assert_eq!(back, accounts());
    }

    #[test]
    fn numeric_looking_text_stays_text() {
        let back: Vec<Account> = deserialize(
            &CsvSerializer::new(),
            b"id,name,active,balance,tier,note\n3,42,true,1,free,\n",
        )
        .expect("deserialize");
        assert_eq!(back[0].name, "42");
        assert_eq!(back[0].note, None);
    }

    #[test]
    fn single_record_target() {
        let account: Account = deserialize(
            &CsvSerializer::new(),
            b"id,name,active,balance,tier,note\n9,Bob,false,2.5,pro,hi\n",
        )
        .expect("deserialize");
        assert_eq!(account.id, 9);
        assert_eq!(account.note.as_deref(), Some("hi"));
    }

    #[test]
    fn semicolon_delimiter() {
        let serializer = CsvSerializer::new().with_delimiter(b';');
        let rows: Vec<(String, u8)> =
            deserialize(&serializer, b"name;age\nAda;36\n").expect("deserialize");
        assert_eq!(rows, vec![("Ada".to_string(), 36)]);
    }

    #[test]
    fn invalid_number_is_reported() {
        let err = deserialize::<Vec<Account>>(
            &CsvSerializer::new(),
            b"id,name,active,balance,tier,note\nx,Bob,false,2.5,pro,\n",
        )
        .expect_err("bad id");
        assert!(err.to_string().contains("invalid u32"), "{err}");
    }

    #[test]
    fn accepts_csv_variants() {
        let serializer = CsvSerializer::new();
        assert!(serializer.accepts("text/x-csv"));
        assert!(serializer.accepts("application/vnd.ms-CSV"));
        assert!(!serializer.accepts("application/json"));
    }

    #[test]
    fn rejects_scalar_documents() {
        let err = CsvSerializer::new().serialize(&5).expect_err("scalar");
        assert!(matches!(err, Error::Serialization { .. }));
    }
}
