//! Custom deserializer that flattens result entries into plain rows.
//!
//! The transactional endpoint wraps every row in an object that may also
//! carry metadata or a graph projection:
//!
//! ```json
//! [{"row": [1, "a"], "meta": [null, null]}, {"row": [2, "b"], "meta": [null, null]}]
//! ```
//!
//! This module extracts the `row` arrays during deserialization, skipping the
//! other members without materializing them:
//!
//! ```rust,ignore
//! vec![
//!     vec![1, "a"],  // row 0
//!     vec![2, "b"],  // row 1
//! ]
//! ```

use serde::de::{DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// Deserialize `data` entries into row-major values.
///
/// Intended for `#[serde(deserialize_with = "rows_from_data")]`. A `null`
/// value yields no rows.
pub fn rows_from_data<'de, D>(deserializer: D) -> Result<Vec<Vec<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(OptionDataVisitor)
}

/// Visitor accepting `null` or the entry array.
struct OptionDataVisitor;

impl<'de> Visitor<'de> for OptionDataVisitor {
    type Value = Vec<Vec<Value>>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("null or array of row entries")
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Vec::new())
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Vec::new())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(DataVisitor)
    }
}

/// Outer visitor over the entry array.
struct DataVisitor;

impl<'de> Visitor<'de> for DataVisitor {
    type Value = Vec<Vec<Value>>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("array of row entries")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut rows: Vec<Vec<Value>> = Vec::with_capacity(seq.size_hint().unwrap_or(0));

        while let Some(()) = seq.next_element_seed(EntrySeed {
            rows: &mut rows,
            _marker: PhantomData,
        })? {}

        Ok(rows)
    }
}

/// Seed for one entry, pushing its `row` into the shared result.
struct EntrySeed<'a, 'de> {
    rows: &'a mut Vec<Vec<Value>>,
    _marker: PhantomData<&'de ()>,
}

impl<'de, 'a> DeserializeSeed<'de> for EntrySeed<'a, 'de> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(EntryVisitor { rows: self.rows })
    }
}

/// Visitor for one `{"row": [...], ...}` entry.
///
/// An entry without a `row` member (graph-only results) contributes an
/// empty row so that row positions stay aligned.
struct EntryVisitor<'a> {
    rows: &'a mut Vec<Vec<Value>>,
}

impl<'de, 'a> Visitor<'de> for EntryVisitor<'a> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("row entry object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut row: Option<Vec<Value>> = None;

        while let Some(key) = map.next_key::<String>()? {
            if key == "row" {
                if row.is_some() {
                    return Err(serde::de::Error::duplicate_field("row"));
                }
                row = Some(map.next_value()?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }

        self.rows.push(row.unwrap_or_default());
        Ok(())
    }
}
