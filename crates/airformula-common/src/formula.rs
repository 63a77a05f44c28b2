//! The compact array-notation representation of a formula.
//!
//! On the wire a [`Formula`] is plain JSON: a bare string, number or boolean
//! for literals, `{"field": name}` for field references and
//! `[name, ...args]` for function calls and operations. Whether a call is a
//! function call or an operation is decided by the [`Registry`](crate::Registry)
//! that knows the name.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

/// Largest integral magnitude that serializes as a JSON integer.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    Text(String),
    Number(f64),
    Boolean(bool),
    Field(FieldReference),
    Call(Call),
}

/// `{"field": name}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldReference {
    pub field: String,
}

/// `[name, ...args]`, either a function call or an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Formula>,
}

impl Formula {
    pub fn field(name: impl Into<String>) -> Self {
        Formula::Field(FieldReference { field: name.into() })
    }

    pub fn call(name: impl Into<String>, args: Vec<Formula>) -> Self {
        Formula::Call(Call {
            name: name.into(),
            args,
        })
    }
}

impl From<&str> for Formula {
    fn from(value: &str) -> Self {
        Formula::Text(value.to_string())
    }
}

impl From<String> for Formula {
    fn from(value: String) -> Self {
        Formula::Text(value)
    }
}

impl From<f64> for Formula {
    fn from(value: f64) -> Self {
        Formula::Number(value)
    }
}

impl From<bool> for Formula {
    fn from(value: bool) -> Self {
        Formula::Boolean(value)
    }
}

impl From<FieldReference> for Formula {
    fn from(value: FieldReference) -> Self {
        Formula::Field(value)
    }
}

impl From<Call> for Formula {
    fn from(value: Call) -> Self {
        Formula::Call(value)
    }
}

fn serialize_number<S: Serializer>(n: f64, serializer: S) -> Result<S::Ok, S::Error> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(n as i64)
    } else {
        serializer.serialize_f64(n)
    }
}

impl Serialize for Formula {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Formula::Text(text) => serializer.serialize_str(text),
            Formula::Number(n) => serialize_number(*n, serializer),
            Formula::Boolean(b) => serializer.serialize_bool(*b),
            Formula::Field(field) => field.serialize(serializer),
            Formula::Call(call) => call.serialize(serializer),
        }
    }
}

impl Serialize for FieldReference {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("field", &self.field)?;
        map.end()
    }
}

impl Serialize for Call {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.args.len() + 1))?;
        seq.serialize_element(&self.name)?;
        for arg in &self.args {
            seq.serialize_element(arg)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Formula {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FormulaVisitor;

        impl<'de> Visitor<'de> for FormulaVisitor {
            type Value = Formula;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str(
                    "a string, number, boolean, {\"field\": name} object or [name, ...args] array",
                )
            }

            fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Formula::Boolean(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Formula::Number(v as f64))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Formula::Number(v as f64))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Formula::Number(v))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Formula::Text(v.to_string()))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Formula::Text(v))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let name: String = seq.next_element()?.ok_or_else(|| {
                    de::Error::custom("array notation needs a function name or operator symbol")
                })?;
                let mut args = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(arg) = seq.next_element::<Formula>()? {
                    args.push(arg);
                }
                Ok(Formula::Call(Call { name, args }))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut field: Option<String> = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key != "field" {
                        return Err(de::Error::unknown_field(&key, &["field"]));
                    }
                    if field.is_some() {
                        return Err(de::Error::duplicate_field("field"));
                    }
                    field = Some(map.next_value()?);
                }
                field
                    .map(Formula::field)
                    .ok_or_else(|| de::Error::missing_field("field"))
            }
        }

        deserializer.deserialize_any(FormulaVisitor)
    }
}
