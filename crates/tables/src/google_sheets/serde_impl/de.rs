use std::borrow::Cow;

use serde::{
    de::{self, IntoDeserializer},
    Deserializer,
};
use serde_json::Value as CellValue;

use super::error::{Error, Result};

/// Missing trailing cells read as blanks; the API drops them from short rows.
static BLANK: CellValue = CellValue::Null;

fn is_blank(cell: &CellValue) -> bool {
    match cell {
        CellValue::Null => true,
        CellValue::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Reads one spreadsheet row into a struct or tuple, a cell per field.
pub struct RowDeserializer<'a> {
    cells: std::slice::Iter<'a, CellValue>,
    in_row: bool,
}

impl<'a> RowDeserializer<'a> {
    pub fn new(cells: &'a [CellValue]) -> Self {
        Self {
            cells: cells.iter(),
            in_row: false,
        }
    }

    /// Whether every cell of the row is blank.
    pub fn is_blank_row(cells: &[CellValue]) -> bool {
        cells.iter().all(is_blank)
    }

    fn next(&mut self) -> &'a CellValue {
        self.cells.next().unwrap_or(&BLANK)
    }

    fn is_exhausted(&self) -> bool {
        self.cells.as_slice().is_empty()
    }

    fn is_next_blank(&self) -> bool {
        self.cells.as_slice().first().map_or(true, is_blank)
    }

    fn parse_bool(&mut self) -> Result<bool> {
        match self.next() {
            CellValue::Bool(v) => Ok(*v),
            CellValue::String(s) => match s.trim() {
                "TRUE" | "true" => Ok(true),
                "FALSE" | "false" => Ok(false),
                _ => Err(Error::ExpectedBoolean),
            },
            _ => Err(Error::ExpectedBoolean),
        }
    }

    fn parse_f64(&mut self) -> Result<f64> {
        match self.next() {
            CellValue::Number(n) => n.as_f64().ok_or(Error::ExpectedNumber),
            CellValue::String(s) => {
                let mut s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
                if !s.contains('.') {
                    s = s.replace(',', ".");
                }
                match s.strip_suffix('%') {
                    Some(percent) => percent.parse::<f64>().map(|n| n / 100.0),
                    None => s.parse::<f64>(),
                }
                .map_err(|_| Error::ExpectedNumber)
            }
            _ => Err(Error::ExpectedNumber),
        }
    }

    fn parse_u64(&mut self) -> Result<u64> {
        match self.next() {
            CellValue::Number(n) => n
                .as_u64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                        .map(|f| f as u64)
                })
                .ok_or(Error::ExpectedUnsigned),
            CellValue::String(s) => s.trim().parse().map_err(|_| Error::ExpectedUnsigned),
            _ => Err(Error::ExpectedUnsigned),
        }
    }

    fn parse_i64(&mut self) -> Result<i64> {
        match self.next() {
            CellValue::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .ok_or(Error::ExpectedSigned),
            CellValue::String(s) => s.trim().parse().map_err(|_| Error::ExpectedSigned),
            _ => Err(Error::ExpectedSigned),
        }
    }

    fn parse_str(&mut self) -> Result<Cow<'a, str>> {
        match self.next() {
            CellValue::String(s) => Ok(Cow::Borrowed(s.trim())),
            CellValue::Null => Ok(Cow::Borrowed("")),
            CellValue::Number(n) => Ok(Cow::Owned(n.to_string())),
            CellValue::Bool(b) => Ok(Cow::Owned(if *b { "TRUE" } else { "FALSE" }.to_owned())),
            _ => Err(Error::ExpectedString),
        }
    }

    fn begin_row(&mut self) -> Result<()> {
        if self.in_row {
            return Err(Error::NestedSequence);
        }
        self.in_row = true;
        Ok(())
    }
}

struct RowSeqAccess<'a, 'b> {
    deserializer: &'a mut RowDeserializer<'b>,
    /// Fields left to read, `None` for sequences that run to the row's end.
    remaining: Option<usize>,
}

impl<'a, 'b, 'de> de::SeqAccess<'de> for RowSeqAccess<'a, 'b> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.remaining.as_mut() {
            Some(0) => return Ok(None),
            Some(n) => *n -= 1,
            None if self.deserializer.is_exhausted() => return Ok(None),
            None => {}
        }

        seed.deserialize(&mut *self.deserializer).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        self.remaining
    }
}

macro_rules! impl_de_int {
    ($name: ident, $visit: ident, $parse: ident, $t: ty, $err: expr) => {
        fn $name<V>(self, visitor: V) -> Result<V::Value>
        where
            V: de::Visitor<'de>,
        {
            let value = <$t>::try_from(self.$parse()?).map_err(|_| $err)?;
            visitor.$visit(value)
        }
    };
}

impl<'a, 'b, 'de> Deserializer<'de> for &'a mut RowDeserializer<'b> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.next() {
            CellValue::Null => visitor.visit_unit(),
            CellValue::Bool(b) => visitor.visit_bool(*b),
            CellValue::Number(n) => match (n.as_u64(), n.as_i64(), n.as_f64()) {
                (Some(u), _, _) => visitor.visit_u64(u),
                (_, Some(i), _) => visitor.visit_i64(i),
                (_, _, Some(f)) => visitor.visit_f64(f),
                _ => Err(Error::ExpectedNumber),
            },
            CellValue::String(s) => visitor.visit_str(s),
            CellValue::Array(_) => Err(Error::NestedSequence),
            CellValue::Object(_) => Err(Error::UnexpectedMap),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_bool(self.parse_bool()?)
    }

    impl_de_int!(deserialize_i8, visit_i8, parse_i64, i8, Error::ExpectedSigned);
    impl_de_int!(deserialize_i16, visit_i16, parse_i64, i16, Error::ExpectedSigned);
    impl_de_int!(deserialize_i32, visit_i32, parse_i64, i32, Error::ExpectedSigned);
    impl_de_int!(deserialize_i64, visit_i64, parse_i64, i64, Error::ExpectedSigned);
    impl_de_int!(deserialize_u8, visit_u8, parse_u64, u8, Error::ExpectedUnsigned);
    impl_de_int!(deserialize_u16, visit_u16, parse_u64, u16, Error::ExpectedUnsigned);
    impl_de_int!(deserialize_u32, visit_u32, parse_u64, u32, Error::ExpectedUnsigned);
    impl_de_int!(deserialize_u64, visit_u64, parse_u64, u64, Error::ExpectedUnsigned);

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_f32(self.parse_f64()? as f32)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_f64(self.parse_f64()?)
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let s = self.parse_str()?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Error::ExpectedChar),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_str(&self.parse_str()?)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_string(self.parse_str()?.into_owned())
    }

    fn deserialize_bytes<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::UnexpectedBytes)
    }

    fn deserialize_byte_buf<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::UnexpectedBytes)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.is_next_blank() {
            self.next();
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if is_blank(self.next()) {
            visitor.visit_unit()
        } else {
            Err(Error::ExpectedEmpty)
        }
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.begin_row()?;
        visitor.visit_seq(RowSeqAccess {
            deserializer: self,
            remaining: None,
        })
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.begin_row()?;
        visitor.visit_seq(RowSeqAccess {
            deserializer: self,
            remaining: Some(len),
        })
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::UnexpectedMap)
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_tuple(fields.len(), visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let variant: Cow<'_, str> = self.parse_str()?;
        visitor.visit_enum(variant.into_deserializer())
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.next();
        visitor.visit_unit()
    }
}
