use google_sheets4::api::{CellData, ExtendedValue, RowData};
use serde::{ser, Serialize, Serializer};

use super::error::{Error, Result};

/// Writes a struct or tuple as one spreadsheet row, a cell per field.
#[derive(Default)]
pub struct RowSerializer {
    cells: Vec<CellData>,
    in_row: bool,
}

impl RowSerializer {
    pub fn row<T: Serialize + ?Sized>(value: &T) -> Result<RowData> {
        let mut serializer = Self::default();
        value.serialize(&mut serializer)?;
        Ok(serializer.into())
    }

    fn push(&mut self, value: ExtendedValue) -> Result<()> {
        self.cells.push(CellData {
            user_entered_value: Some(value),
            ..Default::default()
        });
        Ok(())
    }

    fn push_number(&mut self, n: f64) -> Result<()> {
        self.push(ExtendedValue {
            number_value: Some(n),
            ..Default::default()
        })
    }
}

impl From<RowSerializer> for RowData {
    fn from(serializer: RowSerializer) -> Self {
        RowData {
            values: Some(serializer.cells),
        }
    }
}

macro_rules! impl_ser_num {
    ($($name: ident: $t: ty),* $(,)?) => {
        $(
            fn $name(self, v: $t) -> Result<()> {
                self.push_number(v as f64)
            }
        )*
    };
}

impl Serializer for &mut RowSerializer {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = ser::Impossible<(), Error>;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    impl_ser_num!(
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_f32: f32,
        serialize_f64: f64,
    );

    fn serialize_str(self, value: &str) -> Result<()> {
        self.push(ExtendedValue {
            string_value: Some(value.to_owned()),
            ..Default::default()
        })
    }

    fn serialize_char(self, value: char) -> Result<()> {
        self.serialize_str(value.encode_utf8(&mut [0; 4]))
    }

    fn serialize_bool(self, value: bool) -> Result<()> {
        self.push(ExtendedValue {
            bool_value: Some(value),
            ..Default::default()
        })
    }

    fn serialize_bytes(self, _value: &[u8]) -> Result<()> {
        Err(Error::UnexpectedBytes)
    }

    /// An empty string clears whatever the cell held before.
    fn serialize_none(self) -> Result<()> {
        self.serialize_str("")
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.serialize_none()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_none()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self> {
        if self.in_row {
            return Err(Error::NestedSequence);
        }
        self.in_row = true;
        Ok(self)
    }

    fn serialize_tuple(self, len: usize) -> Result<Self> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<Self> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        len: usize,
    ) -> Result<Self> {
        self.serialize_seq(Some(len))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::UnexpectedMap)
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self> {
        self.serialize_seq(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        len: usize,
    ) -> Result<Self> {
        self.serialize_seq(Some(len))
    }
}

macro_rules! impl_ser_cells {
    ($ser_ty: path, $fn_name: ident $(, $key: ident)?) => {
        impl $ser_ty for &mut RowSerializer {
            type Ok = ();
            type Error = Error;

            fn $fn_name<T: ?Sized + Serialize>(
                &mut self,
                $($key: &'static str,)?
                value: &T,
            ) -> Result<()> {
                value.serialize(&mut **self)
            }

            fn end(self) -> Result<()> {
                Ok(())
            }
        }
    };
}

impl_ser_cells!(ser::SerializeSeq, serialize_element);
impl_ser_cells!(ser::SerializeTuple, serialize_element);
impl_ser_cells!(ser::SerializeTupleStruct, serialize_field);
impl_ser_cells!(ser::SerializeTupleVariant, serialize_field);
impl_ser_cells!(ser::SerializeStruct, serialize_field, _key);
impl_ser_cells!(ser::SerializeStructVariant, serialize_field, _key);
