//! pgvector binary codec.
//!
//! Wire format: `u16` dimension, `u16` reserved (zero), then `dimension`
//! big-endian `f32` values.

use std::error::Error;

use bytes::{Buf, BufMut, BytesMut};
use tokio_postgres::types::{to_sql_checked, FromSql, IsNull, ToSql, Type};

/// A pgvector `vector` value.
///
/// The extension's type OID differs per database, so the codec matches the
/// type by name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PgVector(Vec<f32>);

impl PgVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for PgVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

impl From<&[f32]> for PgVector {
    fn from(values: &[f32]) -> Self {
        Self(values.to_vec())
    }
}

impl ToSql for PgVector {
    fn to_sql(&self, _ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        let dim = u16::try_from(self.0.len())
            .map_err(|_| format!("vector has {} dimensions, limit is {}", self.0.len(), u16::MAX))?;
        out.reserve(4 + self.0.len() * 4);
        out.put_u16(dim);
        out.put_u16(0);
        for value in &self.0 {
            out.put_f32(*value);
        }
        Ok(IsNull::No)
    }

    fn accepts(ty: &Type) -> bool {
        ty.name() == "vector"
    }

    to_sql_checked!();
}

impl<'a> FromSql<'a> for PgVector {
    fn from_sql(_ty: &Type, mut raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        if raw.len() < 4 {
            return Err("vector header truncated".into());
        }
        let dim = raw.get_u16() as usize;
        let _reserved = raw.get_u16();
        if raw.len() != dim * 4 {
            return Err(format!("vector payload has {} bytes, expected {}", raw.len(), dim * 4).into());
        }

        let mut values = Vec::with_capacity(dim);
        for _ in 0..dim {
            values.push(raw.get_f32());
        }
        Ok(PgVector(values))
    }

    fn accepts(ty: &Type) -> bool {
        ty.name() == "vector"
    }
}
