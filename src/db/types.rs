use arrow::datatypes::{DataType, Schema};
use std::fmt;

use crate::config::DEFAULT_VARCHAR_WIDTH;

/// Netezza column type used when creating a table from Arrow data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NzType {
    BigInt,
    Float,
    Varchar(usize),
}

impl NzType {
    /// Map an Arrow column type onto the Netezza type it is loaded as.
    ///
    /// The mapping is total: anything that is not a 32/64-bit integer or
    /// float lands in the catch-all varchar column.
    pub fn from_arrow(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int64 | DataType::Int32 => NzType::BigInt,
            DataType::Float64 | DataType::Float32 => NzType::Float,
            _ => NzType::Varchar(DEFAULT_VARCHAR_WIDTH),
        }
    }

    /// Returns the type as written in DDL
    pub fn to_netezza(&self) -> String {
        match self {
            NzType::BigInt => "bigint".to_string(),
            NzType::Float => "float".to_string(),
            NzType::Varchar(width) => format!("varchar({})", width),
        }
    }
}

impl fmt::Display for NzType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_netezza())
    }
}

/// Column type declarations for every field of `schema`, in field order
pub fn netezza_types_for_schema(schema: &Schema) -> Vec<String> {
    schema
        .fields()
        .iter()
        .map(|field| NzType::from_arrow(field.data_type()).to_netezza())
        .collect()
}
