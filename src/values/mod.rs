//! Typed sheet values.
//!
//! A sheet document is a three-column export (`Name`, `Type`, `Value`). The
//! parser splits it into [`ValueRow`](crate::types::ValueRow)s and the
//! [`TypeRegistry`] turns each raw value into a [`TypedValue`] according to its
//! type tag. Unknown tags degrade to plain strings rather than failing.

mod parser;
mod registry;
mod typed;

pub use parser::{parse_document, parse_line, FIELD_DELIMITER};
pub use registry::{TypeRegistry, ValueParser};
pub use typed::{Rect, TypedValue, UDim2, Vector2, Vector3};
