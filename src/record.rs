//! The closed value type that lookup results are converted into before
//! flattening.

use std::collections::BTreeMap;

/// A scalar leaf of a lookup result.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Null,
}

/// A named member of a [`Record::Struct`].
///
/// `tag` is the external output key. The flattened path segment is the tag,
/// or the empty string when the field carries none.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub tag: Option<&'static str>,
    pub value: Record,
}

impl Field {
    /// Field whose output key is the same as its name.
    pub fn tagged(name: &'static str, value: impl Into<Record>) -> Self {
        Field {
            name,
            tag: Some(name),
            value: value.into(),
        }
    }

    /// Field without an output key.
    pub fn untagged(name: &'static str, value: impl Into<Record>) -> Self {
        Field {
            name,
            tag: None,
            value: value.into(),
        }
    }

    /// The path segment this field contributes.
    #[inline]
    pub fn segment(&self) -> &'static str {
        self.tag.unwrap_or("")
    }
}

/// A possibly nested lookup result.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Record {
    /// An unset optional value. Contributes nothing when flattened.
    #[default]
    Absent,
    Scalar(Value),
    Map(BTreeMap<String, Record>),
    Struct(Vec<Field>),
    List(Vec<Record>),
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Record::Scalar(value)
    }
}

/// Conversion from a typed dataset record into a [`Record`].
pub trait ToRecord {
    fn to_record(&self) -> Record;
}

impl ToRecord for Record {
    fn to_record(&self) -> Record {
        self.clone()
    }
}

impl ToRecord for String {
    fn to_record(&self) -> Record {
        Record::Scalar(Value::String(self.clone()))
    }
}

impl ToRecord for str {
    fn to_record(&self) -> Record {
        Record::Scalar(Value::String(self.to_owned()))
    }
}

impl ToRecord for bool {
    fn to_record(&self) -> Record {
        Record::Scalar(Value::Bool(*self))
    }
}

impl ToRecord for f64 {
    fn to_record(&self) -> Record {
        Record::Scalar(Value::Float(*self))
    }
}

macro_rules! unsigned_to_record {
    ($($ty:ty),*) => {
        $(
            impl ToRecord for $ty {
                fn to_record(&self) -> Record {
                    Record::Scalar(Value::UInt(u64::from(*self)))
                }
            }
        )*
    };
}

unsigned_to_record!(u8, u16, u32, u64);

impl<T: ToRecord> ToRecord for Option<T> {
    fn to_record(&self) -> Record {
        match self {
            Some(value) => value.to_record(),
            None => Record::Absent,
        }
    }
}

impl<T: ToRecord> ToRecord for Box<T> {
    fn to_record(&self) -> Record {
        self.as_ref().to_record()
    }
}

impl<T: ToRecord> ToRecord for Vec<T> {
    fn to_record(&self) -> Record {
        Record::List(self.iter().map(ToRecord::to_record).collect())
    }
}

impl<T: ToRecord> ToRecord for BTreeMap<String, T> {
    fn to_record(&self) -> Record {
        Record::Map(
            self.iter()
                .map(|(key, value)| (key.clone(), value.to_record()))
                .collect(),
        )
    }
}

/// Implement [`ToRecord`] for a struct as a [`Record::Struct`] whose fields
/// are tagged with the given output keys, in declaration order.
///
/// ```
/// # use geoipcli::record_struct;
/// # use geoipcli::record::{Record, ToRecord};
/// struct Postal {
///     code: String,
/// }
///
/// record_struct!(Postal { code => "code" });
///
/// let postal = Postal { code: "98354".to_string() };
/// assert!(matches!(postal.to_record(), Record::Struct(_)));
/// ```
#[macro_export]
macro_rules! record_struct {
    ($ty:ident { $($field:ident => $tag:expr),* $(,)? }) => {
        impl $crate::record::ToRecord for $ty {
            fn to_record(&self) -> $crate::record::Record {
                $crate::record::Record::Struct(vec![
                    $(
                        $crate::record::Field {
                            name: stringify!($field),
                            tag: Some($tag),
                            value: $crate::record::ToRecord::to_record(&self.$field),
                        },
                    )*
                ])
            }
        }
    };
}
