use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which of the two sub-models a change applies to.
///
/// Editors split a model into a *basic* part (scalars, enums, arrays of
/// scalars) and a *complex* part (nested objects and arrays of objects), see
/// [`schema`](crate::schema). Every [`Transaction`] belongs to exactly one of
/// them.
///
/// On the wire this is the boolean `complex` flag, `true` for
/// [`Partition::Complex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum Partition {
    Basic,
    Complex,
}

impl Partition {
    /// Returns `true` for [`Partition::Complex`].
    pub fn is_complex(self) -> bool {
        matches!(self, Partition::Complex)
    }
}

impl From<bool> for Partition {
    fn from(complex: bool) -> Self {
        if complex {
            Partition::Complex
        } else {
            Partition::Basic
        }
    }
}

impl From<Partition> for bool {
    fn from(partition: Partition) -> Self {
        partition.is_complex()
    }
}

/// One atomic change to a single field of a sub-model.
///
/// `old_value` and `new_value` are never equal for transactions recorded by a
/// [`Tracker`](super::Tracker).
///
/// The serialized field names (`field`, `newValue`, `oldValue`, `complex`) are
/// the ones stored in persisted editing sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub field: String,
    pub new_value: Value,
    pub old_value: Value,
    #[serde(rename = "complex")]
    pub partition: Partition,
}

impl Transaction {
    pub fn new(
        field: impl Into<String>,
        old_value: Value,
        new_value: Value,
        partition: Partition,
    ) -> Self {
        Self {
            field: field.into(),
            new_value,
            old_value,
            partition,
        }
    }
}

#[cfg(any(test, feature = "arbitrary"))]
mod arbitrary {
    use super::*;
    use quickcheck::{Arbitrary, Gen};

    impl Arbitrary for Partition {
        fn arbitrary(g: &mut Gen) -> Self {
            *g.choose(&[Partition::Basic, Partition::Complex])
                .expect("choices are non-empty")
        }
    }

    fn arbitrary_value(g: &mut Gen) -> Value {
        match u8::arbitrary(g) % 4 {
            0 => Value::Null,
            1 => Value::Bool(bool::arbitrary(g)),
            2 => Value::from(u32::arbitrary(g)),
            _ => Value::String(String::arbitrary(g)),
        }
    }

    impl Arbitrary for Transaction {
        fn arbitrary(g: &mut Gen) -> Self {
            let field = g
                .choose(&["name", "description", "license", "contributor"])
                .expect("choices are non-empty");
            let old_value = arbitrary_value(g);
            let mut new_value = arbitrary_value(g);
            while new_value == old_value {
                new_value = arbitrary_value(g);
            }
            Transaction::new(*field, old_value, new_value, Partition::arbitrary(g))
        }
    }
}
