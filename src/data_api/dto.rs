use serde::Deserialize;

/// Read envelope: `{ "value": [ ...rows ] }`.
#[derive(Debug, Deserialize)]
pub struct ValueEnvelope<T> {
    pub value: Vec<T>,
}

/// POST responses come back either bare or wrapped in an envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CreatedRow<T> {
    Wrapped(ValueEnvelope<T>),
    Row(T),
}

impl<T> CreatedRow<T> {
    pub fn into_row(self) -> Option<T> {
        match self {
            CreatedRow::Wrapped(envelope) => envelope.value.into_iter().next(),
            CreatedRow::Row(row) => Some(row),
        }
    }
}
