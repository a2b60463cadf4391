use std::io;

use serde::de::{DeserializeOwned, DeserializeSeed};

use crate::error::DecodeError;

/// Deserialize with JSON-path context in error messages.
pub fn from_reader_with_path<T: DeserializeOwned, R: io::Read>(reader: R) -> Result<T, DecodeError> {
    let de = &mut serde_json::Deserializer::from_reader(reader);
    let value = match serde_path_to_error::deserialize::<_, T>(&mut *de) {
        Ok(v) => v,
        Err(err) => {
            let path = err.path().to_string();
            return Err(DecodeError { path, message: err.into_inner().to_string() });
        }
    };
    finish(de)?;
    Ok(value)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    from_reader_with_path(bytes)
}

/// Same as `from_reader_with_path`, for a runtime-described target.
pub fn seed_from_reader_with_path<'de, S, R>(seed: S, reader: R) -> Result<S::Value, DecodeError>
where
    S: DeserializeSeed<'de>,
    R: io::Read,
{
    let de = &mut serde_json::Deserializer::from_reader(reader);
    let mut track = serde_path_to_error::Track::new();
    let value = match seed.deserialize(serde_path_to_error::Deserializer::new(&mut *de, &mut track)) {
        Ok(v) => v,
        Err(err) => {
            let path = track.path().to_string();
            return Err(DecodeError { path, message: err.to_string() });
        }
    };
    finish(de)?;
    Ok(value)
}

// trailing bytes after the top-level value are an error, as in `serde_json::from_reader`
fn finish<R: io::Read>(de: &mut serde_json::Deserializer<serde_json::de::IoRead<R>>) -> Result<(), DecodeError> {
    de.end().map_err(|err| DecodeError { path: ".".into(), message: err.to_string() })
}
