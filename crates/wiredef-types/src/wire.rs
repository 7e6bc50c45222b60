use serde_json::Value;
use wiredef_codec::{CodecError, Outcome};

/// Unwrap an error value inside a `Result<Outcome<_>>` body, returning it
/// early as `Ok(Err(_))`.
macro_rules! attempt {
    ($outcome:expr) => {
        match $outcome {
            Ok(value) => value,
            Err(err) => return Ok(Err(err)),
        }
    };
}
pub(crate) use attempt;

/// Stand-in for absent members.
pub(crate) static NULL: Value = Value::Null;

/// Borrow `len` bytes at `offset`, or report how far short the buffer is.
pub(crate) fn take(buf: &[u8], offset: usize, len: usize) -> Outcome<&[u8]> {
    match offset.checked_add(len) {
        Some(end) if end <= buf.len() => Ok(&buf[offset..end]),
        _ => Err(CodecError::eof(offset, len, buf.len())),
    }
}

/// Mutable counterpart of [`take`].
pub(crate) fn take_mut(buf: &mut [u8], offset: usize, len: usize) -> Outcome<&mut [u8]> {
    let buf_len = buf.len();
    match offset.checked_add(len) {
        Some(end) if end <= buf_len => Ok(&mut buf[offset..end]),
        _ => Err(CodecError::eof(offset, len, buf_len)),
    }
}

/// Interpret a value as a non-negative count or length.
pub(crate) fn as_count(value: &Value, what: &str) -> Outcome<usize> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| CodecError::invalid(what, value))
}

/// Wire length of a value that some other field counts: elements of a
/// sequence, UTF-8 bytes of a string, or the number itself.
pub(crate) fn length_of(value: &Value) -> Outcome<usize> {
    match value {
        Value::Array(items) => Ok(items.len()),
        Value::String(text) => Ok(text.len()),
        other => as_count(other, "a sequence, string or count"),
    }
}
