//! Shared list readers and writers.

use rlp::{Decodable, Rlp, RlpStream};

use crate::errors::{CodecError, Result};

/// Open `bytes` as a top-level list of exactly `fields` items.
///
/// Rejects trailing bytes, non-list items and field-count mismatches.
pub(crate) fn open_list<'a>(bytes: &'a [u8], fields: usize, what: &'static str) -> Result<Rlp<'a>> {
    let rlp = Rlp::new(bytes);
    let info = rlp.payload_info()?;
    let total = info.total();
    if total != bytes.len() {
        return Err(CodecError::TrailingBytes { what, extra: bytes.len().saturating_sub(total) });
    }
    expect_fields(rlp, fields, what)
}

/// Check that a nested item is a list of exactly `fields` items.
pub(crate) fn expect_fields<'a>(
    rlp: Rlp<'a>,
    fields: usize,
    what: &'static str,
) -> Result<Rlp<'a>> {
    if !rlp.is_list() {
        return Err(CodecError::ExpectedList { what });
    }
    let actual = rlp.item_count()?;
    if actual != fields {
        return Err(CodecError::FieldCount { what, expected: fields, actual });
    }
    Ok(rlp)
}

/// Append a list of strings as a nested list.
pub(crate) fn append_strings(stream: &mut RlpStream, items: &[String]) {
    stream.begin_list(items.len());
    for item in items {
        stream.append(item);
    }
}

/// Read a nested list of strings at `index`.
pub(crate) fn strings_at(rlp: &Rlp<'_>, index: usize, what: &'static str) -> Result<Vec<String>> {
    let item = rlp.at(index)?;
    if !item.is_list() {
        return Err(CodecError::ExpectedList { what });
    }
    Ok(item.as_list()?)
}

/// Append an optional byte string as an explicit nullable tag.
///
/// `None` is written as an empty list, `Some(bytes)` as a one-element list.
pub(crate) fn append_nullable(stream: &mut RlpStream, value: Option<&[u8]>) {
    match value {
        None => {
            stream.begin_list(0);
        },
        Some(bytes) => {
            stream.begin_list(1);
            stream.append(&bytes);
        },
    }
}

/// Read a nullable tag written by [`append_nullable`].
pub(crate) fn nullable_at<T: Decodable>(
    rlp: &Rlp<'_>,
    index: usize,
    what: &'static str,
) -> Result<Option<T>> {
    let item = rlp.at(index)?;
    if !item.is_list() {
        return Err(CodecError::ExpectedList { what });
    }
    match item.item_count()? {
        0 => Ok(None),
        1 => Ok(Some(item.val_at(0)?)),
        actual => Err(CodecError::FieldCount { what, expected: 1, actual }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_list_rejects_trailing_bytes() {
        // [0x01] followed by a stray byte
        let bytes = [0xc1, 0x01, 0xff];
        let result = open_list(&bytes, 1, "test");
        assert!(matches!(result, Err(CodecError::TrailingBytes { extra: 1, .. })));
    }

    #[test]
    fn open_list_rejects_field_count_mismatch() {
        let bytes = [0xc2, 0x01, 0x02];
        let result = open_list(&bytes, 3, "test");
        assert!(matches!(result, Err(CodecError::FieldCount { expected: 3, actual: 2, .. })));
    }

    #[test]
    fn open_list_rejects_data_item() {
        let bytes = [0x83, b'a', b'b', b'c'];
        let result = open_list(&bytes, 1, "test");
        assert!(matches!(result, Err(CodecError::ExpectedList { .. })));
    }

    #[test]
    fn open_list_rejects_empty_input() {
        assert!(open_list(&[], 0, "test").is_err());
    }

    #[test]
    fn nullable_distinguishes_null_from_empty() {
        let mut stream = RlpStream::new_list(2);
        append_nullable(&mut stream, None);
        append_nullable(&mut stream, Some(&[]));
        let bytes = stream.out().to_vec();

        let rlp = open_list(&bytes, 2, "test").unwrap();
        let first: Option<Vec<u8>> = nullable_at(&rlp, 0, "test").unwrap();
        let second: Option<Vec<u8>> = nullable_at(&rlp, 1, "test").unwrap();
        assert_eq!(first, None);
        assert_eq!(second, Some(Vec::new()));
    }
}
