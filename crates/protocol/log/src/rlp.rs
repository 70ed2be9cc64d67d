//! RLP list framing helpers shared by the status and log codecs.

use alloy_rlp::Header;

/// Splits the RLP list at the head of `buf` into the raw encodings of its items and advances
/// `buf` past the list.
///
/// Items are returned undecoded, header included, so callers can validate the arity of a list
/// before interpreting any of its fields.
pub(crate) fn decode_list_items<'a>(buf: &mut &'a [u8]) -> alloy_rlp::Result<Vec<&'a [u8]>> {
    let header = Header::decode(buf)?;
    if !header.list {
        return Err(alloy_rlp::Error::UnexpectedString);
    }

    let current: &'a [u8] = buf;
    if current.len() < header.payload_length {
        return Err(alloy_rlp::Error::InputTooShort);
    }
    let (mut payload, rest) = current.split_at(header.payload_length);
    *buf = rest;

    let mut items = Vec::new();
    while !payload.is_empty() {
        let mut probe = payload;
        let item_header = Header::decode(&mut probe)?;
        let item_length = payload.len() - probe.len() + item_header.payload_length;
        if payload.len() < item_length {
            return Err(alloy_rlp::Error::InputTooShort);
        }
        let (item, remaining) = payload.split_at(item_length);
        items.push(item);
        payload = remaining;
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use alloy_rlp::Encodable;

    #[test]
    fn test_decode_list_items_splits_mixed_items() {
        let mut out = Vec::new();
        let items: (u64, B256, &str) = (7, B256::repeat_byte(0x11), "reason");
        let payload_length = items.0.length() + items.1.length() + items.2.length();
        Header { list: true, payload_length }.encode(&mut out);
        items.0.encode(&mut out);
        items.1.encode(&mut out);
        items.2.encode(&mut out);
        out.extend_from_slice(&[0xc0]);

        let mut buf = out.as_slice();
        let split = decode_list_items(&mut buf).unwrap();
        assert_eq!(split.len(), 3);
        assert_eq!(split[0], &[0x07]);
        assert_eq!(split[1].len(), 33);
        assert_eq!(split[2][0], 0x80 + 6);
        // The trailing empty list is left in the buffer.
        assert_eq!(buf, &[0xc0]);
    }

    #[test]
    fn test_decode_list_items_empty_list() {
        let mut buf: &[u8] = &[0xc0];
        assert!(decode_list_items(&mut buf).unwrap().is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_list_items_rejects_string() {
        let mut buf: &[u8] = &[0x83, b'a', b'b', b'c'];
        assert_eq!(decode_list_items(&mut buf), Err(alloy_rlp::Error::UnexpectedString));
    }

    #[test]
    fn test_decode_list_items_rejects_truncated_list() {
        let mut buf: &[u8] = &[0xc3, 0x01];
        assert_eq!(decode_list_items(&mut buf), Err(alloy_rlp::Error::InputTooShort));
    }
}
