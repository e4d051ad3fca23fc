// Length-delimited message framing over TCP.
//
// Wire format: a 4-byte big-endian length prefix followed by the payload.
// `write_message` / `read_message` move raw bytes; `write_frame` /
// `read_frame` add the JSON step for any serde type (`Command`, `Welcome`).
//
// `MAX_MESSAGE_SIZE` bounds the allocation a malformed or hostile length
// prefix can cause. The largest legitimate frame is a chat message, so 1 MB
// is plenty.
//
// A frame is always read completely or not at all from the caller's point of
// view: `read_exact` either fills the whole buffer or returns an error, after
// which the stream is considered unusable.

use std::io::{self, Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Maximum allowed message size (1 MB).
pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024;

/// Failure to move a typed frame across the wire.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Write a length-delimited message: 4-byte big-endian length, then payload.
pub fn write_message<W: Write>(writer: &mut W, msg: &[u8]) -> io::Result<()> {
    let len = msg.len();
    if len > MAX_MESSAGE_SIZE as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("message too large: {len} bytes (max {MAX_MESSAGE_SIZE})"),
        ));
    }
    let len_bytes = (len as u32).to_be_bytes();
    writer.write_all(&len_bytes)?;
    writer.write_all(msg)?;
    writer.flush()?;
    Ok(())
}

/// Read a length-delimited message: 4-byte big-endian length, then payload.
///
/// Returns `UnexpectedEof` if the stream closes before or during a message,
/// and `InvalidData` if the length exceeds `MAX_MESSAGE_SIZE`.
pub fn read_message<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("message too large: {len} bytes (max {MAX_MESSAGE_SIZE})"),
        ));
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Serialize `value` to JSON and write it as one frame.
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<(), WireError> {
    let json = serde_json::to_vec(value)?;
    write_message(writer, &json)?;
    Ok(())
}

/// Read one frame and deserialize its JSON payload.
pub fn read_frame<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T, WireError> {
    let bytes = read_message(reader)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn roundtrip_simple_message() {
        let original = b"five in a row";
        let mut buf = Vec::new();
        write_message(&mut buf, original).unwrap();

        let mut cursor = Cursor::new(&buf);
        let recovered = read_message(&mut cursor).unwrap();
        assert_eq!(recovered, original);
    }

    #[test]
    fn length_prefix_is_big_endian() {
        let mut buf = Vec::new();
        write_message(&mut buf, &[7u8; 258]).unwrap();
        assert_eq!(&buf[..4], &[0, 0, 1, 2]);
        assert_eq!(buf.len(), 4 + 258);
    }

    #[test]
    fn rejects_oversized_write() {
        let big = vec![0u8; MAX_MESSAGE_SIZE as usize + 1];
        let mut buf = Vec::new();
        let err = write_message(&mut buf, &big).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(buf.is_empty());
    }

    #[test]
    fn rejects_oversized_read() {
        let fake_len = (MAX_MESSAGE_SIZE + 1).to_be_bytes();
        let mut cursor = Cursor::new(fake_len.to_vec());
        let err = read_message(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn read_unexpected_eof_mid_payload() {
        let mut buf = Vec::new();
        write_message(&mut buf, b"truncated").unwrap();
        buf.truncate(buf.len() - 3);
        let mut cursor = Cursor::new(buf);
        let err = read_message(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn typed_frames_in_sequence() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &vec![1u32, 2, 3]).unwrap();
        write_frame(&mut buf, &"second".to_string()).unwrap();

        let mut cursor = Cursor::new(&buf);
        let first: Vec<u32> = read_frame(&mut cursor).unwrap();
        let second: String = read_frame(&mut cursor).unwrap();
        assert_eq!(first, vec![1, 2, 3]);
        assert_eq!(second, "second");
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        let mut buf = Vec::new();
        write_message(&mut buf, b"{not json").unwrap();
        let mut cursor = Cursor::new(&buf);
        let err = read_frame::<_, String>(&mut cursor).unwrap_err();
        assert!(matches!(err, WireError::Serialization(_)));
    }
}
