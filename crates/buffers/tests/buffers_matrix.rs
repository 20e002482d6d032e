//! Framing scenarios that exercise Writer, Reader and StreamingReader together.

use graphpack_buffers::{BufferError, Reader, StreamingReader, Writer};

/// Writes a `[tag: u8][len: u32][payload]` frame.
fn frame(writer: &mut Writer, tag: u8, payload: &[u8]) -> Vec<u8> {
    writer.u8(tag);
    writer.u32(payload.len() as u32);
    writer.buf(payload);
    writer.flush()
}

fn read_frame<'a>(reader: &mut Reader<'a>) -> Result<(u8, &'a [u8]), BufferError> {
    let start = reader.x;
    let result = frame_body(reader);
    if result.is_err() {
        reader.x = start;
    }
    result
}

fn frame_body<'a>(reader: &mut Reader<'a>) -> Result<(u8, &'a [u8]), BufferError> {
    let tag = reader.u8()?;
    let len = reader.u32()? as usize;
    Ok((tag, reader.buf(len)?))
}

#[test]
fn signed_extremes_survive() {
    let mut writer = Writer::with_alloc_size(8);
    writer.i8(i8::MIN);
    writer.i16(i16::MAX);
    writer.i32(i32::MIN);
    writer.i64(-9_999_999_999);
    writer.f32(f32::NEG_INFINITY);
    writer.f64(f64::NAN);
    let bytes = writer.flush();
    assert_eq!(bytes.len(), 1 + 2 + 4 + 8 + 4 + 8);

    let mut reader = Reader::new(&bytes);
    assert_eq!(reader.i8(), Ok(i8::MIN));
    assert_eq!(reader.i16(), Ok(i16::MAX));
    assert_eq!(reader.i32(), Ok(i32::MIN));
    assert_eq!(reader.i64(), Ok(-9_999_999_999));
    assert_eq!(reader.f32(), Ok(f32::NEG_INFINITY));
    assert!(reader.f64().is_ok_and(f64::is_nan));
}

#[test]
fn multi_byte_layout() {
    let mut writer = Writer::new();
    writer.u16(0xa1a2);
    writer.u64(0x0001_0203_0405_0607);
    assert_eq!(writer.flush(), vec![0xa1, 0xa2, 0, 1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn frames_back_to_back() {
    let mut writer = Writer::with_alloc_size(4);
    let mut bytes = frame(&mut writer, 11, "ünïcode".as_bytes());
    bytes.extend(frame(&mut writer, 5, &[]));

    let mut reader = Reader::new(&bytes);
    let (tag, payload) = read_frame(&mut reader).unwrap();
    assert_eq!(tag, 11);
    assert_eq!(Reader::new(payload).utf8(payload.len()), Ok("ünïcode"));
    assert_eq!(read_frame(&mut reader), Ok((5, &[][..])));
    assert_eq!(reader.size(), 0);
}

#[test]
fn every_truncation_rewinds() {
    let mut writer = Writer::new();
    let bytes = frame(&mut writer, 7, &[1, 2, 3]);
    for cut in 0..bytes.len() {
        let mut reader = Reader::new(&bytes[..cut]);
        assert_eq!(read_frame(&mut reader), Err(BufferError::EndOfBuffer));
        assert_eq!(reader.x, 0, "cut at {cut}");
    }
}

#[test]
fn truncate_drops_a_half_written_frame() {
    let mut writer = Writer::with_alloc_size(4);
    writer.u8(1);
    let mark = writer.x;
    writer.u32(0xffff_ffff);
    writer.buf(&[9; 10]);
    writer.truncate(mark);
    assert_eq!(writer.unflushed(), &[1]);
    writer.u8(2);
    assert_eq!(writer.flush(), vec![1, 2]);
}

#[test]
fn stream_delivers_frames_byte_by_byte() {
    let mut writer = Writer::new();
    let mut bytes = frame(&mut writer, 1, b"abc");
    bytes.extend(frame(&mut writer, 2, b"defgh"));

    let mut stream = StreamingReader::with_alloc_size(3);
    let mut seen = Vec::new();
    for byte in &bytes {
        stream.push(std::slice::from_ref(byte));
        let mut reader = stream.reader();
        if let Ok((tag, payload)) = read_frame(&mut reader) {
            seen.push((tag, payload.to_vec()));
            let used = reader.x - stream.x();
            stream.skip(used).unwrap();
            stream.consume();
        }
    }
    assert_eq!(seen, vec![(1, b"abc".to_vec()), (2, b"defgh".to_vec())]);
    assert_eq!(stream.size(), 0);
}
