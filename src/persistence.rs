//! JSON persistence for an [`Index`](crate::index::Index).
//!
//! The on-disk shape is an implementation detail: it round-trips the
//! three index fields losslessly but makes no claim of interop with
//! the legacy `{hash_table, metadata, _next_track_id}` pickle format.

use std::io::{Read, Write};

use crate::error::Error;
use crate::index::Index;

pub fn save(index: &Index, mut writer: impl Write) -> Result<(), Error> {
    let json = serde_json::to_vec_pretty(index)?;
    writer.write_all(&json)?;
    Ok(())
}

pub fn load(mut reader: impl Read) -> Result<Index, Error> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    let index = serde_json::from_str(&buf)
        .map_err(|e| Error::IndexIo(format!("corrupt index payload: {e}")))?;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn round_trips_an_index() {
        let sample_rate = 11025;
        let pcm: Vec<f32> = (0..sample_rate * 2)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / sample_rate as f32).sin())
            .collect();

        let mut index = Index::new();
        let id = index.add_track(&pcm, sample_rate, None).unwrap();

        let mut buf = Vec::new();
        save(&index, &mut buf).unwrap();
        let loaded = load(buf.as_slice()).unwrap();

        assert_eq!(loaded.track_count(), index.track_count());
        assert_eq!(loaded.metadata(id), index.metadata(id));

        let result = loaded.recognise(&pcm, sample_rate).unwrap();
        assert_eq!(result.track_id, Some(id));
    }

    #[test]
    fn corrupt_payload_is_an_index_io_error() {
        let err = load("{ not json".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::IndexIo(_)));
    }
}
