// # 📂 `tests/test_file.rs`

// * ✅ file round trips on both paths (in-memory, streamed)
// * ✅ threshold boundary picks the same path for encrypt and decrypt
// * ✅ unsized readers are probed, memory sinks return output
// * ✅ I/O and corruption errors

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;

    use blockmode_core::context::CipherContext;
    use blockmode_core::crypto::{CipherError, CipherMode, PaddingMode, SeededRandom, Xtea, XteaWide};
    use blockmode_core::stream::{
        decrypt_file, decrypt_file_with, decrypt_stream, encrypt_file, encrypt_file_with, encrypt_stream,
        InputSource, OutputSink, ParallelismProfile, StreamConfig,
    };
    use blockmode_core::telemetry::{Direction, ProcessingPath};
    use blockmode_core::types::StreamError;
    use tempfile::tempdir;

    const KEY: &[u8; 16] = b"file-stream-key!";

    // ------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------
    fn small_config() -> StreamConfig {
        StreamConfig {
            max_in_memory_size: 256,
            chunk_size: 64,
            profile: Some(ParallelismProfile::new(3, 4)),
        }
    }

    fn ctx(mode: CipherMode) -> CipherContext {
        CipherContext::builder()
            .cipher(Xtea::new(KEY).unwrap())
            .mode(mode)
            .padding(PaddingMode::Pkcs7)
            .iv(&[0x11; 8])
            .random_source(SeededRandom::new(8))
            .build()
            .unwrap()
    }

    fn data(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 256) as u8).collect()
    }

    // ------------------------------------------------------------
    // Files
    // ------------------------------------------------------------
    #[test]
    fn streamed_file_round_trip() {
        let dir = tempdir().unwrap();
        let plain = data(1000);
        let src = dir.path().join("plain.bin");
        let enc = dir.path().join("plain.enc");
        let dec = dir.path().join("plain.dec");
        fs::write(&src, &plain).unwrap();

        for mode in [CipherMode::Ctr, CipherMode::Ecb, CipherMode::Cbc] {
            let ctx = ctx(mode);
            let snap = encrypt_file_with(&ctx, &src, &enc, &small_config()).unwrap();
            assert_eq!(snap.path, ProcessingPath::Streamed, "{mode}");
            assert_eq!(snap.direction, Direction::Encrypt);
            assert_eq!(snap.chunks, 16);
            assert_eq!(snap.bytes_in, 1000);
            assert_eq!(snap.bytes_out, fs::metadata(&enc).unwrap().len());
            assert!(snap.has_all_stages());

            let snap = decrypt_file_with(&ctx, &enc, &dec, &small_config()).unwrap();
            assert_eq!(snap.path, ProcessingPath::Streamed, "{mode}");
            assert_eq!(snap.chunks, 16);
            assert!(snap.has_all_stages());
            assert_eq!(fs::read(&dec).unwrap(), plain, "{mode}");
        }
    }

    #[test]
    fn small_file_takes_in_memory_path() {
        let dir = tempdir().unwrap();
        let plain = data(100);
        let src = dir.path().join("small.bin");
        let enc = dir.path().join("small.enc");
        let dec = dir.path().join("small.dec");
        fs::write(&src, &plain).unwrap();

        let ctx = ctx(CipherMode::Cbc);
        let snap = encrypt_file(&ctx, &src, &enc).unwrap();
        assert_eq!(snap.path, ProcessingPath::InMemory);
        assert_eq!(snap.chunks, 1);
        assert_eq!(fs::read(&enc).unwrap(), ctx.encrypt(&plain).unwrap());

        let snap = decrypt_file(&ctx, &enc, &dec).unwrap();
        assert_eq!(snap.path, ProcessingPath::InMemory);
        assert_eq!(fs::read(&dec).unwrap(), plain);
    }

    #[test]
    fn threshold_boundary_is_consistent() {
        let ctx = ctx(CipherMode::Cbc);
        for (len, path) in [(256usize, ProcessingPath::InMemory), (257, ProcessingPath::Streamed)] {
            let plain = data(len);
            let snap = encrypt_stream(&ctx, InputSource::Memory(plain.clone()), OutputSink::Memory, &small_config())
                .unwrap();
            assert_eq!(snap.path, path, "len={len}");
            let ct = snap.output.unwrap();

            let snap = decrypt_stream(&ctx, InputSource::Memory(ct), OutputSink::Memory, &small_config()).unwrap();
            assert_eq!(snap.path, path, "len={len}");
            assert_eq!(snap.output.unwrap(), plain, "len={len}");
        }
    }

    #[test]
    fn unaligned_config_is_snapped_to_blocks() {
        let ctx = CipherContext::builder()
            .cipher(XteaWide::new(KEY).unwrap())
            .mode(CipherMode::Pcbc)
            .padding(PaddingMode::AnsiX923)
            .iv(&[9u8; 16])
            .build()
            .unwrap();
        let config = StreamConfig {
            max_in_memory_size: 300,
            chunk_size: 1000,
            profile: Some(ParallelismProfile::new(2, 2)),
        };
        let plain = data(5000);
        let snap = encrypt_stream(&ctx, InputSource::Memory(plain.clone()), OutputSink::Memory, &config).unwrap();
        assert_eq!(snap.path, ProcessingPath::Streamed);
        // Threshold 300 snaps to 288, and the chunk is clamped to it.
        assert_eq!(snap.chunks, 5000u64.div_ceil(288));

        let ct = snap.output.unwrap();
        let snap = decrypt_stream(&ctx, InputSource::Memory(ct), OutputSink::Memory, &config).unwrap();
        assert_eq!(snap.output.unwrap(), plain);
    }

    // ------------------------------------------------------------
    // Readers and sinks
    // ------------------------------------------------------------
    #[test]
    fn unsized_reader_is_probed() {
        let ctx = ctx(CipherMode::Ctr);
        for (len, path) in [(200usize, ProcessingPath::InMemory), (2000, ProcessingPath::Streamed)] {
            let plain = data(len);
            let reader = Box::new(Cursor::new(plain.clone()));
            let snap = encrypt_stream(&ctx, InputSource::Reader(reader), OutputSink::Memory, &small_config()).unwrap();
            assert_eq!(snap.path, path, "len={len}");
            assert_eq!(snap.bytes_in, len as u64);

            let ct = snap.output.unwrap();
            let reader = Box::new(Cursor::new(ct));
            let snap = decrypt_stream(&ctx, InputSource::Reader(reader), OutputSink::Memory, &small_config()).unwrap();
            assert_eq!(snap.path, path, "len={len}");
            assert_eq!(snap.output.unwrap(), plain, "len={len}");
        }
    }

    #[test]
    fn writer_sink_receives_output() {
        let dir = tempdir().unwrap();
        let out_path = dir.path().join("via-writer.enc");
        let ctx = ctx(CipherMode::Ofb);
        let plain = data(700);

        let file = fs::File::create(&out_path).unwrap();
        let snap =
            encrypt_stream(&ctx, InputSource::Memory(plain.clone()), OutputSink::Writer(Box::new(file)), &small_config())
                .unwrap();
        assert!(snap.output.is_none());

        let snap =
            decrypt_stream(&ctx, InputSource::File(out_path), OutputSink::Memory, &small_config()).unwrap();
        assert_eq!(snap.output.unwrap(), plain);
    }

    #[test]
    fn empty_input_round_trips() {
        let ctx = ctx(CipherMode::Cbc);
        let snap = encrypt_stream(&ctx, InputSource::Memory(Vec::new()), OutputSink::Memory, &small_config()).unwrap();
        let ct = snap.output.unwrap();
        assert_eq!(ct.len(), 8);
        let snap = decrypt_stream(&ctx, InputSource::Memory(ct), OutputSink::Memory, &small_config()).unwrap();
        assert!(snap.output.unwrap().is_empty());
    }

    // ------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------
    #[test]
    fn missing_input_file_is_io_error() {
        let dir = tempdir().unwrap();
        let ctx = ctx(CipherMode::Ecb);
        let res = encrypt_file(&ctx, dir.path().join("nope.bin"), dir.path().join("out.bin"));
        assert!(matches!(res, Err(StreamError::Io(_))));
    }

    #[test]
    fn truncated_streamed_ciphertext_fails() {
        let ctx = ctx(CipherMode::Cbc);
        let snap =
            encrypt_stream(&ctx, InputSource::Memory(data(1000)), OutputSink::Memory, &small_config()).unwrap();
        let mut ct = snap.output.unwrap();
        ct.truncate(ct.len() - 5);

        let err = decrypt_stream(&ctx, InputSource::Memory(ct), OutputSink::Memory, &small_config()).unwrap_err();
        assert!(matches!(err, StreamError::Worker { index: 15, .. }), "{err:?}");
    }

    #[test]
    fn corrupted_in_memory_ciphertext_fails() {
        let ctx = ctx(CipherMode::Ecb);
        let err = decrypt_stream(&ctx, InputSource::Memory(vec![0u8; 12]), OutputSink::Memory, &small_config())
            .unwrap_err();
        assert!(matches!(err, StreamError::Cipher(CipherError::Input(_))), "{err:?}");
    }

    #[test]
    fn zero_chunk_size_is_configuration_error() {
        let ctx = ctx(CipherMode::Ecb);
        let config = StreamConfig { chunk_size: 0, ..small_config() };
        let err = encrypt_stream(&ctx, InputSource::Memory(data(10)), OutputSink::Memory, &config).unwrap_err();
        assert!(matches!(err, StreamError::Cipher(CipherError::Configuration(_))));
    }
}
