// # 📂 `tests/test_pipeline.rs`

// * ✅ output order survives reversed completion order
// * ✅ chunked cipher output == per-chunk whole-buffer calls
// * ✅ boundary conditions (empty input, exact multiple, short tail)
// * ✅ backpressure bounds the reorder buffer
// * ✅ error propagation (failing chunk, panicking chunk, truncated ciphertext)

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use blockmode_core::context::CipherContext;
    use blockmode_core::crypto::{CipherError, CipherMode, PaddingMode, Xtea};
    use blockmode_core::stream::chunk_worker::Chunk;
    use blockmode_core::stream::pipeline::{run_decrypt_pipeline, run_encrypt_pipeline};
    use blockmode_core::stream::{run_pipeline, ParallelismProfile, PipelineConfig};
    use blockmode_core::telemetry::{Stage, TelemetryTimer};
    use blockmode_core::types::StreamError;

    // ------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------
    fn config(chunk_size: usize, workers: usize, inflight: usize) -> PipelineConfig {
        PipelineConfig::new(chunk_size, ParallelismProfile::new(workers, inflight))
    }

    fn data(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 256) as u8).collect()
    }

    fn ctx(mode: CipherMode) -> CipherContext {
        CipherContext::new(Xtea::new(b"pipeline-key-016").unwrap(), mode, PaddingMode::Pkcs7, Some(&[3u8; 8][..]))
            .unwrap()
    }

    /// Tag each chunk's output with its index so ordering is visible.
    fn tagged(chunk: &Chunk) -> Vec<u8> {
        let mut out = vec![chunk.index as u8];
        out.extend_from_slice(&chunk.payload);
        out
    }

    // ------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------
    #[test]
    fn reversed_completion_is_written_in_order() {
        const CHUNKS: u64 = 6;
        let input = data(4 * CHUNKS as usize);
        let mut out = Vec::new();
        let mut timer = TelemetryTimer::new();

        // Earlier chunks take longer, so results arrive last-first.
        let outcome = run_pipeline(
            Cursor::new(input.clone()),
            &mut out,
            &config(4, CHUNKS as usize, CHUNKS as usize),
            Stage::Encrypt,
            &mut timer,
            |chunk: &Chunk| -> Result<Vec<u8>, CipherError> {
                thread::sleep(Duration::from_millis(20 * (CHUNKS - chunk.index)));
                Ok(tagged(chunk))
            },
        )
        .unwrap();

        let expected: Vec<u8> = input
            .chunks(4)
            .enumerate()
            .flat_map(|(i, c)| std::iter::once(i as u8).chain(c.iter().copied()))
            .collect();
        assert_eq!(out, expected);
        assert_eq!(outcome.counters.chunks, CHUNKS);
        assert_eq!(outcome.counters.bytes_in, input.len() as u64);
        assert_eq!(outcome.counters.bytes_out, expected.len() as u64);
        assert!(outcome.max_reorder_depth >= 1);
    }

    #[test]
    fn short_tail_and_exact_multiple() {
        for len in [1usize, 7, 8, 9, 64, 65] {
            let input = data(len);
            let mut out = Vec::new();
            let mut timer = TelemetryTimer::new();
            let outcome = run_pipeline(
                Cursor::new(input.clone()),
                &mut out,
                &config(8, 3, 4),
                Stage::Encrypt,
                &mut timer,
                |c: &Chunk| -> Result<Vec<u8>, CipherError> { Ok(c.payload.to_vec()) },
            )
            .unwrap();
            assert_eq!(out, input, "len={len}");
            assert_eq!(outcome.counters.chunks, len.div_ceil(8) as u64, "len={len}");
        }
    }

    #[test]
    fn empty_input_dispatches_one_empty_chunk() {
        let mut out = Vec::new();
        let mut timer = TelemetryTimer::new();
        let outcome = run_pipeline(
            Cursor::new(Vec::new()),
            &mut out,
            &config(8, 2, 2),
            Stage::Encrypt,
            &mut timer,
            |c: &Chunk| -> Result<Vec<u8>, CipherError> {
                assert!(c.payload.is_empty());
                Ok(b"marker".to_vec())
            },
        )
        .unwrap();
        assert_eq!(out, b"marker");
        assert_eq!(outcome.counters.chunks, 1);
    }

    // ------------------------------------------------------------
    // Backpressure
    // ------------------------------------------------------------
    #[test]
    fn stalled_chunk_bounds_reorder_buffer() {
        let inflight = 4;
        let in_op = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let mut out = Vec::new();
        let mut timer = TelemetryTimer::new();

        let outcome = run_pipeline(
            Cursor::new(data(16 * 40)),
            &mut out,
            &config(16, 4, inflight),
            Stage::Encrypt,
            &mut timer,
            |c: &Chunk| -> Result<Vec<u8>, CipherError> {
                let now = in_op.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                if c.index % 10 == 0 {
                    thread::sleep(Duration::from_millis(30));
                }
                in_op.fetch_sub(1, Ordering::SeqCst);
                Ok(c.payload.to_vec())
            },
        )
        .unwrap();

        assert_eq!(out, data(16 * 40));
        assert_eq!(outcome.counters.chunks, 40);
        assert!(outcome.max_reorder_depth <= inflight, "depth={}", outcome.max_reorder_depth);
        assert!(peak.load(Ordering::SeqCst) <= 4);
    }

    // ------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------
    #[test]
    fn failing_chunk_reports_its_index() {
        let mut out = Vec::new();
        let mut timer = TelemetryTimer::new();
        let err = run_pipeline(
            Cursor::new(data(8 * 10)),
            &mut out,
            &config(8, 3, 3),
            Stage::Encrypt,
            &mut timer,
            |c: &Chunk| -> Result<Vec<u8>, CipherError> {
                if c.index == 3 {
                    Err(CipherError::Input("boom".into()))
                } else {
                    Ok(c.payload.to_vec())
                }
            },
        )
        .unwrap_err();

        match err {
            StreamError::Worker { index, source: CipherError::Input(_) } => assert_eq!(index, 3),
            other => panic!("unexpected error: {other:?}"),
        }
        // Only chunks before the failure can have been flushed.
        assert!(out.len() <= 3 * 8);
    }

    #[test]
    fn panicking_chunk_is_pipeline_error() {
        let mut out = Vec::new();
        let mut timer = TelemetryTimer::new();
        let err = run_pipeline(
            Cursor::new(data(8 * 5)),
            &mut out,
            &config(8, 2, 2),
            Stage::Encrypt,
            &mut timer,
            |c: &Chunk| -> Result<Vec<u8>, CipherError> {
                if c.index == 1 {
                    panic!("chunk op exploded");
                }
                Ok(c.payload.to_vec())
            },
        )
        .unwrap_err();
        assert!(matches!(err, StreamError::Pipeline(_)), "{err:?}");
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let mut out = Vec::new();
        let mut timer = TelemetryTimer::new();
        let res = run_pipeline(
            Cursor::new(data(8)),
            &mut out,
            &config(0, 1, 1),
            Stage::Encrypt,
            &mut timer,
            |c: &Chunk| -> Result<Vec<u8>, CipherError> { Ok(c.payload.to_vec()) },
        );
        assert!(matches!(res, Err(StreamError::Pipeline(_))));
    }

    // ------------------------------------------------------------
    // Cipher pipelines
    // ------------------------------------------------------------
    #[test]
    fn chunked_ciphertext_is_per_chunk_encryption() {
        let chunk = 64;
        let input = data(chunk * 5 + 13);
        for mode in [CipherMode::Ecb, CipherMode::Cbc, CipherMode::Ctr, CipherMode::Pcbc] {
            let ctx = ctx(mode);
            let mut ct = Vec::new();
            let mut timer = TelemetryTimer::new();
            run_encrypt_pipeline(Cursor::new(input.clone()), &mut ct, &ctx, &config(chunk, 3, 6), &mut timer).unwrap();

            let expected: Vec<u8> = input.chunks(chunk).flat_map(|c| ctx.encrypt(c).unwrap()).collect();
            assert_eq!(ct, expected, "{mode}");

            let mut back = Vec::new();
            let mut timer = TelemetryTimer::new();
            let outcome =
                run_decrypt_pipeline(Cursor::new(ct), &mut back, &ctx, &config(chunk, 3, 6), &mut timer).unwrap();
            assert_eq!(back, input, "{mode}");
            assert_eq!(outcome.counters.chunks, 6);
        }
    }

    #[test]
    fn truncated_ciphertext_fails_on_last_chunk() {
        let ctx = ctx(CipherMode::Cbc);
        let mut ct = Vec::new();
        let mut timer = TelemetryTimer::new();
        run_encrypt_pipeline(Cursor::new(data(200)), &mut ct, &ctx, &config(64, 2, 2), &mut timer).unwrap();
        ct.truncate(ct.len() - 3);

        let mut back = Vec::new();
        let err = run_decrypt_pipeline(Cursor::new(ct), &mut back, &ctx, &config(64, 2, 2), &mut timer).unwrap_err();
        match err {
            StreamError::Worker { index, source: CipherError::Input(_) } => assert_eq!(index, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
