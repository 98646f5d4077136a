//! Integration tests for edge replay
//!
//! The edge device sees one sample at a time. These tests check that the
//! streaming path reproduces the batch pipeline exactly when both use the
//! same blocked denoising configuration.

mod common;

use windguard_core::{
    stream::{MemoryStream, Stream, StreamError},
    Baseline, Channel, EdgeReplay, Pipeline, PipelineConfig, PipelineError, Stage, TensorStream, Tensor,
};

use common::{bit_identical, TurbineGenerator};

fn blocked(block_len: usize, stride: usize) -> (PipelineConfig, Pipeline, Baseline) {
    let config = PipelineConfig::builder().blocked(block_len).stride(stride).build().unwrap();
    let pipeline = Pipeline::new(config.clone()).unwrap();
    let reference = TurbineGenerator::new("wt01", "imu0").generate(800);
    let baseline = pipeline.fit(&reference).unwrap();
    (config, pipeline, baseline)
}

fn replay_all(replay: &mut EdgeReplay, samples: &[windguard_core::Sample]) -> Vec<Tensor> {
    let mut out = Vec::new();
    for sample in samples {
        replay.push(sample).unwrap();
        while let Some(tensor) = replay.pop() {
            out.push(tensor);
        }
    }
    replay.flush().unwrap();
    while let Some(tensor) = replay.pop() {
        out.push(tensor);
    }
    out
}

#[test]
fn replay_equals_batch_across_block_boundaries() {
    for (block_len, stride, n) in [(100, 1, 250), (128, 5, 401), (200, 3, 200), (150, 7, 449)] {
        let (config, pipeline, baseline) = blocked(block_len, stride);
        let live = TurbineGenerator::new("wt01", "imu0").starting_at(90_000).noise(0.04).generate(n);

        let batch = pipeline.transform(&live, &baseline).unwrap();
        let mut replay = EdgeReplay::new(&config, &baseline).unwrap();
        let streamed = replay_all(&mut replay, &live);

        assert_eq!(batch.len(), config.window.expected_count(n));
        assert!(bit_identical(&streamed, &batch), "block {} stride {} n {}", block_len, stride, n);
    }
}

#[test]
fn single_trailing_sample_passes_through_in_both_paths() {
    // 201 samples with blocks of 100 leave a one-sample tail
    let (config, pipeline, baseline) = blocked(100, 1);
    let live = TurbineGenerator::new("wt01", "imu0").generate(201);

    let batch = pipeline.transform(&live, &baseline).unwrap();
    let mut replay = EdgeReplay::new(&config, &baseline).unwrap();
    let streamed = replay_all(&mut replay, &live);
    assert_eq!(streamed.len(), 102);
    assert!(bit_identical(&streamed, &batch));
}

#[test]
fn tensor_stream_drains_memory_stream() {
    let (config, pipeline, baseline) = blocked(120, 2);
    let live = TurbineGenerator::new("wt01", "imu0").generate(300);
    let batch = pipeline.transform(&live, &baseline).unwrap();

    let replay = EdgeReplay::new(&config, &baseline).unwrap();
    let mut stream = TensorStream::new(MemoryStream::new(&live), replay);

    let mut streamed = Vec::new();
    let mut would_block = 0;
    loop {
        match stream.poll_next() {
            Ok(tensor) => streamed.push(tensor),
            Err(nb::Error::WouldBlock) => would_block += 1,
            Err(nb::Error::Other(StreamError::EndOfStream)) => break,
            Err(nb::Error::Other(other)) => panic!("unexpected {:?}", other),
        }
    }

    assert!(would_block > 0);
    assert!(bit_identical(&streamed, &batch));
    // ended streams stay ended
    assert_eq!(stream.poll_next(), Err(nb::Error::Other(StreamError::EndOfStream)));
}

#[test]
fn tensor_stream_surfaces_pipeline_errors() {
    let (config, _, baseline) = blocked(100, 1);
    let mut live = TurbineGenerator::new("wt01", "imu0").generate(20);
    live[3].qw = None;

    let replay = EdgeReplay::new(&config, &baseline).unwrap();
    let mut stream = TensorStream::new(MemoryStream::new(&live), replay);
    let mut result = stream.poll_next();
    while result == Err(nb::Error::WouldBlock) {
        result = stream.poll_next();
    }
    assert_eq!(
        result,
        Err(nb::Error::Other(StreamError::Pipeline(PipelineError::InvalidInput {
            field: "qw",
            reason: "missing quaternion component",
        })))
    );
}

#[test]
fn replay_rejects_foreign_stream_and_mismatched_baseline() {
    let (config, _, baseline) = blocked(100, 1);
    let mut replay = EdgeReplay::new(&config, &baseline).unwrap();
    let own = TurbineGenerator::new("wt01", "imu0").generate(2);
    let other = TurbineGenerator::new("wt01", "imu9").starting_at(500).generate(1);

    replay.push(&own[0]).unwrap();
    assert!(matches!(replay.push(&other[0]), Err(PipelineError::InvalidInput { field: "device_id", .. })));
    replay.push(&own[1]).unwrap();
    assert_eq!(replay.accepted(), 2);

    let narrower = PipelineConfig::builder()
        .channels(&[Channel::Roll, Channel::Pitch])
        .blocked(100)
        .build()
        .unwrap();
    assert!(matches!(
        EdgeReplay::new(&narrower, &baseline),
        Err(PipelineError::ConfigMismatch { .. })
    ));
}

#[test]
fn eager_consumer_keeps_every_tensor_of_long_blocks() {
    // one 400-sample block completes 301 tensors, more than the queue holds
    let (config, pipeline, baseline) = blocked(400, 1);
    let live = TurbineGenerator::new("wt01", "imu0").starting_at(40_000).generate(800);
    let batch = pipeline.transform(&live, &baseline).unwrap();

    let mut replay = EdgeReplay::new(&config, &baseline).unwrap();
    let streamed = replay_all(&mut replay, &live);

    assert_eq!(batch.len(), 701);
    assert_eq!(replay.dropped(), 0);
    assert!(bit_identical(&streamed, &batch));
}

#[test]
fn slow_consumer_loses_oldest_tensors() {
    let (config, pipeline, baseline) = blocked(400, 1);
    let live = TurbineGenerator::new("wt01", "imu0").generate(800);
    let batch = pipeline.transform(&live, &baseline).unwrap();

    let mut replay = EdgeReplay::new(&config, &baseline).unwrap();
    for sample in &live[..400] {
        replay.push(sample).unwrap();
    }
    assert_eq!(replay.pending(), 301);
    assert_eq!(replay.dropped(), 0);

    // the second block pushes the unread 301 through the 256-slot queue
    for sample in &live[400..] {
        replay.push(sample).unwrap();
    }
    assert_eq!(replay.dropped(), 45);
    assert_eq!(replay.pending(), 256 + 400);

    let mut streamed = Vec::new();
    while let Some(tensor) = replay.pop() {
        streamed.push(tensor);
    }
    assert_eq!(streamed[0].timestamp(), live[99 + 45].timestamp);
    assert!(bit_identical(&streamed, &batch[45..]));
    assert_eq!(replay.pending(), 0);
}

#[test]
fn replay_recovers_after_a_failed_block() {
    let config = PipelineConfig::builder()
        .channels(&[Channel::Roll, Channel::Pitch, Channel::GyroX, Channel::Voltage])
        .blocked(100)
        .build()
        .unwrap();
    let pipeline = Pipeline::new(config.clone()).unwrap();
    let baseline = pipeline.fit(&TurbineGenerator::new("wt01", "imu0").generate(800)).unwrap();

    let mut live = TurbineGenerator::new("wt01", "imu0").starting_at(10_000).generate(400);
    live[99].voltage = 1e308;

    let mut replay = EdgeReplay::new(&config, &baseline).unwrap();
    for sample in &live[..99] {
        replay.push(sample).unwrap();
    }
    assert!(matches!(
        replay.push(&live[99]),
        Err(PipelineError::Numeric { stage: Stage::Denoise, channel: Channel::Voltage, .. })
    ));
    assert_eq!(replay.accepted(), 100);
    assert!(replay.pop().is_none());

    // the failed block is gone and the next blocks line up with a fresh batch run
    let streamed = replay_all(&mut replay, &live[100..]);
    let batch = pipeline.transform(&live[100..], &baseline).unwrap();
    assert_eq!(batch.len(), 201);
    assert!(bit_identical(&streamed, &batch));
    assert_eq!(replay.accepted(), 400);
}
