use bytes::{BufMut, Bytes, BytesMut};
use hdrhistogram::Histogram;
use rand::Rng;
use rml_flv::muxer::{MuxerSession, MuxerSessionConfig, Packet};
use rml_flv::sink::StreamSink;
use std::io;
use std::time::{Duration, Instant};
use tracing::info;

const ITERATION_COUNT: u32 = 100_000;
const KEY_FRAME_INTERVAL: u32 = 60;
const VIDEO_FRAME_SIZE: usize = 10_000;
const AUDIO_PAYLOAD_SIZE: usize = 370;
const FRAME_DURATION_US: i64 = 33_333;
const AUDIO_FRAME_DURATION_US: i64 = 23_220;
const SPS_PPS: &[u8] = &[
    0, 0, 0, 1, 0x67, 0x42, 0xC0, 0x1F, 0xDA, 0x01, 0x40, 0x16, 0xEC, 0x04, 0x40, 0, 0, 0, 1, 0x68, 0xCE, 0x3C,
    0x80,
];

fn main() {
    let _ = tracing_subscriber::fmt::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .from_env_lossy(),
        )
        .try_init();

    let args: Vec<_> = std::env::args().collect();
    let iteration_count = if args.len() >= 2 {
        args[1].parse::<u32>().unwrap()
    } else {
        ITERATION_COUNT
    };

    let mut config = MuxerSessionConfig::new("unused.flv");
    config.audio_sample_rate = 44100;
    config.audio_channels = 2;

    let mut session = MuxerSession::prepare_with_sink(config, StreamSink::new(io::sink())).unwrap();
    session.set_video_configuration_data(SPS_PPS).unwrap();
    session.write_header().unwrap();

    let key_frame = video_frame(0x65);
    let inter_frame = video_frame(0x41);
    let audio_frame = adts_frame();

    let mut video_latencies = Histogram::<u64>::new(3).unwrap();
    let mut audio_latencies = Histogram::<u64>::new(3).unwrap();

    println!("Running {} iterations", iteration_count);

    let start = Instant::now();
    for iteration in 0..iteration_count {
        let is_key_frame = iteration % KEY_FRAME_INTERVAL == 0;
        let frame = if is_key_frame { &key_frame } else { &inter_frame };
        let video = Packet::video(frame, iteration as i64 * FRAME_DURATION_US, is_key_frame);
        let audio = Packet::audio(&audio_frame, iteration as i64 * AUDIO_FRAME_DURATION_US);

        let packet_start = Instant::now();
        session.write_packet(&video).unwrap();
        record(&mut video_latencies, packet_start.elapsed());

        let packet_start = Instant::now();
        session.write_packet(&audio).unwrap();
        record(&mut audio_latencies, packet_start.elapsed());
    }

    session.finalize().unwrap();

    let elapsed = start.elapsed();
    info!(bytes = session.statistics().bytes_written, "Session finalized");
    println!("Took {}.{:09} seconds", elapsed.as_secs(), elapsed.subsec_nanos());
    print_latencies("Video", &video_latencies);
    print_latencies("Audio", &audio_latencies);
}

/// An Annex-B frame with a single NAL unit of random data
fn video_frame(nal_header: u8) -> Bytes {
    let mut payload = vec![0_u8; VIDEO_FRAME_SIZE];
    rand::thread_rng().fill(&mut payload[..]);

    let mut frame = BytesMut::with_capacity(VIDEO_FRAME_SIZE + 5);
    frame.put_slice(&[0, 0, 0, 1, nal_header]);
    frame.put_slice(&payload);
    frame.freeze()
}

/// An AAC-LC, 44.1 kHz stereo frame of random data behind an ADTS header
fn adts_frame() -> Bytes {
    let length = AUDIO_PAYLOAD_SIZE + 7;
    let mut frame = BytesMut::with_capacity(length);
    frame.put_slice(&[
        0xFF,
        0xF1,
        0x50,
        0x80 | ((length >> 11) & 0x03) as u8,
        ((length >> 3) & 0xFF) as u8,
        (((length & 0x07) << 5) as u8) | 0x1F,
        0xFC,
    ]);

    let mut payload = vec![0_u8; AUDIO_PAYLOAD_SIZE];
    rand::thread_rng().fill(&mut payload[..]);
    frame.put_slice(&payload);
    frame.freeze()
}

fn record(histogram: &mut Histogram<u64>, elapsed: Duration) {
    histogram.saturating_record(elapsed.as_nanos() as u64);
}

fn print_latencies(label: &str, histogram: &Histogram<u64>) {
    println!(
        "{} packets: p50 {}ns   p99 {}ns   p99.9 {}ns   max {}ns",
        label,
        histogram.value_at_quantile(0.5),
        histogram.value_at_quantile(0.99),
        histogram.value_at_quantile(0.999),
        histogram.max()
    );
}
