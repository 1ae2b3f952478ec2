//! Conference example.
//!
//! Three synthetic participants talk over each other for two seconds. Each
//! one receives the mix of the other two and a tiled composite of all three.
//!
//! Run with: RUST_LOG=stream_mix=debug cargo run --example conference

use std::time::Duration;

use stream_mix::source::color_bars;
use stream_mix::{
    AudioChunk, AudioFormat, AudioMixer, ChannelSink, FrameSize, MixerEvent, MockSource,
    VideoComposite, VideoMixer,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const PARTICIPANTS: [(&str, f64); 3] = [("alice", 300.0), ("bob", 440.0), ("carol", 660.0)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let on_event = |event: MixerEvent| match event {
        MixerEvent::SinkError { sink_name, error, .. } => {
            eprintln!("sink '{sink_name}' error: {error}");
        }
        MixerEvent::BufferOverrun { source_id, dropped_bytes } => {
            eprintln!("{source_id}: dropped {dropped_bytes} bytes");
        }
        other => println!("{other:?}"),
    };

    let mut audio = AudioMixer::builder()
        .format(AudioFormat::Wideband)
        .on_event(on_event)
        .build()?;
    let mut video = VideoMixer::builder()
        .size(640, 360)
        .fps(25)
        .on_event(on_event)
        .build()?;

    let mut listeners = Vec::new();
    let mut producers = Vec::new();
    for (name, tone) in PARTICIPANTS {
        let (audio_tx, audio_rx) = mpsc::channel::<AudioChunk>(64);
        let (video_tx, video_rx) = mpsc::channel::<VideoComposite>(8);
        let mic = audio.add_source(ChannelSink::with_name(name, audio_tx))?;
        let camera = video.add_source(ChannelSink::with_name(name, video_tx))?;

        listeners.push(tokio::spawn(listen(name, audio_rx, video_rx)));
        producers.push(tokio::spawn(async move {
            let mut generator = MockSource::from_format(AudioFormat::Wideband);
            let mut ticker = tokio::time::interval(Duration::from_millis(20));
            for n in 0..100usize {
                ticker.tick().await;
                generator.generate_tone(tone, 0.2, 20);
                mic.put(&generator.take_bytes());
                if n % 2 == 0 {
                    if let Ok(frame) = color_bars(FrameSize::new(320, 180), n / 2) {
                        camera.put(frame);
                    }
                }
            }
            (mic, camera)
        }));
    }

    for producer in producers {
        let (mic, camera) = producer.await?;
        mic.remove();
        camera.remove();
    }

    println!("audio: {:?}", audio.stats());
    println!("video: {:?}", video.stats());
    audio.stop();
    video.stop();

    for listener in listeners {
        let (name, chunks, peak, composites) = listener.await?;
        println!("{name}: {chunks} chunks (peak {peak}), {composites} composites");
    }

    Ok(())
}

async fn listen(
    name: &'static str,
    mut audio: mpsc::Receiver<AudioChunk>,
    mut video: mpsc::Receiver<VideoComposite>,
) -> (&'static str, usize, i16, usize) {
    let mut chunks = 0;
    let mut peak = 0i16;
    let mut composites = 0;
    loop {
        tokio::select! {
            chunk = audio.recv() => match chunk {
                Some(chunk) => {
                    chunks += 1;
                    peak = chunk.samples.iter().fold(peak, |p, s| p.max(s.saturating_abs()));
                }
                None => break,
            },
            composite = video.recv() => match composite {
                Some(_) => composites += 1,
                None => break,
            },
        }
    }
    (name, chunks, peak, composites)
}
