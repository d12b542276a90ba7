#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cast_precision_loss)]

//! Basic encoding example: open a session, pump PCM chunks through it, and
//! write the resulting MP3 stream to a file.
//!
//! This example shows how to:
//! - Open an [`Mp3Session`] with a [`SessionConfig`]
//! - Feed fixed-size chunks through `encode` and handle the
//!   [`EncodeOutput::Buffered`] case
//! - Close the session and append the flushed tail

use std::fs::File;
use std::io::Write;

use audiobridge_encoder::{EncodeOutput, Mp3Session, SessionConfig, downmix};

const SAMPLE_RATE: u32 = 44_100;
const CHUNK_SAMPLES: usize = 4608;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Two seconds of a 440 Hz tone at half amplitude.
    let samples: Vec<i16> = (0..SAMPLE_RATE as usize * 2)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            downmix::f32_to_i16((t * 440.0 * std::f32::consts::TAU).sin() * 0.5)
        })
        .collect();

    let mut session = Mp3Session::new();
    session.open(SessionConfig {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bit_rate: 128,
        quality: 2,
    })?;

    let mut output = File::create("basic_encoding.mp3")?;
    let mut written = 0_usize;
    let mut buffered_calls = 0_usize;

    for chunk in samples.chunks(CHUNK_SAMPLES) {
        match session.encode(chunk, 0, chunk.len())? {
            EncodeOutput::Bytes(bytes) => {
                output.write_all(&bytes)?;
                written += bytes.len();
            }
            EncodeOutput::Buffered => buffered_calls += 1,
        }
    }

    let tail = session.close()?;
    output.write_all(&tail)?;

    println!("Input samples: {}", samples.len());
    println!("Encoded bytes: {written}");
    println!("Buffered calls: {buffered_calls}");
    println!("Flushed tail bytes: {}", tail.len());
    println!("Wrote basic_encoding.mp3");

    Ok(())
}
