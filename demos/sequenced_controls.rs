//! Example: messengers driving controls, audio handed to another thread
//!
//! A Euclidean rhythm retriggers an envelope, a stepper walks a pitch
//! pattern, and an LFO sweeps the level. Ticks are rendered on one thread
//! and pulled from an rtrb ring buffer on another, the way an audio callback
//! would.
//!
//! Run with: cargo run --example sequenced_controls

use std::f32::consts::TAU;
use std::thread;
use std::time::Duration;

use rtrb::RingBuffer;
use schall::messengers::{Euclid, Lfo, Stepper};
use schall::nodes::{Gain, RtrbSink};
use schall::value::{Chain, Repeat, Sequence};
use schall::{AudioNode, Buffer, Config, Control, ControlValue, Environment, Message, Patch, ProcessContext};

/// Sine oscillator, frequency on control index 0
struct Osc {
    frequency: f32,
    phase: f32,
}

impl AudioNode for Osc {
    fn process(&mut self, ctx: &ProcessContext, _inputs: &[Buffer], outputs: &mut [Buffer]) -> bool {
        let step = self.frequency / ctx.sample_rate as f32;
        for out in outputs[0].iter_mut() {
            *out = (self.phase * TAU).sin();
            self.phase = (self.phase + step).fract();
        }
        true
    }

    fn num_controls(&self) -> usize {
        1
    }

    fn receive_control_value(&mut self, value: &ControlValue, _index: usize) {
        self.frequency = value.as_f64() as f32;
    }
}

/// Exponential decay restarted by any message; idle once it has died away
struct Decay {
    level: f32,
    factor: f32,
}

impl AudioNode for Decay {
    fn process(&mut self, _ctx: &ProcessContext, inputs: &[Buffer], outputs: &mut [Buffer]) -> bool {
        if self.level < 1e-4 {
            return false;
        }
        for (out, &x) in outputs[0].iter_mut().zip(inputs[0].iter()) {
            *out = x * self.level;
            self.level *= self.factor;
        }
        true
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn receive_message(&mut self, _message: &Message) -> Vec<Message> {
        self.level = 1.0;
        Vec::new()
    }
}

fn main() -> schall::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = Config::new(48_000.0, 128);
    let mut voice = Patch::new(config, 0, 1);
    let osc = voice.add("osc", Osc { frequency: 220.0, phase: 0.0 })?;
    let env_node = voice.add("env", Decay { level: 0.0, factor: 0.9997 })?;
    voice.connect(osc, 0, env_node, 0)?;
    voice.connect(env_node, 0, voice.output(), 0)?;
    voice.add_control(Control::float("pitch", 220.0, 20.0, 2_000.0))?;
    voice.bind_control("pitch", "osc", 0)?;

    let mut root = Patch::new(config, 0, 1);
    let voice = root.add("voice", voice)?;
    let level = root.add("level", Gain::new(0.5))?;
    root.connect(voice, 0, level, 0)?;
    root.connect(level, 0, root.output(), 0)?;

    let mut env = Environment::new(root);
    env.register("trigger", "voice.env")?;
    env.register("pitch", "voice.pitch")?;

    let sixteenth = (config.sample_rate / 8.0) as u64;
    env.add_messenger(Euclid::new("trigger", 5, 8, sixteenth));
    env.add_messenger(Stepper::new(
        "pitch",
        Chain::new()
            .then(Repeat::new(Sequence::floats([220.0, 330.0, 275.0]), 2))
            .then(Sequence::floats([440.0, 392.0]).looping()),
        sixteenth,
    ));
    env.add_messenger(Lfo::new("level", 0.25).with_range(0.4, 0.1));

    let (producer, mut consumer) = RingBuffer::new(config.buffer_size * 8);
    let renderer = thread::spawn(move || {
        let mut sink = RtrbSink::mono(producer);
        let ticks = (2.0 * config.sample_rate / config.buffer_size as f64) as usize;
        let mut rendered = 0;
        while rendered < ticks {
            // wait for the consumer instead of overrunning it
            if sink.available() < config.buffer_size {
                thread::sleep(Duration::from_micros(200));
                continue;
            }
            env.render(&mut sink, 1)?;
            rendered += 1;
        }
        Ok::<_, schall::Error>(())
    });

    let mut received = 0usize;
    let mut peak = 0.0f32;
    while !renderer.is_finished() || !consumer.is_empty() {
        match consumer.pop() {
            Ok(sample) => {
                received += 1;
                peak = peak.max(sample.abs());
            }
            Err(_) => thread::sleep(Duration::from_micros(100)),
        }
    }
    renderer.join().expect("render thread panicked")?;

    println!("received {received} samples, peak {peak:.3}");
    Ok(())
}
