//! Example: a self-modulating oscillator inside a nested patch
//!
//! Defines a small phase-modulated sine node, wraps it in a patch whose
//! output is fed back into its own input, and renders a second of audio
//! offline. The engine resolves the loop one buffer late, every tick.
//!
//! Run with: cargo run --example feedback_patch

use std::f32::consts::TAU;

use schall::nodes::{BufferSink, Gain, Mixer};
use schall::{AudioNode, Buffer, Config, Control, ControlValue, Environment, Message, Patch, ProcessContext};

/// Sine oscillator whose phase is offset by its input
struct PmSine {
    frequency: f32,
    phase: f32,
}

impl AudioNode for PmSine {
    fn process(&mut self, ctx: &ProcessContext, inputs: &[Buffer], outputs: &mut [Buffer]) -> bool {
        let step = self.frequency / ctx.sample_rate as f32;
        for (out, &modulation) in outputs[0].iter_mut().zip(inputs[0].iter()) {
            *out = (self.phase * TAU + modulation).sin();
            self.phase = (self.phase + step).fract();
        }
        true
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn num_controls(&self) -> usize {
        1
    }

    fn receive_control_value(&mut self, value: &ControlValue, _index: usize) {
        self.frequency = value.as_f64() as f32;
    }
}

fn operator(config: Config) -> schall::Result<Patch> {
    let mut op = Patch::new(config, 1, 1);
    let sine = op.add("sine", PmSine { frequency: 220.0, phase: 0.0 })?;
    let feedback = op.add("feedback", Gain::new(0.8))?;
    let mix = op.add("mix", Mixer::new(2))?;

    op.connect(op.input(), 0, mix, 0)?;
    op.connect(feedback, 0, mix, 1)?;
    op.connect(mix, 0, sine, 0)?;
    // the operator modulates itself
    op.connect(sine, 0, feedback, 0)?;
    op.connect(sine, 0, op.output(), 0)?;

    op.add_control(Control::float("freq", 220.0, 20.0, 2_000.0))?;
    op.bind_control("freq", "sine", 0)?;
    Ok(op)
}

fn main() -> schall::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = Config::new(48_000.0, 64);
    let mut root = Patch::new(config, 0, 1);
    let carrier = root.add("carrier", operator(config)?)?;
    let modulator = root.add("modulator", operator(config)?)?;
    let level = root.add("level", Gain::new(0.5))?;

    root.connect_weighted(modulator, 0, carrier, 0, 2.0)?;
    root.connect(carrier, 0, level, 0)?;
    root.connect(level, 0, root.output(), 0)?;
    root.set_control("modulator.freq", 440.0)?;

    let mut env = Environment::new(root);
    env.send(Message::float("level", 0.25));

    let ticks = (config.sample_rate / config.buffer_size as f64) as usize;
    let mut sink = BufferSink::new();
    env.render(&mut sink, ticks)?;

    let samples = sink.channel(0);
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    let rms = (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt();
    println!("rendered {} samples, peak {peak:.3}, rms {rms:.3}", samples.len());
    Ok(())
}
