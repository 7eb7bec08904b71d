//! # Live Sonar
//!
//! Speaker + microphone pulse-Doppler sonar. Loops the chirp on the default
//! output, processes the default input and writes the range-Doppler map to a
//! PNG every few frames.
//!
//! Commands (type and press enter):
//!   s=start  x=stop  c=cycle clutter filter  o=toggle offset compensation
//!   +/-=pulses  r=readout  q=quit
//!
//! ```bash
//! cargo run --example live_sonar -- --png map.png
//! ```

use clap::Parser;
use pingscope::prelude::*;
use pingscope::{CpalBackend, ModuleSource};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(about = "Interactive pulse-Doppler sonar on the sound card")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Range-Doppler snapshot path
    #[arg(long, default_value = "range_doppler.png")]
    png: PathBuf,

    /// Write every n-th frame
    #[arg(long, default_value_t = 5)]
    png_interval: u64,

    /// Processing module file; the built-in unit when omitted
    #[arg(long)]
    module: Option<PathBuf>,

    /// Play the pulse on both output channels
    #[arg(long)]
    mirror: bool,

    /// List audio devices and exit
    #[arg(long)]
    list_devices: bool,
}

fn main() -> pingscope::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    if args.list_devices {
        println!("Outputs:");
        for device in CpalBackend::list_output_devices()? {
            println!("  {device}");
        }
        println!("Inputs:");
        for device in CpalBackend::list_input_devices()? {
            println!("  {device}");
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => PingscopeConfig::load(path)?,
        None => PingscopeConfig::default(),
    };
    config.render.png_path = Some(args.png.clone());
    config.render.png_interval = args.png_interval;
    config.audio.mirror_second_channel |= args.mirror;
    if let Some(module) = args.module {
        config.module = ModuleSource::File(module);
    }

    let mut sonar = ControlSurface::builder().config(config).build()?;
    print_readout(&sonar);

    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines().map_while(Result::ok) {
            if tx.send(line.trim().to_string()).is_err() {
                break;
            }
        }
    });

    println!("s=start  x=stop  c=clutter  o=offset  +/-=pulses  r=readout  q=quit");
    loop {
        match rx.recv_timeout(Duration::from_millis(20)) {
            Ok(cmd) => match cmd.as_str() {
                "s" => match sonar.start() {
                    Ok(d) => println!("running: {}x{} map", d.fast_bins, d.slow_pulse_count),
                    Err(e) => println!("start failed: {e}"),
                },
                "x" => {
                    if let Err(e) = sonar.stop() {
                        println!("stop failed: {e}");
                    }
                }
                "c" => {
                    let mode = sonar.settings().clutter_filter;
                    let next = ClutterFilterMode::from_code((mode.code() + 1) % 4).unwrap_or_default();
                    let settings = sonar.settings().with_clutter_filter(next);
                    apply(&mut sonar, settings);
                }
                "o" => {
                    let on = !sonar.settings().offset_compensation;
                    let settings = sonar.settings().with_offset_compensation(on);
                    apply(&mut sonar, settings);
                }
                "+" | "-" => {
                    let count = sonar.settings().slow_pulse_count;
                    let count = if cmd == "+" { count + 2 } else { count.saturating_sub(2) };
                    let settings = sonar.settings().with_slow_pulse_count(count);
                    apply(&mut sonar, settings);
                }
                "r" => print_readout(&sonar),
                "q" => break,
                _ => {}
            },
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        if sonar.pump() > 0 {
            print!(
                "\rpeak {:>5.2}  frames {:>6}  dropped {:>4}  max {:>9.3e}",
                sonar.peak_level(),
                sonar.frames_drawn(),
                sonar.dropped_messages(),
                sonar.last_frame_max(),
            );
            let _ = std::io::Write::flush(&mut std::io::stdout());
        }
    }

    sonar.close();
    Ok(())
}

fn apply(sonar: &mut ControlSurface, settings: SonarSettings) {
    match sonar.apply_settings(settings).map(|_| ()) {
        Ok(_) if sonar.is_reconfigure_pending() => println!("\napplied at next stop/start"),
        Ok(_) => print_readout(sonar),
        Err(e) => println!("\nrejected: {e}"),
    }
}

fn print_readout(sonar: &ControlSurface) {
    println!();
    println!("{}", sonar.settings().clutter_filter.label());
    for row in sonar.readout() {
        println!("  {row}");
    }
}
