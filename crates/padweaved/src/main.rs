mod cli;

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{tick, unbounded};

use padweave_device::{
    hotplug_channel, ControlEvent, ControlKind, ControlUid, Device, HotplugEvent,
    InputDeviceManager, VirtualDeviceBuilder, VirtualHandle, FULLY_DOWN,
};
use padweave_profile::{load_into, snapshot, to_yaml, PadCommand, Settings, SettingsStore, SlotSettings};
use padweaved::app::wire::Reply;
use padweaved::{logging, print_debug, print_error, print_info, print_warning, InputSession, SessionError};

use crate::cli::{Cli, Command};

/// Virtual pad used by the demo: face buttons 0 to 3, a stick on 4 and 5.
const DEMO_INSTANCE: &str = "demo-pad-0";
const DEMO_STICK_X: u16 = 4;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if logging::setup(cli.verbose, cli.no_color).is_err() {
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Command::Check { settings } => check(settings.as_deref()),
        Command::Normalize { settings, dry_run } => normalize(settings.as_deref(), dry_run),
        Command::Demo { frames, interval } => demo(frames, Duration::from_millis(interval)),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            print_error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn check(dir: Option<&Path>) -> Result<ExitCode, SessionError> {
    let store = SettingsStore::new(dir)?;
    let settings = store.load()?;
    let mut manager = InputDeviceManager::new();
    let report = load_into(&settings, &mut manager);

    for device in manager.devices() {
        let bindings: usize = (0..padweave_device::PORTS)
            .flat_map(|port| (0..padweave_device::SLOTS).map(move |slot| (port, slot)))
            .filter_map(|(port, slot)| device.pad(port, slot))
            .map(|pad| pad.len())
            .sum();
        print_info!("{} ({:?}): {bindings} bindings", device.display_name(), device.api());
    }
    for rejected in &report.rejected {
        print_warning!("{}: {:?} dropped: {}", rejected.device, rejected.record, rejected.error);
    }
    print_info!(
        "{}: {} devices, {} bindings, {} force bindings, {} rejected",
        store.settings_path().display(),
        report.devices,
        report.bindings,
        report.ff_bindings,
        report.rejected.len()
    );
    Ok(if report.is_clean() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn normalize(dir: Option<&Path>, dry_run: bool) -> Result<ExitCode, SessionError> {
    let store = SettingsStore::new(dir)?;
    let settings = store.load()?;
    let mut manager = InputDeviceManager::new();
    let report = load_into(&settings, &mut manager);
    let normalized = snapshot(&manager, &settings.general, &settings.pads);

    if dry_run {
        print_info!("{}", to_yaml(&normalized)?);
    } else {
        store.save(&normalized)?;
        print_info!(
            "Saved {} ({} records dropped)",
            store.settings_path().display(),
            report.rejected.len()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn demo_pad() -> (Device, VirtualHandle) {
    VirtualDeviceBuilder::new("Demo pad", DEMO_INSTANCE)
        .button(0, Some("Cross"))
        .button(1, Some("Circle"))
        .button(2, Some("Lock"))
        .button(3, Some("Analog"))
        .axis(DEMO_STICK_X, Some("X"))
        .axis(DEMO_STICK_X + 1, Some("Y"))
        .build()
}

/// Binds the demo pad: button 0 is captured the way a binding dialog
/// would, the rest is bound directly.
fn bind_demo_pad(session: &mut InputSession, handle: &VirtualHandle) -> Result<(), SessionError> {
    session.capture_control()?;
    handle.press(0);
    let Some(control) = session.capture_control()? else {
        print_warning!("Capture saw no input");
        return Ok(());
    };
    handle.release(0);
    session.capture_control()?;
    session.bind_control(&control, 0, 0, PadCommand::Cross)?;

    let button = |id| ControlUid::button(ControlKind::PushButton, id);
    let half = |positive| ControlUid::axis_half(ControlKind::AbsAxis, DEMO_STICK_X, positive);
    session.bind(0, button(1), 0, 0, PadCommand::Circle)?;
    session.bind(0, button(2), 0, 0, PadCommand::LockDirection)?;
    session.bind(0, button(3), 0, 0, PadCommand::AnalogToggle)?;
    session.bind(0, half(true), 0, 0, PadCommand::LeftStickRight)?;
    session.bind(0, half(false), 0, 0, PadCommand::LeftStickLeft)?;
    session.refresh_enablement()
}

/// Scripted input for one demo frame.
fn demo_input(frame: u32) -> Option<ControlEvent> {
    let set = |id, value| Some(ControlEvent::Set { id, value });
    match frame {
        5 => set(0, FULLY_DOWN),
        15 => set(0, 0),
        20 => set(3, FULLY_DOWN),
        21 => set(3, 0),
        25 => set(DEMO_STICK_X, FULLY_DOWN * 3 / 4),
        30 | 45 => set(2, FULLY_DOWN),
        31 | 46 => set(2, 0),
        35 | 70 => set(DEMO_STICK_X, 0),
        60 => set(DEMO_STICK_X, -FULLY_DOWN),
        90 => set(1, FULLY_DOWN),
        100 => set(1, 0),
        _ => None,
    }
}

fn format_reply(reply: &Reply) -> String {
    reply.iter().map(|byte| format!("{byte:02X}")).collect::<Vec<_>>().join(" ")
}

fn demo(frames: u32, interval: Duration) -> Result<ExitCode, SessionError> {
    let (hotplug, hotplug_rx) = hotplug_channel();
    let (handles_tx, handles_rx) = unbounded();
    let enumerate = move || {
        let (device, handle) = demo_pad();
        // The demo loop owns the receiver until it returns.
        let _ = handles_tx.send(handle);
        vec![device]
    };

    let mut settings = Settings::default();
    settings.pads[0].slots.push(SlotSettings::default());
    let (mut session, _) = InputSession::new(&settings, hotplug_rx, enumerate)?;
    let Ok(mut handle) = handles_rx.try_recv() else {
        print_error!("Demo pad did not enumerate");
        return Ok(ExitCode::FAILURE);
    };
    bind_demo_pad(&mut session, &handle)?;
    print_info!("Demo pad bound, running {frames} frames");

    let ticker = tick(interval);
    let mut last = Reply::new();
    for frame in 0..frames {
        if ticker.recv().is_err() {
            break;
        }
        if frame == 80 {
            print_info!("Simulating a replug");
            hotplug.notify(HotplugEvent::DeviceListChanged);
        }
        if let Some(event) = demo_input(frame) {
            handle.send(event);
        }
        session.poll_frame()?;
        if let Ok(replugged) = handles_rx.try_recv() {
            handle = replugged;
        }
        let Some(reply) = session.read_data(0, 0) else {
            continue;
        };
        if reply != last {
            print_info!("frame {frame:>4}: {}", format_reply(&reply));
            last = reply;
        } else {
            print_debug!("frame {frame:>4}: unchanged");
        }
    }

    let saved = session.snapshot()?;
    print_info!("{}", to_yaml(&saved)?);
    Ok(ExitCode::SUCCESS)
}
