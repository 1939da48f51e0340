use codspeed_criterion_compat::{black_box, criterion_group, criterion_main, Criterion};
use padweave_device::{
    ActivationContext, BindPolicy, ControlEvent, ControlKind, ControlUid, InputDeviceManager,
    VirtualDeviceBuilder, BASE_SENSITIVITY, FULLY_DOWN,
};
use padweave_profile::{PadCommand, Settings, SlotSettings};
use padweaved::app::{ButtonSum, PadSystem};

const BUTTONS: u16 = 16;
const STICK_X: u16 = 32;

const FACES: [PadCommand; 8] = [
    PadCommand::Cross,
    PadCommand::Circle,
    PadCommand::Square,
    PadCommand::Triangle,
    PadCommand::L1,
    PadCommand::R1,
    PadCommand::L2,
    PadCommand::R2,
];

pub fn bench_update(c: &mut Criterion) {
    let mut builder = VirtualDeviceBuilder::new("bench", "bench-0");
    for id in 0..BUTTONS {
        builder = builder.button(id, None);
    }
    let (mut device, handle) = builder.axis(STICK_X, None).axis(STICK_X + 1, None).build();
    for id in 0..BUTTONS {
        let uid = ControlUid::button(ControlKind::PushButton, id);
        let command = FACES[usize::from(id) % FACES.len()];
        device.bind_command(uid, 0, 0, command.id(), BASE_SENSITIVITY, 0, 0, BindPolicy::Multiple);
    }
    for (positive, command) in [(true, PadCommand::LeftStickRight), (false, PadCommand::LeftStickLeft)] {
        let uid = ControlUid::axis_half(ControlKind::AbsAxis, STICK_X, positive);
        device.bind_command(uid, 0, 0, command.id(), BASE_SENSITIVITY, 0, 0, BindPolicy::Multiple);
    }

    let mut manager = InputDeviceManager::new();
    manager.add_device(device);
    manager.enable_device(0);
    let mut settings = Settings::default();
    settings.pads[0].slots.push(SlotSettings::default());
    let mut system = PadSystem::new(&settings);
    let ctx = ActivationContext::default();

    c.bench_function("pad_update", |b| {
        let mut frame = 0i32;
        b.iter(|| {
            frame = frame.wrapping_add(1);
            let id = u16::try_from(frame.rem_euclid(i32::from(BUTTONS))).unwrap_or(0);
            handle.send(ControlEvent::Set { id, value: FULLY_DOWN * (frame & 1) });
            handle.send(ControlEvent::Set {
                id: STICK_X,
                value: (frame % 128 - 64) * FULLY_DOWN / 64,
            });
            black_box(system.update(&mut manager, &ctx));
        });
    });
}

pub fn bench_cap(c: &mut Criterion) {
    let mut sum = ButtonSum::default();
    c.bench_function("sum_cap", |b| {
        b.iter(|| {
            let mut s = black_box(sum);
            for (i, stick) in s.sticks.iter_mut().enumerate() {
                stick.horiz = 400 - 300 * i32::try_from(i).unwrap_or(0);
                stick.vert = -700;
            }
            s.buttons.iter_mut().for_each(|value| *value = 900);
            s.cap();
            sum = s;
        });
    });
}

criterion_group!(benches, bench_update, bench_cap);
criterion_main!(benches);
