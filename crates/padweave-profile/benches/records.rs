use codspeed_criterion_compat::{black_box, criterion_group, criterion_main, Criterion};
use padweave_device::InputDeviceManager;
use padweave_profile::{load_into, parse_settings, BindingRecord};

fn settings_yaml(devices: usize, bindings: usize) -> String {
    let mut yaml = String::from("version: 1\ndevices:\n");
    for device in 0..devices {
        yaml.push_str(&format!(
            "  - display_name: Pad {device}\n    instance_id: pad-{device}\n    api: direct_input\n    kind: other\n    bindings:\n"
        ));
        for binding in 0..bindings {
            let command = 0x10 + binding % 24;
            yaml.push_str(&format!(
                "      - \"0x{:08X}, {}, {command}, 65536, 0, 0, 0\"\n",
                0x0001_0000 + binding,
                binding % 2
            ));
        }
    }
    yaml
}

fn bench_records(c: &mut Criterion) {
    c.bench_function("parse_binding_record", |b| {
        b.iter(|| {
            black_box("0x80040001, 1, 0x20, -65536, 1, 2, 4096")
                .parse::<BindingRecord>()
                .unwrap()
        });
    });

    let yaml = settings_yaml(4, 64);
    c.bench_function("load_settings", |b| {
        b.iter(|| {
            let settings = parse_settings(black_box(&yaml)).unwrap();
            let mut manager = InputDeviceManager::new();
            load_into(&settings, &mut manager)
        });
    });
}

criterion_group!(benches, bench_records);
criterion_main!(benches);
