use std::env;
use std::fmt::Write;
use std::path::PathBuf;

#[path = "build/value.rs"]
mod value;

/// A tunable constant, overridable with `DECTNR_<NAME>=<value>`.
struct Setting {
    name: &'static str,
    ty: &'static str,
    default: &'static str,
    /// Smallest accepted value.
    min: u64,
}

const SETTINGS: &[Setting] = &[
    Setting { name: "CAPTURE_POOL_SIZE", ty: "usize", default: "10", min: 1 },
    Setting { name: "CAPTURE_BUFFER_LEN", ty: "usize", default: "137", min: 1 },
    Setting { name: "PROGRESS_INTERVAL", ty: "u32", default: "10", min: 0 },
    // The counter is written big endian into the first 4 bytes
    Setting { name: "TX_PAYLOAD_LEN", ty: "usize", default: "37", min: 4 },
    Setting { name: "TX_INTERVAL_MS", ty: "u32", default: "330", min: 0 },
    Setting { name: "TX_MAX_COUNTER", ty: "u32", default: "0x7fff_ffff", min: 1 },
];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=build/value.rs");

    let mut data = String::new();
    writeln!(data, "// Generated by build.rs, override with DECTNR_* variables.").unwrap();

    for setting in SETTINGS {
        let var = format!("DECTNR_{}", setting.name);
        println!("cargo:rerun-if-env-changed={var}");

        let raw = env::var(&var).unwrap_or_else(|_| setting.default.to_string());
        let pointer_width = env::var("CARGO_CFG_TARGET_POINTER_WIDTH").ok();
        let Some(max) = value::max_of(setting.ty, pointer_width.as_deref()) else {
            panic!("Unsupported configuration type {}", setting.ty);
        };
        let parsed = match value::parse(&raw) {
            Some(v) if (setting.min..=max).contains(&v) => v,
            _ => panic!("{var}={raw} is not a number in {}..={max}", setting.min),
        };

        writeln!(data, "pub const {}: {} = {};", setting.name, setting.ty, parsed).unwrap();
    }

    for (var, _) in env::vars() {
        if let Some(name) = var.strip_prefix("DECTNR_") {
            if !SETTINGS.iter().any(|s| s.name == name) {
                panic!("Unknown configuration {var}");
            }
        }
    }

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").unwrap());
    std::fs::write(out_dir.join("config.rs"), data).unwrap();
}
