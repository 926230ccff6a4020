use std::{env, path::Path};

const LINKER_SCRIPT: &str = "elfboot.ld";

fn main() {
    println!("cargo::rerun-if-changed=build.rs");
    println!("cargo::rerun-if-changed={LINKER_SCRIPT}");

    // host builds (clippy, doc) link without the firmware memory map.
    if env::var("CARGO_CFG_TARGET_ARCH").as_deref() != Ok("riscv32") {
        return;
    }
    let script = Path::new(env!("CARGO_MANIFEST_DIR")).join(LINKER_SCRIPT);
    println!("cargo::rustc-link-arg=-T{}", script.display());
    println!("cargo::rustc-link-arg=--gc-sections");
}
