// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! This build script writes a `memory.x` matching the SoftDevice layout from
//! `consts` into a directory where the linker can always find it, and asks
//! Cargo to re-run whenever the layout could have changed.

use consts::{BASE_APP_ADDR, FLASH_SIZE, RAM_SIZE, SOFTDEVICE_RAM_RESERVED};
use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

fn main() {
    // Put `memory.x` in our output directory and ensure it's
    // on the linker search path.
    let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());

    let memory_x_content = format!(
        r##"
        MEMORY
        {{
            /* NOTE 1 K = 1 KiBi = 1024 bytes */
            FLASH (rx) : ORIGIN = {:#X}, LENGTH = {:#X}
            RAM : ORIGIN = 0x20000000 + {:#X}, LENGTH = {:#X}
        }}
        "##,
        BASE_APP_ADDR,
        FLASH_SIZE - BASE_APP_ADDR,
        SOFTDEVICE_RAM_RESERVED,
        RAM_SIZE - SOFTDEVICE_RAM_RESERVED
    );
    File::create(out.join("memory.x"))
        .unwrap()
        .write_all(memory_x_content.as_bytes())
        .unwrap();

    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../consts/src/lib.rs");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}
