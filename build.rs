use std::env;

fn main() {
    // Read the hardware capability set from environment variables (optional)
    // These pick the shape of the parameter table built at startup

    // Motor count (2-6)
    if let Ok(motors) = env::var("GANTRY_MOTORS") {
        println!("cargo:rustc-env=GANTRY_MOTORS={}", motors);
        println!("cargo:warning=Using GANTRY_MOTORS from environment: {}", motors);
    } else {
        println!("cargo:rustc-env=GANTRY_MOTORS=4");
    }

    // Digital input channels (8-9)
    if let Ok(inputs) = env::var("GANTRY_INPUTS") {
        println!("cargo:rustc-env=GANTRY_INPUTS={}", inputs);
        println!("cargo:warning=Using GANTRY_INPUTS from environment: {}", inputs);
    } else {
        println!("cargo:rustc-env=GANTRY_INPUTS=8");
    }

    // User data words (default: false)
    if let Ok(user_data) = env::var("GANTRY_USER_DATA") {
        println!("cargo:rustc-env=GANTRY_USER_DATA={}", user_data);
        println!(
            "cargo:warning=Using GANTRY_USER_DATA from environment: {}",
            user_data
        );
    } else {
        println!("cargo:rustc-env=GANTRY_USER_DATA=false");
    }

    // Diagnostic read-outs (default: false)
    if let Ok(diagnostics) = env::var("GANTRY_DIAGNOSTICS") {
        println!("cargo:rustc-env=GANTRY_DIAGNOSTICS={}", diagnostics);
        println!(
            "cargo:warning=Using GANTRY_DIAGNOSTICS from environment: {}",
            diagnostics
        );
    } else {
        println!("cargo:rustc-env=GANTRY_DIAGNOSTICS=false");
    }

    // Platform family: arm or avr
    if let Ok(platform) = env::var("GANTRY_PLATFORM") {
        println!("cargo:rustc-env=GANTRY_PLATFORM={}", platform);
        println!(
            "cargo:warning=Using GANTRY_PLATFORM from environment: {}",
            platform
        );
    } else {
        println!("cargo:rustc-env=GANTRY_PLATFORM=arm");
    }

    // Rerun if environment variables change
    println!("cargo:rerun-if-env-changed=GANTRY_MOTORS");
    println!("cargo:rerun-if-env-changed=GANTRY_INPUTS");
    println!("cargo:rerun-if-env-changed=GANTRY_USER_DATA");
    println!("cargo:rerun-if-env-changed=GANTRY_DIAGNOSTICS");
    println!("cargo:rerun-if-env-changed=GANTRY_PLATFORM");
}
