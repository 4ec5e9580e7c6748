//! Environment readiness check.

use crate::renderer::chromium::find_chromium;
use anyhow::Result;
use std::process::Command;

/// Check browser availability, output directory, and available memory.
pub async fn run() -> Result<()> {
    println!("Surfacer Doctor");
    println!("===============");
    println!();

    // OS and architecture
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    // Check the browser
    let chromium_path = find_chromium();
    match &chromium_path {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => {
            println!("[!!] Chromium NOT found. Install Chrome or set SURFACER_CHROMIUM_PATH.")
        }
    }

    // Check that the working directory can hold report output
    match std::env::current_dir() {
        Ok(cwd) => {
            let writable = std::fs::metadata(&cwd)
                .map(|m| !m.permissions().readonly())
                .unwrap_or(false);
            if writable {
                println!("[OK] Working directory is writable: {}", cwd.display());
            } else {
                println!("[!!] Working directory is not writable: {}", cwd.display());
            }
        }
        Err(e) => println!("[!!] Could not resolve working directory: {e}"),
    }

    // Check available memory
    let mem_mb = get_available_memory_mb();
    match mem_mb {
        Some(mb) => {
            if mb >= 512 {
                println!("[OK] Available memory: {mb}MB (>= 512MB required)");
            } else {
                println!("[!!] Available memory: {mb}MB (< 512MB, the browser may struggle)");
            }
        }
        None => println!("[??] Could not determine available memory"),
    }

    println!();
    let ready = chromium_path.is_some();
    if ready {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
        println!("  Install Chrome or Chromium, or point SURFACER_CHROMIUM_PATH at a binary.");
    }

    Ok(())
}

/// Get available memory in MB (platform-specific).
fn get_available_memory_mb() -> Option<u64> {
    #[cfg(target_os = "macos")]
    {
        let output = Command::new("sysctl")
            .args(["-n", "hw.memsize"])
            .output()
            .ok()?;
        let s = String::from_utf8_lossy(&output.stdout);
        let bytes: u64 = s.trim().parse().ok()?;
        Some(bytes / 1_048_576)
    }
    #[cfg(target_os = "linux")]
    {
        let output = Command::new("free").args(["-m"]).output().ok()?;
        let s = String::from_utf8_lossy(&output.stdout);
        for line in s.lines() {
            if line.starts_with("Mem:") {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 7 {
                    return parts[6].parse().ok();
                }
            }
        }
        None
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        None
    }
}
