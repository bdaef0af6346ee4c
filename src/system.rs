//! Host introspection.
//!
//! The agent reports two strings it does not interpret: the local machine
//! name (the default device identifier) and the GPU model. Both come from
//! shell utilities so the agent carries no platform-specific probing code.

use std::process::Command;

/// Device identifier used when the machine name cannot be determined.
const FALLBACK_DEVICE_ID: &str = "gridlink-device";

/// The local machine name, per the `hostname` utility.
pub fn machine_name() -> String {
    match Command::new("hostname").output() {
        Ok(output) if output.status.success() => {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if name.is_empty() {
                FALLBACK_DEVICE_ID.to_string()
            } else {
                name
            }
        }
        _ => FALLBACK_DEVICE_ID.to_string(),
    }
}

/// The first GPU name reported by `nvidia-smi`, if the utility is present.
pub fn detect_gpu_model() -> Option<String> {
    let output = Command::new("nvidia-smi")
        .args(["--query-gpu=name", "--format=csv,noheader"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let name = stdout.lines().next()?.trim().to_string();
    if name.is_empty() { None } else { Some(name) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_name_is_never_empty() {
        assert!(!machine_name().is_empty());
    }
}
