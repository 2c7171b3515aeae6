/// Forms the hyphenated artifact name used when publishing prebuilt binaries,
/// e.g. `rjn-forwarder-0.1.0-linux-x86_64`.
pub fn artifact_name() -> String {
    form_artifact_name(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
    )
}

fn form_artifact_name(name: &str, version: &str, os: &str, arch: &str) -> String {
    format!("{name}-{version}-{os}-{arch}")
}
